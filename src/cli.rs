use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{ProvisionError, Result};

const AFTER_HELP: &str = "\
Examples:
  sudo bootstrap                        Install prerequisites and grant sudo, then stop
  sudo bootstrap -e vars/me.yml         Full run: packages, sudo grant, playbook, revoke
  sudo bootstrap -s -e vars/me.yml      Skip package installation
  sudo bootstrap --cleanup              Remove the temporary sudo grant

Environment:
  BOOTSTRAP_DIR, BOOTSTRAP_PLAYBOOK, BOOTSTRAP_INVENTORY, BOOTSTRAP_OS_RELEASE,
  BOOTSTRAP_GRANT_PATH, BOOTSTRAP_SKIP_ROOT_CHECK=1, RUST_LOG";

/// Workstation bootstrap - prepare a Linux host for an Ansible-driven setup
#[derive(Parser, Debug)]
#[command(name = "bootstrap")]
#[command(about = "Install Ansible prerequisites, grant temporary sudo and run the workstation playbook")]
#[command(version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Extra-vars file passed to the playbook; without it the run stops after the sudo grant
    #[arg(short, long, value_name = "FILE")]
    pub extra_vars: Option<PathBuf>,

    /// Only remove the temporary sudo grant and exit
    #[arg(short, long)]
    pub cleanup: bool,

    /// Skip installing prerequisite packages
    #[arg(short, long)]
    pub skip_packages: bool,

    /// Do not create the temporary sudo grant
    #[arg(short = 'n', long = "no-sudoers")]
    pub no_sudoers: bool,

    /// User to provision for (default: $SUDO_USER)
    #[arg(short, long, value_name = "NAME")]
    pub user: Option<String>,

    /// Dry-run mode: print commands and file changes without making them.
    ///
    /// Does not require root.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the detected distribution and family as JSON and exit
    #[arg(long)]
    pub detect: bool,
}

/// Everything the dispatcher needs from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub extra_vars: Option<PathBuf>,
    pub skip_packages: bool,
    pub skip_sudoers: bool,
    pub cleanup_only: bool,
    pub user: Option<String>,
    pub dry_run: bool,
    pub detect_only: bool,
}

impl From<Cli> for ProvisioningRequest {
    fn from(cli: Cli) -> Self {
        Self {
            extra_vars: cli.extra_vars,
            skip_packages: cli.skip_packages,
            skip_sudoers: cli.no_sudoers,
            cleanup_only: cli.cleanup,
            user: cli.user,
            dry_run: cli.dry_run,
            detect_only: cli.detect,
        }
    }
}

/// Result of parsing the command line.
#[derive(Debug)]
pub enum Parsed {
    /// Proceed with this request
    Run(ProvisioningRequest),
    /// `--help` or `--version`: print and exit 0
    Display(clap::Error),
}

impl Cli {
    /// Parse arguments, mapping every usage error to `UnknownOption`.
    pub fn parse_request<I, T>(args: I) -> Result<Parsed>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => Ok(Parsed::Run(cli.into())),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Ok(Parsed::Display(e))
            }
            Err(e) => Err(ProvisionError::UnknownOption(summarize(&e))),
        }
    }
}

fn summarize(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string()
}
