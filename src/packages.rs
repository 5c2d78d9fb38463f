//! Prerequisite package installation.
//!
//! Each [`OsFamily`] maps to a fixed [`InstallPlan`]: a repository refresh
//! followed by one install of the family's package names. Package names differ
//! per distribution but the installed capabilities are the same everywhere:
//! Ansible and ansible-lint, git, Python with pip, curl and wget, jq, tree,
//! sshpass, coreutils and the CA trust store.

use crate::classifier::OsFamily;
use crate::console;
use crate::error::{ProvisionError, Result};
use crate::exec::{CommandRunner, CommandSpec};

const DEBIAN_PACKAGES: &[&str] = &[
    "ansible",
    "ansible-lint",
    "git",
    "python3",
    "python3-pip",
    "curl",
    "wget",
    "jq",
    "tree",
    "sshpass",
    "coreutils",
    "ca-certificates",
];

const RHEL_PACKAGES: &[&str] = &[
    "ansible",
    "ansible-lint",
    "git",
    "python3",
    "python3-pip",
    "curl",
    "wget",
    "jq",
    "tree",
    "sshpass",
    "coreutils",
    "ca-certificates",
];

const ARCH_PACKAGES: &[&str] = &[
    "ansible",
    "ansible-lint",
    "git",
    "python",
    "python-pip",
    "curl",
    "wget",
    "jq",
    "tree",
    "sshpass",
    "coreutils",
    "ca-certificates",
];

const SUSE_PACKAGES: &[&str] = &[
    "ansible",
    "python3-ansible-lint",
    "git",
    "python3",
    "python3-pip",
    "curl",
    "wget",
    "jq",
    "tree",
    "sshpass",
    "coreutils",
    "ca-certificates",
];

/// One package-manager action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStep {
    /// Refresh repository metadata
    Refresh(CommandSpec),
    /// Install a list of packages
    Install {
        command: CommandSpec,
        packages: &'static [&'static str],
    },
}

impl InstallStep {
    pub fn command(&self) -> &CommandSpec {
        match self {
            InstallStep::Refresh(command) => command,
            InstallStep::Install { command, .. } => command,
        }
    }

    fn describe(&self) -> String {
        match self {
            InstallStep::Refresh(_) => "Refreshing package repositories".to_string(),
            InstallStep::Install { packages, .. } => {
                format!("Installing {} packages: {}", packages.len(), packages.join(" "))
            }
        }
    }
}

/// Ordered package-manager steps for one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub family: OsFamily,
    pub steps: Vec<InstallStep>,
}

impl InstallPlan {
    pub fn for_family(family: OsFamily) -> Self {
        let packages = packages_for(family);
        let steps = match family {
            OsFamily::Debian => vec![
                InstallStep::Refresh(apt().arg("update")),
                InstallStep::Install {
                    command: apt().args(["install", "-y"]).args(packages.iter().copied()),
                    packages,
                },
            ],
            OsFamily::Rhel => vec![
                InstallStep::Refresh(CommandSpec::new("dnf").arg("makecache")),
                InstallStep::Install {
                    command: CommandSpec::new("dnf")
                        .args(["install", "-y"])
                        .args(packages.iter().copied()),
                    packages,
                },
            ],
            OsFamily::Arch => vec![
                InstallStep::Refresh(CommandSpec::new("pacman").args(["-Sy", "--noconfirm"])),
                InstallStep::Install {
                    command: CommandSpec::new("pacman")
                        .args(["-S", "--needed", "--noconfirm"])
                        .args(packages.iter().copied()),
                    packages,
                },
            ],
            OsFamily::Suse => vec![
                InstallStep::Refresh(
                    CommandSpec::new("zypper").args(["--non-interactive", "refresh"]),
                ),
                InstallStep::Install {
                    command: CommandSpec::new("zypper")
                        .args(["--non-interactive", "install"])
                        .args(packages.iter().copied()),
                    packages,
                },
            ],
        };
        Self { family, steps }
    }
}

fn apt() -> CommandSpec {
    CommandSpec::new("apt-get").env("DEBIAN_FRONTEND", "noninteractive")
}

/// Package names installed for a family.
pub fn packages_for(family: OsFamily) -> &'static [&'static str] {
    match family {
        OsFamily::Debian => DEBIAN_PACKAGES,
        OsFamily::Rhel => RHEL_PACKAGES,
        OsFamily::Arch => ARCH_PACKAGES,
        OsFamily::Suse => SUSE_PACKAGES,
    }
}

/// Install the prerequisite packages for `family`.
///
/// Stops at the first step that fails to start or exits non-zero.
pub fn install(family: OsFamily, runner: &dyn CommandRunner) -> Result<()> {
    let plan = InstallPlan::for_family(family);
    tracing::info!(%family, steps = plan.steps.len(), "installing prerequisites");

    for step in &plan.steps {
        console::info(&step.describe());
        let command = step.command();
        let status = runner.run(command).map_err(|e| {
            tracing::debug!(command = %command, error = %e, "package manager did not start");
            ProvisionError::PackageManager {
                command: command.to_string(),
                code: None,
            }
        })?;
        if !status.success() {
            return Err(ProvisionError::PackageManager {
                command: command.to_string(),
                code: status.code(),
            });
        }
    }

    console::success("Prerequisite packages installed");
    Ok(())
}
