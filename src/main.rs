//! Workstation bootstrap - main entry point

use anyhow::Context as _;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use workstation_bootstrap::cli::{Cli, Parsed};
use workstation_bootstrap::config::Settings;
use workstation_bootstrap::console;
use workstation_bootstrap::dispatcher::{self, Context, Outcome};
use workstation_bootstrap::error::ProvisionError;
use workstation_bootstrap::exec::{CommandRunner, DryRunRunner, SystemRunner};

/// Initialize diagnostics on stderr; `RUST_LOG` overrides the default `warn`.
fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")
}

fn run() -> Result<(), ProvisionError> {
    let request = match Cli::parse_request(std::env::args_os())? {
        Parsed::Run(request) => request,
        Parsed::Display(info) => {
            let _ = info.print();
            return Ok(());
        }
    };
    tracing::debug!(?request, "arguments parsed");

    let mut settings = Settings::from_env();
    settings.dry_run = request.dry_run;
    tracing::debug!(?settings, "settings resolved");

    let runner: &dyn CommandRunner = if settings.dry_run {
        &DryRunRunner
    } else {
        &SystemRunner
    };
    let ctx = Context {
        settings: &settings,
        runner,
        sudo_user: std::env::var("SUDO_USER").ok(),
    };

    if let Outcome::Detected(report) = dispatcher::dispatch(&request, &ctx)? {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => console::warn(&format!("Could not render detection report: {}", e)),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("{:#}", e);
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "aborting");
            console::error(&e.to_string());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
