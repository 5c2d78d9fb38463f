//! Provisioning flow.
//!
//! Sequences the components for one [`ProvisioningRequest`]:
//!
//! ```text
//! root check -> [cleanup]                                        -> CleanedUp
//! root check -> detect -> [detect only]                          -> Detected
//! root check -> detect -> packages? -> grant? -> playbook -> revoke -> Provisioned
//! root check -> detect -> packages? -> grant? -> (no vars)       -> AwaitingVars
//! ```
//!
//! Every step is fail-fast. Nothing is rolled back on failure; a grant that
//! was written stays until `--cleanup` or the next successful playbook run.

use serde::Serialize;

use crate::accounts;
use crate::classifier::{classify, OsFamily};
use crate::cli::ProvisioningRequest;
use crate::config::Settings;
use crate::console;
use crate::elevation::{ElevationGrant, ElevationManager};
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::os_release::DistributionIdentity;
use crate::packages;
use crate::playbook::{self, PlaybookRun};

/// What `--detect` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    #[serde(flatten)]
    pub identity: DistributionIdentity,
    pub family: OsFamily,
}

/// Terminal state of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `--cleanup`: `removed` says whether a grant file existed
    CleanedUp { removed: bool },
    /// `--detect`
    Detected(DetectionReport),
    /// Playbook ran and the grant was revoked
    Provisioned { family: OsFamily },
    /// No extra-vars file; any grant is left in place
    AwaitingVars {
        family: OsFamily,
        grant: Option<ElevationGrant>,
    },
}

/// Explicit process-wide inputs for one run.
pub struct Context<'a> {
    pub settings: &'a Settings,
    pub runner: &'a dyn CommandRunner,
    /// Value of `SUDO_USER`, if any
    pub sudo_user: Option<String>,
}

/// Detect the distribution from the configured os-release file.
pub fn detect(settings: &Settings) -> Result<DetectionReport> {
    let identity = DistributionIdentity::read_from(&settings.os_release)?;
    let family = classify(&identity)?;
    Ok(DetectionReport { identity, family })
}

/// Run the provisioning flow for `request`.
pub fn dispatch(request: &ProvisioningRequest, ctx: &Context<'_>) -> Result<Outcome> {
    let settings = ctx.settings;

    if settings.dry_run || settings.skip_root_check {
        tracing::warn!(dry_run = settings.dry_run, "root check skipped");
    } else {
        accounts::require_root()?;
    }

    let elevation = ElevationManager::new(&settings.grant_path, settings.dry_run, ctx.runner);

    if request.cleanup_only {
        let removed = elevation.revoke()?;
        if removed {
            console::success(&format!("Removed sudo grant {}", elevation.path().display()));
        } else {
            console::info(&format!("No sudo grant at {}", elevation.path().display()));
        }
        return Ok(Outcome::CleanedUp { removed });
    }

    let report = detect(settings)?;
    let family = report.family;
    let version = if report.identity.version.is_empty() {
        String::new()
    } else {
        format!(" {}", report.identity.version)
    };
    console::info(&format!(
        "Detected OS: {}{} (family: {})",
        report.identity.pretty_name, version, family
    ));

    if request.detect_only {
        return Ok(Outcome::Detected(report));
    }

    if request.skip_packages {
        console::warn("Skipping package installation");
    } else {
        packages::install(family, ctx.runner)?;
    }

    let needs_user = !request.skip_sudoers || request.extra_vars.is_some();
    let account = if needs_user {
        Some(accounts::resolve_invoking_user(
            request.user.as_deref(),
            ctx.sudo_user.as_deref(),
        )?)
    } else {
        None
    };

    let grant = match (&account, request.skip_sudoers) {
        (Some(account), false) => Some(elevation.grant(&account.name)?),
        _ => {
            console::warn("Skipping sudo grant");
            None
        }
    };

    let (Some(extra_vars), Some(account)) = (request.extra_vars.as_deref(), account.as_ref()) else {
        console::warn("No extra-vars file given; playbook not run");
        if let Some(grant) = &grant {
            console::warn(&format!(
                "Passwordless sudo for {} remains in {}",
                grant.user,
                grant.path.display()
            ));
        }
        console::info("Next steps:");
        console::info("  sudo bootstrap -s -e <vars-file>   run the playbook");
        console::info("  sudo bootstrap --cleanup           remove the sudo grant");
        return Ok(Outcome::AwaitingVars { family, grant });
    };

    playbook::run(
        &PlaybookRun {
            extra_vars,
            playbook: &settings.playbook,
            inventory: &settings.inventory,
            user: account,
            base_dir: &settings.base_dir,
        },
        ctx.runner,
    )?;

    if elevation.revoke()? {
        console::success("Temporary sudo grant removed");
    }
    console::success("Workstation provisioning complete");
    Ok(Outcome::Provisioned { family })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn detection_report_serializes_flat() {
        let report = DetectionReport {
            identity: DistributionIdentity::new("fedora", "", "42"),
            family: OsFamily::Rhel,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["id"], "fedora");
        assert_eq!(json["version"], "42");
        assert_eq!(json["family"], "rhel");
    }

    #[test]
    fn detect_reads_configured_os_release() {
        let dir = TempDir::new().unwrap();
        let os_release = dir.path().join("os-release");
        fs::write(&os_release, "ID=manjaro\nID_LIKE=arch\n").unwrap();

        let mut settings = Settings::with_base_dir(dir.path());
        settings.os_release = os_release;
        assert_eq!(detect(&settings).unwrap().family, OsFamily::Arch);
    }

    #[test]
    fn detect_only_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let os_release = dir.path().join("os-release");
        fs::write(&os_release, "ID=debian\nVERSION_ID=12\n").unwrap();

        let mut settings = Settings::with_base_dir(dir.path());
        settings.os_release = os_release;
        settings.grant_path = dir.path().join("grant");
        settings.skip_root_check = true;
        let runner = RecordingRunner::new();

        let outcome = dispatch(
            &ProvisioningRequest {
                detect_only: true,
                ..Default::default()
            },
            &Context {
                settings: &settings,
                runner: &runner,
                sudo_user: None,
            },
        )
        .unwrap();

        assert!(matches!(outcome, Outcome::Detected(r) if r.family == OsFamily::Debian));
        assert!(runner.calls().is_empty());
    }
}
