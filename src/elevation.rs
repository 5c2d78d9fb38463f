//! Temporary passwordless sudo for the provisioned user.
//!
//! The grant is a single-line sudoers drop-in. It is written, checked with
//! `visudo -cf`, and kept only if the check passes; a [`PendingGrant`] guard
//! removes the file on every path that does not reach `commit`.

use std::fs::{self, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::accounts;
use crate::console;
use crate::error::{ProvisionError, Result};
use crate::exec::{CommandRunner, CommandSpec};

/// File mode for the drop-in; sudo ignores group/world-writable files.
pub const GRANT_MODE: u32 = 0o440;

/// Syntax checker for sudoers files.
pub const VALIDATOR: &str = "visudo";

/// The sudoers rule granted to `user`.
pub fn sudoers_rule(user: &str) -> String {
    format!("{} ALL=(ALL) NOPASSWD: ALL\n", user)
}

/// A validated grant that is in place on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationGrant {
    pub user: String,
    pub path: PathBuf,
}

/// RAII guard that removes an unvalidated grant file when dropped.
#[derive(Debug)]
struct PendingGrant<'a> {
    path: &'a Path,
    active: bool,
}

impl<'a> PendingGrant<'a> {
    /// Create the drop-in with restrictive permissions and write `rule`.
    fn write(path: &'a Path, rule: &str) -> io::Result<Self> {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "replaced stale grant"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(GRANT_MODE)
            .open(path)?;
        let guard = Self { path, active: true };

        file.write_all(rule.as_bytes())?;
        file.sync_all()?;
        // umask may have narrowed the mode; pin it exactly
        fs::set_permissions(path, Permissions::from_mode(GRANT_MODE))?;
        Ok(guard)
    }

    /// Keep the file.
    fn commit(mut self) {
        self.active = false;
    }
}

impl Drop for PendingGrant<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        match fs::remove_file(self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed unvalidated grant"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => console::warn(&format!(
                "Failed to remove unvalidated grant {}: {}",
                self.path.display(),
                e
            )),
        }
    }
}

/// Writes, validates and removes the sudoers grant at one fixed path.
pub struct ElevationManager<'a> {
    path: PathBuf,
    dry_run: bool,
    runner: &'a dyn CommandRunner,
}

impl<'a> ElevationManager<'a> {
    pub fn new(path: impl Into<PathBuf>, dry_run: bool, runner: &'a dyn CommandRunner) -> Self {
        Self {
            path: path.into(),
            dry_run,
            runner,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a grant file is currently present.
    pub fn is_granted(&self) -> bool {
        self.path.exists()
    }

    /// Grant `user` passwordless sudo.
    ///
    /// Fails with `UnknownUser` before touching the filesystem if the user
    /// does not resolve, and with `InvalidGrantSyntax` (file removed) if the
    /// validator rejects the drop-in or cannot be run.
    pub fn grant(&self, user: &str) -> Result<ElevationGrant> {
        let account = accounts::lookup(user)?;
        let rule = sudoers_rule(&account.name);
        let grant = ElevationGrant {
            user: account.name.clone(),
            path: self.path.clone(),
        };

        if self.dry_run {
            console::info(&format!(
                "[dry-run] would write {} with: {}",
                self.path.display(),
                rule.trim_end()
            ));
            return Ok(grant);
        }

        console::info(&format!("Configuring passwordless sudo for {}", account.name));
        let pending =
            PendingGrant::write(&self.path, &rule).map_err(|e| ProvisionError::io(&self.path, e))?;

        self.validate()?;
        pending.commit();

        tracing::info!(user = %grant.user, path = %grant.path.display(), "grant in place");
        console::success(&format!("Sudo grant written to {}", self.path.display()));
        Ok(grant)
    }

    fn validate(&self) -> Result<()> {
        let check = CommandSpec::new(VALIDATOR).arg("-cf").arg(self.path.display().to_string());
        let valid = match self.runner.run(&check) {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(error = %e, "validator did not start");
                false
            }
        };
        if valid {
            Ok(())
        } else {
            Err(ProvisionError::InvalidGrantSyntax {
                path: self.path.clone(),
            })
        }
    }

    /// Remove the grant if present. Returns whether a file was removed.
    pub fn revoke(&self) -> Result<bool> {
        if self.dry_run {
            console::info(&format!("[dry-run] would remove {}", self.path.display()));
            return Ok(self.is_granted());
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "grant revoked");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ProvisionError::io(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;
    use tempfile::TempDir;

    #[test]
    fn rule_is_single_line() {
        assert_eq!(sudoers_rule("alice"), "alice ALL=(ALL) NOPASSWD: ALL\n");
    }

    #[test]
    fn pending_grant_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grant");
        {
            let _pending = PendingGrant::write(&path, "x\n").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn committed_grant_survives_with_mode_0440() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grant");
        PendingGrant::write(&path, "x\n").unwrap().commit();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, GRANT_MODE);
    }

    #[test]
    fn validator_is_run_against_the_grant_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grant");
        let runner = RecordingRunner::new();
        let manager = ElevationManager::new(&path, false, &runner);

        manager.grant("root").unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, VALIDATOR);
        assert_eq!(calls[0].args, vec!["-cf".to_string(), path.display().to_string()]);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grant");
        let runner = RecordingRunner::new();
        let manager = ElevationManager::new(&path, true, &runner);

        let grant = manager.grant("root").unwrap();
        assert_eq!(grant.user, "root");
        assert!(!path.exists());
        assert!(runner.calls().is_empty());
        assert!(!manager.revoke().unwrap());
    }
}
