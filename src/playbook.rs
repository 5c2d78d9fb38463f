//! Hand-off to `ansible-playbook`.

use std::path::{Path, PathBuf};

use crate::accounts::Account;
use crate::console;
use crate::error::{ProvisionError, Result};
use crate::exec::{CommandRunner, CommandSpec};

/// The external configuration-management tool.
pub const ANSIBLE_PLAYBOOK: &str = "ansible-playbook";

/// Inputs to one playbook run.
#[derive(Debug, Clone)]
pub struct PlaybookRun<'a> {
    pub extra_vars: &'a Path,
    pub playbook: &'a Path,
    pub inventory: &'a Path,
    pub user: &'a Account,
    /// Working directory for the run
    pub base_dir: &'a Path,
}

impl PlaybookRun<'_> {
    /// Fail with `MissingFile` on the first input that does not exist.
    pub fn check_inputs(&self) -> Result<()> {
        for path in [self.inventory, self.playbook, self.extra_vars] {
            if !path.exists() {
                return Err(ProvisionError::MissingFile(path.to_path_buf()));
            }
        }
        Ok(())
    }

    /// The `ansible-playbook` invocation, run as the target user.
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(ANSIBLE_PLAYBOOK)
            .arg("-i")
            .arg(absolute(self.inventory).display().to_string())
            .arg(absolute(self.playbook).display().to_string())
            .arg("--extra-vars")
            .arg(format!("@{}", absolute(self.extra_vars).display()))
            .current_dir(self.base_dir)
            .run_as(self.user.clone())
    }
}

/// Paths are handed to a child with a different working directory.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Validate inputs, then run the playbook as `run.user`.
///
/// No process is started unless every input file exists.
pub fn run(run: &PlaybookRun<'_>, runner: &dyn CommandRunner) -> Result<()> {
    run.check_inputs()?;

    let command = run.command();
    console::info(&format!(
        "Running {} as {} with {}",
        run.playbook.display(),
        run.user.name,
        run.extra_vars.display()
    ));
    tracing::info!(command = %command, "starting playbook");

    let status = runner.run(&command).map_err(|e| {
        tracing::debug!(error = %e, "{} did not start", ANSIBLE_PLAYBOOK);
        ProvisionError::ExternalToolFailure {
            tool: ANSIBLE_PLAYBOOK.to_string(),
            code: None,
        }
    })?;

    if !status.success() {
        return Err(ProvisionError::ExternalToolFailure {
            tool: ANSIBLE_PLAYBOOK.to_string(),
            code: status.code(),
        });
    }

    console::success("Playbook completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts;
    use crate::exec::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        account: Account,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            for name in ["inventory", "playbook.yml", "vars.yml"] {
                fs::write(dir.path().join(name), "---\n").unwrap();
            }
            Self {
                dir,
                account: accounts::lookup("root").unwrap(),
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }
    }

    #[test]
    fn command_has_fixed_arguments() {
        let fx = Fixture::new();
        let (inv, pb, vars) = (fx.path("inventory"), fx.path("playbook.yml"), fx.path("vars.yml"));
        let run = PlaybookRun {
            extra_vars: &vars,
            playbook: &pb,
            inventory: &inv,
            user: &fx.account,
            base_dir: fx.dir.path(),
        };

        let command = run.command();
        assert_eq!(command.program, ANSIBLE_PLAYBOOK);
        assert_eq!(
            command.args,
            vec![
                "-i".to_string(),
                inv.display().to_string(),
                pb.display().to_string(),
                "--extra-vars".to_string(),
                format!("@{}", vars.display()),
            ]
        );
        assert_eq!(command.run_as.as_ref().map(|a| a.name.as_str()), Some("root"));
        assert_eq!(command.current_dir.as_deref(), Some(fx.dir.path()));
    }

    #[test]
    fn first_missing_file_is_reported() {
        let fx = Fixture::new();
        fs::remove_file(fx.path("playbook.yml")).unwrap();
        fs::remove_file(fx.path("vars.yml")).unwrap();
        let (inv, pb, vars) = (fx.path("inventory"), fx.path("playbook.yml"), fx.path("vars.yml"));
        let runner = RecordingRunner::new();

        let err = run(
            &PlaybookRun {
                extra_vars: &vars,
                playbook: &pb,
                inventory: &inv,
                user: &fx.account,
                base_dir: fx.dir.path(),
            },
            &runner,
        )
        .unwrap_err();

        assert!(matches!(err, ProvisionError::MissingFile(p) if p == pb));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn playbook_failure_carries_exit_code() {
        let fx = Fixture::new();
        let (inv, pb, vars) = (fx.path("inventory"), fx.path("playbook.yml"), fx.path("vars.yml"));
        let runner = RecordingRunner::new().exit_with(ANSIBLE_PLAYBOOK, 4);

        let err = run(
            &PlaybookRun {
                extra_vars: &vars,
                playbook: &pb,
                inventory: &inv,
                user: &fx.account,
                base_dir: fx.dir.path(),
            },
            &runner,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::ExternalToolFailure { code: Some(4), .. }
        ));
        assert_eq!(err.exit_code(), 4);
        assert_eq!(runner.calls().len(), 1);
    }
}
