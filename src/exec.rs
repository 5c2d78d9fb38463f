//! External command execution.
//!
//! Every process the bootstrapper starts is described by a [`CommandSpec`] and
//! handed to a [`CommandRunner`], so the provisioning flow can be exercised
//! without spawning package managers or Ansible.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::sync::{Arc, Mutex};

use crate::accounts::{Account, CommandRunAs};
use crate::console;

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
    pub run_as: Option<Account>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
            run_as: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn run_as(mut self, account: Account) -> Self {
        self.run_as = Some(account);
        self
    }

    /// Build the `std::process::Command` for this spec.
    pub fn to_command(&self) -> io::Result<Command> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        if let Some(account) = &self.run_as {
            cmd.run_as(account)?;
        }
        Ok(cmd)
    }
}

impl fmt::Display for CommandSpec {
    /// Shell-like rendering used in logs and error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(account) = &self.run_as {
            write!(f, " (as {})", account.name)?;
        }
        Ok(())
    }
}

/// Process execution trait (external command runner).
pub trait CommandRunner {
    /// Run the command to completion with inherited stdio.
    fn run(&self, spec: &CommandSpec) -> io::Result<ExitStatus>;
}

/// Runs commands for real.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<ExitStatus> {
        tracing::debug!(command = %spec, "spawning");
        let status = spec.to_command()?.status()?;
        tracing::debug!(command = %spec, code = ?status.code(), "finished");
        Ok(status)
    }
}

/// Prints commands instead of running them; every command "succeeds".
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<ExitStatus> {
        console::info(&format!("[dry-run] {}", spec));
        Ok(ExitStatus::from_raw(0))
    }
}

/// Records commands without executing them.
///
/// Programs can be told to exit with a chosen code, or to fail to spawn.
#[derive(Debug, Default, Clone)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    exit_codes: HashMap<String, i32>,
    unspawnable: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `program` exit with `code`.
    pub fn exit_with(mut self, program: &str, code: i32) -> Self {
        self.exit_codes.insert(program.to_string(), code);
        self
    }

    /// Make every invocation of `program` fail as if it were not installed.
    pub fn not_found(mut self, program: &str) -> Self {
        self.unspawnable.push(program.to_string());
        self
    }

    /// Snapshot of every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Programs run so far, in order.
    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<ExitStatus> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }
        if self.unspawnable.contains(&spec.program) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", spec.program),
            ));
        }
        let code = self.exit_codes.get(&spec.program).copied().unwrap_or(0);
        // wait(2) encoding: exit code lives in the second byte
        Ok(ExitStatus::from_raw(code << 8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_env_program_and_args() {
        let spec = CommandSpec::new("apt-get")
            .env("DEBIAN_FRONTEND", "noninteractive")
            .args(["install", "-y", "git"]);
        assert_eq!(
            spec.to_string(),
            "DEBIAN_FRONTEND=noninteractive apt-get install -y git"
        );
    }

    #[test]
    fn recording_runner_records_and_fakes_exit_codes() {
        let runner = RecordingRunner::new().exit_with("dnf", 1);

        let ok = runner.run(&CommandSpec::new("git").arg("--version")).unwrap();
        assert!(ok.success());

        let failed = runner.run(&CommandSpec::new("dnf").arg("makecache")).unwrap();
        assert!(!failed.success());
        assert_eq!(failed.code(), Some(1));

        assert_eq!(runner.programs(), vec!["git", "dnf"]);
    }

    #[test]
    fn recording_runner_clones_share_history() {
        let runner = RecordingRunner::new();
        let observer = runner.clone();
        runner.run(&CommandSpec::new("visudo")).unwrap();
        assert_eq!(observer.programs(), vec!["visudo"]);
    }

    #[test]
    fn recording_runner_not_found() {
        let runner = RecordingRunner::new().not_found("zypper");
        let err = runner.run(&CommandSpec::new("zypper")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(runner.programs(), vec!["zypper"]);
    }

    #[test]
    fn system_runner_reports_exit_status() {
        let status = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "exit 3"]))
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn system_runner_missing_binary_is_io_error() {
        let result = SystemRunner.run(&CommandSpec::new("this_binary_definitely_does_not_exist_12345"));
        assert!(result.is_err());
    }
}
