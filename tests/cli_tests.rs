//! End-to-end tests for the `bootstrap` binary
//!
//! Only flows that touch nothing outside a temp directory are exercised here:
//! help, usage errors, cleanup against a redirected grant path and detection.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bootstrap(args: &[&str], env: &[(&str, &Path)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bootstrap"));
    cmd.args(args)
        .env_remove("BOOTSTRAP_SKIP_ROOT_CHECK")
        .env_remove("RUST_LOG");
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to run bootstrap binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_help_exits_zero() {
    for flag in ["-h", "--help"] {
        let output = bootstrap(&[flag], &[]);
        assert_eq!(output.status.code(), Some(0), "{flag}");
        let text = stdout(&output);
        for option in ["--extra-vars", "--cleanup", "--skip-packages", "--no-sudoers"] {
            assert!(text.contains(option), "help lacks {option}");
        }
    }
}

#[test]
fn test_unknown_option_exits_one() {
    let output = bootstrap(&["--frobnicate"], &[]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("[ERROR]"), "{err}");
    assert!(err.contains("--frobnicate"), "{err}");
}

#[test]
fn test_cleanup_removes_grant_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let grant = dir.path().join("grant");
    fs::write(&grant, "someone ALL=(ALL) NOPASSWD: ALL\n").unwrap();

    let output = bootstrap(
        &["--cleanup"],
        &[
            ("BOOTSTRAP_GRANT_PATH", grant.as_path()),
            ("BOOTSTRAP_SKIP_ROOT_CHECK", Path::new("1")),
        ],
    );

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(!grant.exists());
    assert!(stdout(&output).contains("[OK]"));
}

#[test]
fn test_non_root_is_rejected() {
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let grant = dir.path().join("grant");
    let output = bootstrap(&["--cleanup"], &[("BOOTSTRAP_GRANT_PATH", grant.as_path())]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("root"));
}

#[test]
fn test_detect_prints_json() {
    let dir = TempDir::new().unwrap();
    let os_release = dir.path().join("os-release");
    fs::write(
        &os_release,
        "PRETTY_NAME=\"Fedora Linux 42\"\nID=fedora\nVERSION_ID=42\n",
    )
    .unwrap();

    let output = bootstrap(
        &["--detect", "--dry-run"],
        &[("BOOTSTRAP_OS_RELEASE", os_release.as_path())],
    );

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let text = stdout(&output);
    let json_start = text.find('{').expect("JSON report on stdout");
    let report: serde_json::Value = serde_json::from_str(&text[json_start..]).unwrap();
    assert_eq!(report["family"], "rhel");
    assert_eq!(report["id"], "fedora");
}

#[test]
fn test_unsupported_os_exits_one() {
    let dir = TempDir::new().unwrap();
    let os_release = dir.path().join("os-release");
    fs::write(&os_release, "ID=gentoo\n").unwrap();

    let output = bootstrap(&["--dry-run"], &[("BOOTSTRAP_OS_RELEASE", os_release.as_path())]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unsupported OS: gentoo"));
}
