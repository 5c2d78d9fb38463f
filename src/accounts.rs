//! User account resolution and privilege handling.
//!
//! Provides the root check, lookup of the invoking user, and a `Command`
//! extension that drops a child process to that user's uid/gid and groups.

use nix::unistd::{Gid, Uid, User};
use std::ffi::CString;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{ProvisionError, Result};

/// A resolved system account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub uid: Uid,
    pub gid: Gid,
    pub home: PathBuf,
}

impl Account {
    pub fn is_root(&self) -> bool {
        self.uid.is_root()
    }
}

/// Resolve a user name to an account.
pub fn lookup(name: &str) -> Result<Account> {
    if name.is_empty() {
        return Err(ProvisionError::UnknownUser(String::new()));
    }
    match User::from_name(name) {
        Ok(Some(user)) => Ok(Account {
            name: user.name,
            uid: user.uid,
            gid: user.gid,
            home: user.dir,
        }),
        Ok(None) => Err(ProvisionError::UnknownUser(name.to_string())),
        Err(errno) => {
            tracing::debug!(user = name, %errno, "passwd lookup failed");
            Err(ProvisionError::UnknownUser(name.to_string()))
        }
    }
}

/// Check if running as root (EUID 0)
pub fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Fail with `NotRoot` unless running as root.
pub fn require_root() -> Result<()> {
    if is_running_as_root() {
        Ok(())
    } else {
        Err(ProvisionError::NotRoot)
    }
}

/// Pick the name of the user the workstation is being provisioned for.
///
/// An explicit `--user` wins, then `SUDO_USER`. Root is never accepted.
pub fn invoking_user_name(explicit: Option<&str>, sudo_user: Option<&str>) -> Result<String> {
    let name = explicit
        .or(sudo_user)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ProvisionError::UnknownUser(
                "could not determine invoking user (SUDO_USER unset; pass --user)".to_string(),
            )
        })?;

    if name == "root" {
        return Err(ProvisionError::RootInvoker);
    }
    Ok(name.to_string())
}

/// Resolve the invoking user to a non-root account.
pub fn resolve_invoking_user(explicit: Option<&str>, sudo_user: Option<&str>) -> Result<Account> {
    let account = lookup(&invoking_user_name(explicit, sudo_user)?)?;
    if account.is_root() {
        return Err(ProvisionError::RootInvoker);
    }
    Ok(account)
}

/// Extension trait to run a `Command` as another user.
pub trait CommandRunAs {
    /// Switch the child to `account`'s groups, gid and uid, and point
    /// `HOME`/`USER`/`LOGNAME` at it.
    fn run_as(&mut self, account: &Account) -> io::Result<&mut Self>;
}

impl CommandRunAs for Command {
    fn run_as(&mut self, account: &Account) -> io::Result<&mut Self> {
        use std::os::unix::process::CommandExt;

        let c_name = CString::new(account.name.as_str())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // Resolved before fork; pre_exec must not allocate
        let groups = nix::unistd::getgrouplist(&c_name, account.gid).map_err(io::Error::from)?;
        let uid = account.uid;
        let gid = account.gid;

        self.env("HOME", &account.home)
            .env("USER", &account.name)
            .env("LOGNAME", &account.name);

        // SAFETY: only async-signal-safe syscalls run between fork and exec
        unsafe {
            self.pre_exec(move || {
                nix::unistd::setgroups(&groups).map_err(io::Error::from)?;
                nix::unistd::setgid(gid).map_err(io::Error::from)?;
                nix::unistd::setuid(uid).map_err(io::Error::from)?;
                Ok(())
            });
        }
        Ok(self)
    }
}
