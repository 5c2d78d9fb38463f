//! Runtime settings.
//!
//! Everything that would otherwise be ambient process state (where the
//! playbook lives, which os-release file to read, where the sudoers drop-in
//! goes) is collected here once and passed explicitly to each component.

use std::path::{Path, PathBuf};

/// Default location of the distribution descriptor.
pub const DEFAULT_OS_RELEASE: &str = "/etc/os-release";

/// Default sudoers drop-in path for the temporary grant.
pub const DEFAULT_GRANT_PATH: &str = "/etc/sudoers.d/99-workstation-bootstrap";

/// Playbook file name, relative to the base directory.
pub const PLAYBOOK_FILE: &str = "playbook.yml";

/// Inventory file name, relative to the base directory.
pub const INVENTORY_FILE: &str = "inventory";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the playbook and inventory; the playbook runs from here
    pub base_dir: PathBuf,
    pub playbook: PathBuf,
    pub inventory: PathBuf,
    pub os_release: PathBuf,
    pub grant_path: PathBuf,
    pub skip_root_check: bool,
    /// Print commands instead of running them and leave the filesystem alone
    pub dry_run: bool,
}

impl Settings {
    /// Settings rooted at `base_dir` with every other value at its default.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            playbook: base_dir.join(PLAYBOOK_FILE),
            inventory: base_dir.join(INVENTORY_FILE),
            os_release: PathBuf::from(DEFAULT_OS_RELEASE),
            grant_path: PathBuf::from(DEFAULT_GRANT_PATH),
            skip_root_check: false,
            dry_run: false,
            base_dir,
        }
    }

    /// Build settings from the process environment.
    pub fn from_env() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(&cwd, |key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// Recognised variables: `BOOTSTRAP_DIR`, `BOOTSTRAP_PLAYBOOK`,
    /// `BOOTSTRAP_INVENTORY`, `BOOTSTRAP_OS_RELEASE`, `BOOTSTRAP_GRANT_PATH`,
    /// `BOOTSTRAP_SKIP_ROOT_CHECK`.
    pub fn from_lookup<F>(cwd: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_dir = var("BOOTSTRAP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| cwd.to_path_buf());
        let mut settings = Self::with_base_dir(base_dir);

        if let Some(playbook) = var("BOOTSTRAP_PLAYBOOK") {
            settings.playbook = PathBuf::from(playbook);
        }
        if let Some(inventory) = var("BOOTSTRAP_INVENTORY") {
            settings.inventory = PathBuf::from(inventory);
        }
        if let Some(os_release) = var("BOOTSTRAP_OS_RELEASE") {
            settings.os_release = PathBuf::from(os_release);
        }
        if let Some(grant_path) = var("BOOTSTRAP_GRANT_PATH") {
            settings.grant_path = PathBuf::from(grant_path);
        }
        settings.skip_root_check = var("BOOTSTRAP_SKIP_ROOT_CHECK")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        settings
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
