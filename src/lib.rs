//! Workstation bootstrap library
//!
//! Detects the Linux distribution family, installs the prerequisites for an
//! Ansible run with the native package manager, grants the invoking user
//! temporary passwordless sudo, and hands the actual workstation setup to an
//! external playbook.

pub mod accounts;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod elevation;
pub mod error;
pub mod exec;
pub mod os_release;
pub mod packages;
pub mod playbook;

// Re-export main types for convenience
pub use accounts::Account;
pub use classifier::{classify, OsFamily};
pub use cli::{Cli, ProvisioningRequest};
pub use config::Settings;
pub use dispatcher::{dispatch, Context, DetectionReport, Outcome};
pub use elevation::{ElevationGrant, ElevationManager};
pub use error::{ProvisionError, Result};
pub use exec::{CommandRunner, CommandSpec, DryRunRunner, RecordingRunner, SystemRunner};
pub use os_release::DistributionIdentity;
pub use packages::{install, InstallPlan, InstallStep};
pub use playbook::PlaybookRun;
