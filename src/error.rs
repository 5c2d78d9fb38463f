//! Error handling module for the bootstrapper
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every error is fatal: the binary prints it as a labeled line and exits with
//! [`ProvisionError::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the bootstrapper
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The process lacks root privileges
    #[error("Must be run as root (try: sudo bootstrap)")]
    NotRoot,

    /// Neither the distribution id nor any ID_LIKE entry maps to a known family
    #[error("Unsupported OS: {id} (ID_LIKE: {id_like})")]
    UnsupportedOs { id: String, id_like: String },

    /// A package manager invocation failed or could not be started
    #[error("Package manager command failed{}: {command}", exit_suffix(.code))]
    PackageManager { command: String, code: Option<i32> },

    /// The user name does not resolve to an account on this system
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// The resolved invoking user is root, which would defeat the scoped grant
    #[error("Refusing to provision for root; run via sudo from a regular account or pass --user")]
    RootInvoker,

    /// The sudoers drop-in failed `visudo` validation and was removed
    #[error("Invalid sudoers syntax in {}; file removed", .path.display())]
    InvalidGrantSyntax { path: PathBuf },

    /// A required input file does not exist
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Command line could not be parsed
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// The external configuration-management tool exited unsuccessfully
    #[error("{tool} failed{}", exit_suffix(.code))]
    ExternalToolFailure { tool: String, code: Option<i32> },

    /// IO errors tied to a specific path
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {})", code),
        None => " (terminated or not started)".to_string(),
    }
}

impl ProvisionError {
    /// Attach a path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure.
    ///
    /// Child process failures propagate the child's own exit status when it is
    /// known and non-zero; everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PackageManager { code: Some(code), .. }
            | Self::ExternalToolFailure { code: Some(code), .. }
                if *code > 0 && *code < 256 =>
            {
                *code
            }
            _ => 1,
        }
    }
}
