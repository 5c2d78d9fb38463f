//! Colored, leveled status lines for the operator.
//!
//! These are the user-facing progress messages. Diagnostics go through
//! `tracing` instead and are off unless `RUST_LOG` asks for them.

use crossterm::style::{StyledContent, Stylize};
use std::io::{self, IsTerminal};

/// Severity of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Info => "[INFO]",
            Level::Success => "[OK]",
            Level::Warn => "[WARN]",
            Level::Error => "[ERROR]",
        }
    }

    fn styled(self) -> StyledContent<&'static str> {
        let label = self.label();
        match self {
            Level::Info => label.blue().bold(),
            Level::Success => label.green().bold(),
            Level::Warn => label.yellow().bold(),
            Level::Error => label.red().bold(),
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Warn | Level::Error)
    }
}

/// Render a line without color codes.
pub fn format_plain(level: Level, message: &str) -> String {
    format!("{} {}", level.label(), message)
}

/// Print a line at the given level, colored when the stream is a terminal.
pub fn line(level: Level, message: &str) {
    if level.to_stderr() {
        if io::stderr().is_terminal() {
            eprintln!("{} {}", level.styled(), message);
        } else {
            eprintln!("{}", format_plain(level, message));
        }
    } else if io::stdout().is_terminal() {
        println!("{} {}", level.styled(), message);
    } else {
        println!("{}", format_plain(level, message));
    }
}

pub fn info(message: &str) {
    line(Level::Info, message);
}

pub fn success(message: &str) {
    line(Level::Success, message);
}

pub fn warn(message: &str) {
    line(Level::Warn, message);
}

pub fn error(message: &str) {
    line(Level::Error, message);
}
