//! GitHub Actions workflow commands (`::warning::message` and friends).
//!
//! These go to stdout, where the runner turns them into log annotations.
//! Diagnostic logging goes through `tracing` on stderr instead.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

/// Format a workflow command. Newlines are escaped so multi-line messages
/// stay one annotation.
pub fn format(level: Level, message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::{}::{}", level.as_str(), escaped)
}

pub fn debug(message: &str) {
    println!("{}", format(Level::Debug, message));
}

pub fn warning(message: &str) {
    tracing::warn!("{message}");
    println!("{}", format(Level::Warning, message));
}

pub fn error(message: &str) {
    tracing::error!("{message}");
    println!("{}", format(Level::Error, message));
}
