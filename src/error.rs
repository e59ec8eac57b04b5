//! Error taxonomy for the split / combine workflows.
//!
//! Every variant is fatal: the run stops at the step that detected it and
//! nothing downstream (prompting, invoking ssss, writing files) happens.

use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum SilentError {
    /// Malformed or contradictory arguments, caught before any I/O.
    #[error("{0}")]
    Usage(String),

    #[error("will not overwrite existing file {}", .path.display())]
    OverwriteRefused { path: PathBuf },

    #[error("{tool} failed ({status}){}", fmt_diagnostic(.diagnostic))]
    ExternalToolFailure {
        tool: String,
        status: ToolStatus,
        diagnostic: String,
    },

    #[error("expected {expected} shares, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// Standard input ended before a required secret or share was read.
    #[error("input closed before {0} was read")]
    InputClosed(&'static str),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// How the external tool ended, when it did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    /// The process could not be started at all.
    NotStarted,
    Exited(ExitStatus),
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::NotStarted => write!(f, "could not be started"),
            ToolStatus::Exited(status) => write!(f, "{status}"),
        }
    }
}

fn fmt_diagnostic(diagnostic: &str) -> String {
    if diagnostic.is_empty() {
        String::new()
    } else {
        format!(": {diagnostic}")
    }
}

impl SilentError {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SilentError::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code: 2 for usage problems (same as clap), 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            SilentError::Usage(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, SilentError>;
