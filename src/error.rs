use std::io;
use std::path::PathBuf;

use rustyline::error::ReadlineError;
use thiserror::Error;

/// Everything that can go wrong between reading a line and finishing a command.
///
/// Only [`ShellError::OutOfMemory`] and the input stream variants ever reach the
/// REPL driver as errors; the rest are reported by the component that hit them
/// and the loop moves on to the next prompt.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A line or token buffer could not grow.
    #[error("allocation error")]
    OutOfMemory,

    /// A builtin received missing or extra arguments.
    #[error("{0}")]
    InvalidArgument(String),

    /// fork or exec failed for an external command.
    #[error("{command}: {reason}")]
    ProcessSpawnFailure { command: String, reason: String },

    /// A path the command needed could not be used.
    #[error("{}: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Editor(#[from] ReadlineError),
}

impl ShellError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Fatal errors end the process instead of the current command.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory)
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
