//! Error types for promptline.

use std::fmt;
use std::io;

/// Result type alias for promptline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for promptline operations.
#[derive(Debug)]
pub enum Error {
    /// I/O error from the input reader or output writer.
    Io(io::Error),
    /// End of input. Returned by [`crate::Prompt::read_line`] when the input
    /// is canceled on an empty line (Ctrl-C / Ctrl-D) or when the input
    /// reader reaches end of stream. Not a failure.
    Eof,
    /// Invalid key binding or unknown command in a binding declaration.
    Binding(String),
    /// Malformed history file (bad cookie or invalid vis escape).
    History(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Eof => write!(f, "end of input"),
            Self::Binding(s) => write!(f, "invalid binding: {s}"),
            Self::History(s) => write!(f, "malformed history file: {s}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl Error {
    /// Check whether this is the end-of-input sentinel.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }
}
