//! Error types shared by all parsers and readers.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Error type for parsing failures.
///
/// Carries a human-readable message and the raw text (usually the whole
/// line) that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub text: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.text)
    }
}

impl std::error::Error for ParseError {}

/// Error returned by file-level operations.
#[derive(Debug)]
pub enum Error {
    /// The file could not be opened or read.
    Open { path: PathBuf, source: io::Error },
    /// The file was read but its content is malformed.
    Parse { path: PathBuf, source: ParseError },
}

impl Error {
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Open {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Error::Parse {
            path: path.into(),
            source,
        }
    }

    /// Path of the file that caused the error.
    pub fn path(&self) -> &Path {
        match self {
            Error::Open { path, .. } | Error::Parse { path, .. } => path,
        }
    }

    /// Returns true when the underlying file does not exist.
    ///
    /// Tasks disappear between enumeration and reading, so callers use this
    /// to tell a vanished entity apart from a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Open { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Open { path, source } => {
                write!(f, "could not open {}: {}", path.display(), source)
            }
            Error::Parse { path, source } => {
                write!(f, "could not parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { source, .. } => Some(source),
            Error::Parse { source, .. } => Some(source),
        }
    }
}

/// Failure of a string-to-number conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberError {
    /// The token is not a number in the requested base.
    InvalidArgument,
    /// The number does not fit the target type.
    OutOfRange,
}

impl NumberError {
    /// Wraps the conversion failure into a [`ParseError`] for `what`.
    ///
    /// The message follows the `Corrupted <what> - <reason>` convention
    /// used by every parser.
    pub fn corrupted(self, what: &str, text: &str) -> ParseError {
        ParseError::new(format!("Corrupted {} - {}", what, self), text)
    }
}

impl fmt::Display for NumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberError::InvalidArgument => write!(f, "Invalid argument"),
            NumberError::OutOfRange => write!(f, "Out of range"),
        }
    }
}

impl std::error::Error for NumberError {}
