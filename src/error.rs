/*!
 * Error types for Lantern
 */

use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, LanternError>;

#[derive(Debug)]
pub enum LanternError {
    /// Container-level structural failure: a blob that does not look like
    /// the expected format at all, an unrecognized header magic, or a
    /// truncated binary section
    Format(String),

    /// Field-level failure inside an otherwise well-shaped container,
    /// such as a MAC field of the wrong length or a missing name marker
    Validation(String),

    /// The compressed input stream could not be decompressed
    Decompression(String),

    /// I/O error
    Io(io::Error),
}

impl LanternError {
    /// Check if this error is fatal for the enclosing operation.
    ///
    /// Format and validation failures abort one decode but the caller can
    /// carry on with its other sources. A stream that cannot be read or
    /// decompressed at all mirrors the historical treatment of a
    /// misconfigured file: unrecoverable for the invocation.
    pub fn is_fatal(&self) -> bool {
        match self {
            LanternError::Format(_) => false,
            LanternError::Validation(_) => false,
            LanternError::Decompression(_) => true,
            LanternError::Io(_) => true,
        }
    }
}

impl fmt::Display for LanternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanternError::Format(msg) => {
                write!(f, "Format error: {}", msg)
            }
            LanternError::Validation(msg) => {
                write!(f, "Validation error: {}", msg)
            }
            LanternError::Decompression(msg) => {
                write!(f, "Decompression error: {}", msg)
            }
            LanternError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for LanternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LanternError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LanternError {
    fn from(err: io::Error) -> Self {
        LanternError::Io(err)
    }
}
