// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for medium operations.
pub type BfsIOResult<T = ()> = core::result::Result<T, BfsIOError>;

/// Error type for medium operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BfsIOError {
    /// Access past the end of the medium.
    OutOfBounds,
    /// The backing object does not exist.
    NotFound,
    Unsupported,
    Other(&'static str),
}

impl BfsIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            BfsIOError::OutOfBounds => "Out of bounds",
            BfsIOError::NotFound => "Medium not found",
            BfsIOError::Unsupported => "Unsupported operation",
            BfsIOError::Other(msg) => msg,
        }
    }
}

impl From<&'static str> for BfsIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        BfsIOError::Other(msg)
    }
}

impl fmt::Display for BfsIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

impl core::error::Error for BfsIOError {}
