// SPDX-License-Identifier: MIT

use core::fmt;

pub use bfsio::errors::*;

use crate::file::Fd;

/// Block store growth failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BfsAllocError {
    /// Not enough free blocks for the requested extension.
    OutOfBlocks,
    /// Inode table (and so the directory) is full.
    OutOfInodes,
    /// Requested block count exceeds what one inode can map.
    FileTooLarge,
}

impl BfsAllocError {
    pub fn msg(&self) -> &'static str {
        match self {
            BfsAllocError::OutOfBlocks => "Out of blocks",
            BfsAllocError::OutOfInodes => "Out of inodes",
            BfsAllocError::FileTooLarge => "File too large",
        }
    }
}

/// Top-level error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BfsError {
    /// Name did not resolve to a file.
    FileNotFound,
    /// Negative seek offset, or a cursor that does not fit in 64 bits.
    InvalidCursor,
    /// Raw seek mode other than set/current/end.
    InvalidWhence(i32),
    /// The block store cannot satisfy a growth request.
    Allocation(BfsAllocError),
    /// The backing medium cannot be created, opened or read at all.
    MediumUnavailable(BfsIOError),
    /// File name rejected by the directory.
    InvalidName(&'static str),
    /// Handle not present in the open-file table.
    BadDescriptor(Fd),
    /// Geometry parameters rejected at format time.
    InvalidParams(&'static str),
    /// On-disk structures are inconsistent.
    Corrupt(&'static str),
    IO(BfsIOError),
}

impl From<BfsIOError> for BfsError {
    fn from(e: BfsIOError) -> Self {
        BfsError::IO(e)
    }
}

impl From<BfsAllocError> for BfsError {
    fn from(e: BfsAllocError) -> Self {
        BfsError::Allocation(e)
    }
}

pub type BfsResult<T = ()> = Result<T, BfsError>;

pub type BfsAllocResult<T = ()> = Result<T, BfsAllocError>;

impl BfsError {
    pub fn msg(&self) -> &'static str {
        match self {
            BfsError::FileNotFound => "File not found",
            BfsError::InvalidCursor => "Invalid cursor",
            BfsError::InvalidWhence(_) => "Invalid whence",
            BfsError::Allocation(_) => "Allocation error",
            BfsError::MediumUnavailable(_) => "Medium unavailable",
            BfsError::InvalidName(msg) => msg,
            BfsError::BadDescriptor(_) => "Bad file descriptor",
            BfsError::InvalidParams(msg) => msg,
            BfsError::Corrupt(msg) => msg,
            BfsError::IO(e) => e.msg(),
        }
    }

    /// Underlying cause, as a message.
    pub fn source_msg(&self) -> Option<&'static str> {
        match self {
            BfsError::Allocation(e) => Some(e.msg()),
            BfsError::MediumUnavailable(e) => Some(e.msg()),
            _ => None,
        }
    }

    /// True for the conditions a caller is expected to branch on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BfsError::FileNotFound
                | BfsError::InvalidCursor
                | BfsError::InvalidWhence(_)
                | BfsError::InvalidName(_)
                | BfsError::Allocation(_)
        )
    }
}

impl fmt::Display for BfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match self {
            BfsError::InvalidWhence(w) => write!(f, " ({w})")?,
            BfsError::BadDescriptor(fd) => write!(f, " ({fd})")?,
            _ => {}
        }
        if let Some(src) = self.source_msg() {
            write!(f, "\n  caused by: {src}")?;
        }
        Ok(())
    }
}

impl fmt::Display for BfsAllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

impl core::error::Error for BfsAllocError {}

impl core::error::Error for BfsError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            BfsError::Allocation(e) => Some(e),
            BfsError::MediumUnavailable(e) | BfsError::IO(e) => Some(e),
            _ => None,
        }
    }
}
