// SPDX-License-Identifier: MIT

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::core::errors::{BfsError, BfsResult};
use crate::core::store::Inum;

/// Raw seek mode values.
pub const SEEK_SET: i32 = 0;
pub const SEEK_CUR: i32 = 1;
pub const SEEK_END: i32 = 2;

/// Caller-visible handle to an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fd(pub u32);

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd {}", self.0)
    }
}

/// Origin of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// From the start of the file.
    Set,
    /// From the current cursor.
    Current,
    /// From the end of the file.
    End,
}

impl TryFrom<i32> for Whence {
    type Error = BfsError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            SEEK_SET => Ok(Whence::Set),
            SEEK_CUR => Ok(Whence::Current),
            SEEK_END => Ok(Whence::End),
            other => Err(BfsError::InvalidWhence(other)),
        }
    }
}

impl From<Whence> for i32 {
    fn from(w: Whence) -> Self {
        match w {
            Whence::Set => SEEK_SET,
            Whence::Current => SEEK_CUR,
            Whence::End => SEEK_END,
        }
    }
}

/// Computes a new cursor. Negative offsets are rejected; the result is not
/// range-checked against `size`.
pub fn seek_target(cursor: u64, size: u64, offset: i64, whence: Whence) -> BfsResult<u64> {
    let delta = u64::try_from(offset).map_err(|_| BfsError::InvalidCursor)?;
    let base = match whence {
        Whence::Set => 0,
        Whence::Current => cursor,
        Whence::End => size,
    };
    base.checked_add(delta).ok_or(BfsError::InvalidCursor)
}

/// One open-file-table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFile {
    pub inum: Inum,
    pub cursor: u64,
}

impl OpenFile {
    pub fn new(inum: Inum) -> Self {
        Self { inum, cursor: 0 }
    }
}

/// Handle → (file, cursor) table. Handles are reused lowest-first.
#[derive(Debug, Default)]
pub struct OpenFileTable {
    slots: BTreeMap<Fd, OpenFile>,
}

impl OpenFileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `inum` under the lowest free handle.
    pub fn insert(&mut self, inum: Inum) -> Fd {
        let mut next = 0u32;
        for fd in self.slots.keys() {
            if fd.0 != next {
                break;
            }
            next += 1;
        }
        let fd = Fd(next);
        self.slots.insert(fd, OpenFile::new(inum));
        fd
    }

    pub fn get(&self, fd: Fd) -> BfsResult<&OpenFile> {
        self.slots.get(&fd).ok_or(BfsError::BadDescriptor(fd))
    }

    pub fn get_mut(&mut self, fd: Fd) -> BfsResult<&mut OpenFile> {
        self.slots.get_mut(&fd).ok_or(BfsError::BadDescriptor(fd))
    }

    pub fn remove(&mut self, fd: Fd) -> BfsResult<OpenFile> {
        self.slots.remove(&fd).ok_or(BfsError::BadDescriptor(fd))
    }

    /// Empties the table, returning every open slot.
    pub fn drain(&mut self) -> Vec<(Fd, OpenFile)> {
        core::mem::take(&mut self.slots).into_iter().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
