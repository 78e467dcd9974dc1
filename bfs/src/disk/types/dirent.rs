// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::core::errors::{BfsError, BfsResult};
use crate::core::store::Inum;
use crate::disk::constant::*;

/// On-disk directory entry (32 bytes). A zero `name_len` marks a free slot.
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct BfsDirEntry {
    pub inum: u32,
    pub name_len: u8,
    pub reserved: [u8; 3],
    pub name: [u8; BFS_NAME_MAX],
}

const _: () = assert!(core::mem::size_of::<BfsDirEntry>() == BFS_DIRENT_SIZE);

impl BfsDirEntry {
    pub fn new(name: &str, inum: Inum) -> BfsResult<Self> {
        validate_name(name)?;
        let mut raw = [0u8; BFS_NAME_MAX];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self {
            inum,
            name_len: name.len() as u8,
            reserved: [0; 3],
            name: raw,
        })
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.name_len == 0
    }

    /// Stored name bytes.
    #[inline]
    pub fn name_bytes(&self) -> &[u8] {
        let len = (self.name_len as usize).min(BFS_NAME_MAX);
        &self.name[..len]
    }

    #[inline]
    pub fn matches(&self, name: &str) -> bool {
        !self.is_free() && self.name_bytes() == name.as_bytes()
    }
}

/// Checks that `name` can be stored in a directory entry.
pub fn validate_name(name: &str) -> BfsResult {
    if name.is_empty() {
        return Err(BfsError::InvalidName("file name is empty"));
    }
    if name.len() > BFS_NAME_MAX {
        return Err(BfsError::InvalidName("file name longer than 24 bytes"));
    }
    if name.bytes().any(|b| b == b'/' || b == 0) {
        return Err(BfsError::InvalidName("file name contains '/' or NUL"));
    }
    Ok(())
}
