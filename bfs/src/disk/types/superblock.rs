// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::disk::constant::*;
use crate::disk::meta::BfsMeta;

/// On-disk superblock, stored at the start of block 0.
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct BfsSuperblock {
    /// Format time, seconds since the Unix epoch (0 when unknown).
    pub created_at: i64,
    pub magic: u32,
    pub version: u32,
    pub block_size: u32,
    pub total_blocks: u32,
    pub inode_count: u32,
    pub inode_start: u32,
    pub dir_start: u32,
    pub bitmap_start: u32,
    pub data_start: u32,
    pub reserved: u32,
}

impl BfsSuperblock {
    pub fn from_meta(meta: &BfsMeta, created_at: i64) -> Self {
        Self {
            created_at,
            magic: BFS_MAGIC,
            version: BFS_VERSION,
            block_size: meta.block_size,
            total_blocks: meta.total_blocks,
            inode_count: meta.inode_count,
            inode_start: meta.inode_start,
            dir_start: meta.dir_start,
            bitmap_start: meta.bitmap_start,
            data_start: meta.data_start,
            reserved: 0,
        }
    }

    #[inline]
    pub fn is_valid_signature(&self) -> bool {
        self.magic == BFS_MAGIC && self.version == BFS_VERSION
    }
}
