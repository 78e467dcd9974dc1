// SPDX-License-Identifier: MIT

use crate::core::errors::{BfsError, BfsResult};
use crate::core::store::{Dbn, Inum};
use crate::disk::constant::*;
use crate::disk::types::BfsSuperblock;

/// User-facing geometry knobs for `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BfsParams {
    /// Block size in bytes (power of two).
    pub block_size: u32,
    /// Blocks on the medium, metadata included.
    pub total_blocks: u32,
    /// Maximum number of files.
    pub inode_count: u32,
}

impl Default for BfsParams {
    fn default() -> Self {
        Self {
            block_size: BFS_DEFAULT_BLOCK_SIZE,
            total_blocks: BFS_DEFAULT_TOTAL_BLOCKS,
            inode_count: BFS_DEFAULT_INODE_COUNT,
        }
    }
}

impl BfsParams {
    pub fn new(block_size: u32, total_blocks: u32, inode_count: u32) -> Self {
        Self {
            block_size,
            total_blocks,
            inode_count,
        }
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_total_blocks(mut self, total_blocks: u32) -> Self {
        self.total_blocks = total_blocks;
        self
    }

    pub fn with_inode_count(mut self, inode_count: u32) -> Self {
        self.inode_count = inode_count;
        self
    }

    /// Size of the medium these parameters describe.
    pub fn size_bytes(&self) -> u64 {
        self.block_size as u64 * self.total_blocks as u64
    }
}

/// Resolved on-disk geometry.
///
/// ```text
/// | super | inodes ... | directory ... | bitmap ... | data ...              |
///   0       inode_start  dir_start       bitmap_start data_start  total_blocks
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsMeta {
    pub block_size: u32,
    pub total_blocks: u32,
    pub inode_count: u32,

    pub inode_start: u32,
    pub inode_blocks: u32,
    pub dir_start: u32,
    pub dir_blocks: u32,
    pub bitmap_start: u32,
    pub bitmap_blocks: u32,
    pub data_start: u32,
}

impl BfsMeta {
    pub fn new(params: &BfsParams) -> BfsResult<Self> {
        let BfsParams {
            block_size,
            total_blocks,
            inode_count,
        } = *params;

        if !block_size.is_power_of_two()
            || !(BFS_MIN_BLOCK_SIZE..=BFS_MAX_BLOCK_SIZE).contains(&block_size)
        {
            return Err(BfsError::InvalidParams(
                "block size must be a power of two between 64 and 65536",
            ));
        }
        if inode_count == 0 {
            return Err(BfsError::InvalidParams("inode count must be at least 1"));
        }

        let bs = block_size as u64;
        let inode_blocks = (inode_count as u64 * BFS_INODE_SIZE as u64).div_ceil(bs);
        let dir_blocks = (inode_count as u64 * BFS_DIRENT_SIZE as u64).div_ceil(bs);
        let bitmap_blocks = (total_blocks as u64).div_ceil(bs * 8);

        let inode_start = BFS_SUPERBLOCK_BLOCK as u64 + 1;
        let dir_start = inode_start + inode_blocks;
        let bitmap_start = dir_start + dir_blocks;
        let data_start = bitmap_start + bitmap_blocks;

        if data_start >= total_blocks as u64 {
            return Err(BfsError::InvalidParams(
                "block count leaves no room for data blocks",
            ));
        }

        // data_start < total_blocks, so every region fits in u32
        Ok(Self {
            block_size,
            total_blocks,
            inode_count,
            inode_start: inode_start as u32,
            inode_blocks: inode_blocks as u32,
            dir_start: dir_start as u32,
            dir_blocks: dir_blocks as u32,
            bitmap_start: bitmap_start as u32,
            bitmap_blocks: bitmap_blocks as u32,
            data_start: data_start as u32,
        })
    }

    /// Rebuilds geometry from a superblock and checks it against the stored layout.
    pub fn from_superblock(sb: &BfsSuperblock) -> BfsResult<Self> {
        let params = BfsParams::new(sb.block_size, sb.total_blocks, sb.inode_count);
        let meta = Self::new(&params).map_err(|_| BfsError::Corrupt("superblock geometry is invalid"))?;

        let stored = (
            sb.inode_start,
            sb.dir_start,
            sb.bitmap_start,
            sb.data_start,
        );
        let expected = (
            meta.inode_start,
            meta.dir_start,
            meta.bitmap_start,
            meta.data_start,
        );
        if stored != expected {
            return Err(BfsError::Corrupt("superblock layout does not match geometry"));
        }
        Ok(meta)
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size as usize
    }

    #[inline]
    pub fn block_offset(&self, dbn: Dbn) -> u64 {
        dbn as u64 * self.block_size as u64
    }

    #[inline]
    pub fn inode_offset(&self, inum: Inum) -> u64 {
        self.block_offset(self.inode_start) + inum as u64 * BFS_INODE_SIZE as u64
    }

    #[inline]
    pub fn dirent_offset(&self, slot: u32) -> u64 {
        self.block_offset(self.dir_start) + slot as u64 * BFS_DIRENT_SIZE as u64
    }

    #[inline]
    pub fn bitmap_offset(&self) -> u64 {
        self.block_offset(self.bitmap_start)
    }

    /// Bytes in the bitmap region (padded to whole blocks).
    #[inline]
    pub fn bitmap_len(&self) -> usize {
        self.bitmap_blocks as usize * self.block_size()
    }

    /// Number of blocks available to file data.
    #[inline]
    pub fn data_blocks(&self) -> u32 {
        self.total_blocks - self.data_start
    }

    /// DBN slots held by one indirect block.
    #[inline]
    pub fn dbns_per_block(&self) -> usize {
        self.block_size() / BFS_DBN_SIZE
    }

    /// Largest block count a single inode can map.
    #[inline]
    pub fn max_file_blocks(&self) -> u32 {
        (BFS_NUM_DIRECT + self.dbns_per_block()) as u32
    }

    #[inline]
    pub fn is_data_block(&self, dbn: Dbn) -> bool {
        (self.data_start..self.total_blocks).contains(&dbn)
    }

    #[inline]
    pub fn is_valid_inum(&self, inum: Inum) -> bool {
        inum < self.inode_count
    }

    /// Total size in bytes of the formatted medium.
    #[inline]
    pub fn size_bytes(&self) -> u64 {
        self.block_offset(self.total_blocks)
    }
}
