// SPDX-License-Identifier: MIT

// === Superblock ===

/// "BFS1", little-endian.
pub const BFS_MAGIC: u32 = 0x3153_4642;
pub const BFS_VERSION: u32 = 1;

pub const BFS_SUPERBLOCK_BLOCK: u32 = 0;

// === Block Size ===

pub const BFS_DEFAULT_BLOCK_SIZE: u32 = 512;
pub const BFS_MIN_BLOCK_SIZE: u32 = 64;
pub const BFS_MAX_BLOCK_SIZE: u32 = 65536;

// === Volume ===

pub const BFS_DEFAULT_TOTAL_BLOCKS: u32 = 4096;
pub const BFS_DEFAULT_INODE_COUNT: u32 = 32;

// === Inode ===

pub const BFS_INODE_SIZE: usize = 64;
pub const BFS_NUM_DIRECT: usize = 9;
pub const BFS_DBN_SIZE: usize = 4;
/// Unused slot in a block map. Block 0 is the superblock, never a data block.
pub const BFS_NO_BLOCK: u32 = 0;

// === Directory ===

pub const BFS_DIRENT_SIZE: usize = 32;
pub const BFS_NAME_MAX: usize = 24;
