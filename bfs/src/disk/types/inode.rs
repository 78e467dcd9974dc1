// SPDX-License-Identifier: MIT
//! BFS inode: size plus a direct/indirect block map.

use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::core::store::Dbn;
use crate::disk::constant::*;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BfsInodeFlags: u32 {
        const IN_USE = 0x0000_0001;
    }
}

/// On-disk inode (64 bytes).
///
/// The first `BFS_NUM_DIRECT` blocks are mapped in place; the rest live in a
/// single indirect block of little-endian DBNs.
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct BfsInode {
    /// File size in bytes.
    pub size: u64,
    /// Last modification, seconds since the Unix epoch.
    pub mtime: i64,
    pub flags: u32,
    /// Blocks currently mapped (data blocks only, the indirect block is not counted).
    pub block_count: u32,
    pub direct: [u32; BFS_NUM_DIRECT],
    pub indirect: u32,
}

const _: () = assert!(core::mem::size_of::<BfsInode>() == BFS_INODE_SIZE);

impl BfsInode {
    pub fn new_in_use(mtime: i64) -> Self {
        Self {
            size: 0,
            mtime,
            flags: BfsInodeFlags::IN_USE.bits(),
            block_count: 0,
            direct: [BFS_NO_BLOCK; BFS_NUM_DIRECT],
            indirect: BFS_NO_BLOCK,
        }
    }

    #[inline]
    pub fn flags(&self) -> BfsInodeFlags {
        BfsInodeFlags::from_bits_truncate(self.flags)
    }

    #[inline]
    pub fn with_flags(mut self, flags: BfsInodeFlags) -> Self {
        self.flags = flags.bits();
        self
    }

    #[inline]
    pub fn is_in_use(&self) -> bool {
        self.flags().contains(BfsInodeFlags::IN_USE)
    }

    /// Direct mapping for `fbn`, if it falls in the direct range.
    #[inline]
    pub fn direct_block(&self, fbn: u32) -> Option<Dbn> {
        self.direct.get(fbn as usize).copied()
    }

    /// Drops the whole block map, keeping the identity.
    pub fn clear_blocks(&mut self) {
        self.size = 0;
        self.block_count = 0;
        self.direct = [BFS_NO_BLOCK; BFS_NUM_DIRECT];
        self.indirect = BFS_NO_BLOCK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::FromZeros;

    #[test]
    fn layout_roundtrip() {
        let mut inode = BfsInode::new_in_use(1_700_000_000);
        inode.size = 600;
        inode.block_count = 2;
        inode.direct[0] = 8;
        inode.direct[1] = 9;

        let bytes = inode.as_bytes();
        assert_eq!(bytes.len(), BFS_INODE_SIZE);
        assert_eq!(&bytes[0..8], &600u64.to_le_bytes());

        let back = BfsInode::read_from_bytes(bytes).unwrap();
        assert!(back.is_in_use());
        assert_eq!(back.direct_block(1), Some(9));
        assert_eq!(back.direct_block(BFS_NUM_DIRECT as u32), None);
    }

    #[test]
    fn zeroed_inode_is_free() {
        let inode = BfsInode::new_zeroed();
        assert!(!inode.is_in_use());
        let freed = BfsInode::new_in_use(0).with_flags(BfsInodeFlags::empty());
        assert!(!freed.is_in_use());
    }
}
