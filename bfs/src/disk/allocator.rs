// SPDX-License-Identifier: MIT

use alloc::vec;
use alloc::vec::Vec;

use crate::core::errors::{BfsAllocError, BfsAllocResult, BfsError, BfsResult};
use crate::core::store::Dbn;
use crate::core::utils::bitmap::BitmapOps;
use crate::disk::meta::BfsMeta;

/// In-memory copy of the free-block bitmap.
///
/// Metadata blocks `[0, data_start)` are permanently marked used. The owner
/// persists `as_bytes()` after every mutation.
#[derive(Debug, Clone)]
pub struct BfsAllocator {
    bitmap: Vec<u8>,
    data_start: u32,
    total_blocks: u32,
}

impl BfsAllocator {
    /// Fresh bitmap for a newly formatted medium.
    pub fn new(meta: &BfsMeta) -> Self {
        let mut bitmap = vec![0u8; meta.bitmap_len()];
        for dbn in 0..meta.data_start {
            bitmap.set_bit(dbn as usize, true);
        }
        Self {
            bitmap,
            data_start: meta.data_start,
            total_blocks: meta.total_blocks,
        }
    }

    /// Bitmap loaded from disk.
    pub fn from_bytes(meta: &BfsMeta, bytes: Vec<u8>) -> BfsResult<Self> {
        if bytes.len() != meta.bitmap_len() {
            return Err(BfsError::Corrupt("bitmap length does not match geometry"));
        }
        let reserved = meta.data_start as usize;
        if bytes.count_ones_in_range(0, reserved) != reserved {
            return Err(BfsError::Corrupt("metadata blocks not marked used in bitmap"));
        }
        Ok(Self {
            bitmap: bytes,
            data_start: meta.data_start,
            total_blocks: meta.total_blocks,
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bitmap
    }

    pub fn free_blocks(&self) -> usize {
        self.bitmap
            .count_zeros_in_range(self.data_start as usize, self.total_blocks as usize)
    }

    pub fn used_blocks(&self) -> usize {
        self.bitmap
            .count_ones_in_range(self.data_start as usize, self.total_blocks as usize)
    }

    #[inline]
    pub fn is_allocated(&self, dbn: Dbn) -> bool {
        self.bitmap.get_bit(dbn as usize)
    }

    /// Allocates `count` data blocks, lowest first. All or nothing.
    pub fn allocate(&mut self, count: usize) -> BfsAllocResult<Vec<Dbn>> {
        if count > self.free_blocks() {
            return Err(BfsAllocError::OutOfBlocks);
        }

        let mut out = Vec::with_capacity(count);
        let mut from = self.data_start as usize;
        for _ in 0..count {
            let dbn = self
                .bitmap
                .find_first_zero(from, self.total_blocks as usize)
                .ok_or(BfsAllocError::OutOfBlocks)?;
            self.bitmap.set_bit(dbn, true);
            out.push(dbn as Dbn);
            from = dbn + 1;
        }
        Ok(out)
    }

    /// Returns a data block to the pool. Metadata blocks are never freed.
    pub fn free(&mut self, dbn: Dbn) {
        if dbn >= self.data_start && dbn < self.total_blocks {
            self.bitmap.set_bit(dbn as usize, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::meta::BfsParams;

    fn small_meta() -> BfsMeta {
        // 64 B blocks, 4 inodes: data starts at block 8
        BfsMeta::new(&BfsParams::new(64, 16, 4)).unwrap()
    }

    #[test]
    fn fresh_bitmap_reserves_metadata() {
        let meta = small_meta();
        let alloc = BfsAllocator::new(&meta);
        assert_eq!(meta.data_start, 8);
        assert!(alloc.is_allocated(0));
        assert!(alloc.is_allocated(7));
        assert!(!alloc.is_allocated(8));
        assert_eq!(alloc.free_blocks(), 8);
    }

    #[test]
    fn allocate_is_all_or_nothing() {
        let meta = small_meta();
        let mut alloc = BfsAllocator::new(&meta);

        assert_eq!(alloc.allocate(3).unwrap(), vec![8, 9, 10]);
        assert_eq!(alloc.allocate(6), Err(BfsAllocError::OutOfBlocks));
        assert_eq!(alloc.free_blocks(), 5);

        alloc.free(9);
        alloc.free(2);
        assert!(alloc.is_allocated(2));
        assert_eq!(alloc.allocate(1).unwrap(), vec![9]);
    }

    #[test]
    fn from_bytes_checks_reserved_region() {
        let meta = small_meta();
        let alloc = BfsAllocator::new(&meta);
        assert!(BfsAllocator::from_bytes(&meta, alloc.as_bytes().to_vec()).is_ok());

        let blank = vec![0u8; meta.bitmap_len()];
        assert!(matches!(
            BfsAllocator::from_bytes(&meta, blank),
            Err(BfsError::Corrupt(_))
        ));
    }
}
