// SPDX-License-Identifier: MIT

use bfsio::{BfsIO, BfsIOExt, BfsIOStructExt};
use log::debug;

use crate::core::errors::{BfsError, BfsIOError, BfsResult};
use crate::core::utils::time_utils::now_unix;
use crate::disk::allocator::BfsAllocator;
use crate::disk::constant::*;
use crate::disk::meta::BfsMeta;
use crate::disk::types::BfsSuperblock;

/// BfsFormatter:
/// - Lays out superblock, inode table, directory and free-block bitmap.
/// - Invalidates block 0 first and writes the superblock last, so a format
///   that fails midway never leaves a medium `mount` would accept.
/// - Quick format leaves the data region untouched (blocks are zeroed on
///   allocation); full format zeroes it too.
pub struct BfsFormatter<'a, IO: BfsIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a BfsMeta,
}

impl<'a, IO: BfsIO + ?Sized> BfsFormatter<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a BfsMeta) -> Self {
        Self { io, meta }
    }

    pub fn format(&mut self, full_format: bool) -> BfsResult {
        self.check_medium()?;
        self.invalidate_superblock()?;
        self.write_inode_table()?;
        self.write_directory()?;
        self.write_bitmap()?;
        if full_format {
            self.zero_data_region()?;
        }
        self.write_superblock()?;
        self.io.flush()?;
        debug!(
            "formatted {} blocks of {} bytes ({} data blocks, {} inodes)",
            self.meta.total_blocks,
            self.meta.block_size,
            self.meta.data_blocks(),
            self.meta.inode_count
        );
        Ok(())
    }

    fn check_medium(&mut self) -> BfsResult {
        let size = self
            .io
            .medium_size()
            .map_err(BfsError::MediumUnavailable)?;
        if size < self.meta.size_bytes() {
            return Err(BfsError::MediumUnavailable(BfsIOError::OutOfBounds));
        }
        Ok(())
    }

    fn invalidate_superblock(&mut self) -> BfsResult {
        let offset = self.meta.block_offset(BFS_SUPERBLOCK_BLOCK);
        self.io.zero_fill(offset, self.meta.block_size())?;
        Ok(())
    }

    fn write_inode_table(&mut self) -> BfsResult {
        let offset = self.meta.block_offset(self.meta.inode_start);
        let len = self.meta.inode_blocks as usize * self.meta.block_size();
        self.io.zero_fill(offset, len)?;
        Ok(())
    }

    fn write_directory(&mut self) -> BfsResult {
        let offset = self.meta.block_offset(self.meta.dir_start);
        let len = self.meta.dir_blocks as usize * self.meta.block_size();
        self.io.zero_fill(offset, len)?;
        Ok(())
    }

    fn write_bitmap(&mut self) -> BfsResult {
        let alloc = BfsAllocator::new(self.meta);
        self.io.write_at(self.meta.bitmap_offset(), alloc.as_bytes())?;
        Ok(())
    }

    fn zero_data_region(&mut self) -> BfsResult {
        for dbn in self.meta.data_start..self.meta.total_blocks {
            self.io
                .zero_fill(self.meta.block_offset(dbn), self.meta.block_size())?;
        }
        Ok(())
    }

    fn write_superblock(&mut self) -> BfsResult {
        let sb = BfsSuperblock::from_meta(self.meta, now_unix());
        self.io
            .write_struct(self.meta.block_offset(BFS_SUPERBLOCK_BLOCK), &sb)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::disk::meta::BfsParams;
    use bfsio::prelude::*;

    #[test]
    fn format_writes_superblock_and_bitmap() {
        let meta = BfsMeta::new(&BfsParams::new(64, 32, 4)).unwrap();
        let mut buf = vec![0xEEu8; meta.size_bytes() as usize];
        let mut io = MemBfsIO::new(&mut buf);

        BfsFormatter::new(&mut io, &meta).format(false).unwrap();

        let sb: BfsSuperblock = io.read_struct(0).unwrap();
        assert!(sb.is_valid_signature());
        assert_eq!(sb.data_start, meta.data_start);

        let mut inode_table = vec![0xAAu8; 64 * 4];
        io.read_at(meta.block_offset(meta.inode_start), &mut inode_table)
            .unwrap();
        assert!(inode_table.iter().all(|&b| b == 0));

        // quick format leaves stale data blocks alone
        let mut data = [0u8; 4];
        io.read_at(meta.block_offset(meta.data_start), &mut data)
            .unwrap();
        assert_eq!(data, [0xEE; 4]);
    }

    #[test]
    fn full_format_zeroes_data() {
        let meta = BfsMeta::new(&BfsParams::new(64, 32, 4)).unwrap();
        let mut buf = vec![0xEEu8; meta.size_bytes() as usize];
        let mut io = MemBfsIO::new(&mut buf);

        BfsFormatter::new(&mut io, &meta).format(true).unwrap();
        drop(io);

        let data_off = meta.block_offset(meta.data_start) as usize;
        assert!(buf[data_off..].iter().all(|&b| b == 0));
    }

    #[test]
    fn medium_too_small() {
        let meta = BfsMeta::new(&BfsParams::new(64, 32, 4)).unwrap();
        let mut buf = vec![0u8; 1024];
        let mut io = MemBfsIO::new(&mut buf);

        let err = BfsFormatter::new(&mut io, &meta).format(false).unwrap_err();
        assert_eq!(err, BfsError::MediumUnavailable(BfsIOError::OutOfBounds));
    }
}
