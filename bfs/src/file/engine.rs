// SPDX-License-Identifier: MIT

//! Byte-range I/O on top of a [`BlockStore`].
//!
//! A byte range is split into per-block spans. Spans covering a whole block
//! move straight between the caller buffer and the store; partial spans go
//! through a one-block staging buffer (read-modify-write on the write path).

use alloc::vec;
use alloc::vec::Vec;

use log::trace;

use crate::core::errors::{BfsAllocError, BfsError, BfsResult};
use crate::core::store::{BlockStore, Fbn};
use crate::file::descriptor::OpenFile;

/// Part of a byte range that falls inside one logical block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub fbn: Fbn,
    /// Offset of the span inside the block.
    pub offset: usize,
    pub len: usize,
}

impl BlockSpan {
    #[inline]
    pub fn is_whole(&self, block_size: usize) -> bool {
        self.offset == 0 && self.len == block_size
    }
}

/// Blocks needed to hold `size` bytes (`0` for an empty file).
#[inline]
pub fn blocks_for(size: u64, block_size: usize) -> u64 {
    size.div_ceil(block_size as u64)
}

/// Splits `[offset, offset + len)` into block spans, in FBN order.
pub fn block_spans(mut offset: u64, len: usize, block_size: usize) -> BfsResult<Vec<BlockSpan>> {
    let bs = block_size as u64;
    let mut remaining = len as u64;
    let mut out = Vec::new();

    while remaining > 0 {
        let fbn = Fbn::try_from(offset / bs).map_err(|_| BfsError::InvalidCursor)?;
        let in_block = offset % bs;
        let take = (bs - in_block).min(remaining);
        out.push(BlockSpan {
            fbn,
            offset: in_block as usize,
            len: take as usize,
        });
        offset += take;
        remaining -= take;
    }
    Ok(out)
}

/// Reads up to `buf.len()` bytes at the cursor of `file`, clamped to the
/// file size. Returns the number of bytes read; `0` at or past EOF.
pub fn read_at<S: BlockStore + ?Sized>(
    store: &mut S,
    file: &mut OpenFile,
    buf: &mut [u8],
) -> BfsResult<usize> {
    if buf.is_empty() {
        return Ok(0);
    }

    let size = store.size(file.inum)?;
    let available = size.saturating_sub(file.cursor);
    let count = (buf.len() as u64).min(available) as usize;
    if count == 0 {
        return Ok(0);
    }

    let bs = store.block_size();
    let mut done = 0;
    for span in block_spans(file.cursor, count, bs)? {
        let dbn = store.resolve_block(file.inum, span.fbn)?;
        let dst = &mut buf[done..done + span.len];

        if span.is_whole(bs) {
            store.read_block(dbn, dst)?;
        } else {
            let mut block = vec![0u8; bs];
            store.read_block(dbn, &mut block)?;
            dst.copy_from_slice(&block[span.offset..span.offset + span.len]);
        }
        done += span.len;
    }

    trace!("inode {}: read {count} bytes at {}", file.inum, file.cursor);
    file.cursor += count as u64;
    Ok(count)
}

/// Writes all of `data` at the cursor of `file`, growing the file first if
/// the write ends past its size. Returns `data.len()`.
///
/// Growth is requested from the store before any block is touched, so an
/// allocation failure leaves size, cursor and contents unchanged.
pub fn write_at<S: BlockStore + ?Sized>(
    store: &mut S,
    file: &mut OpenFile,
    data: &[u8],
) -> BfsResult<usize> {
    if data.is_empty() {
        return Ok(0);
    }

    let bs = store.block_size();
    let n = data.len() as u64;
    let new_size = file.cursor.checked_add(n).ok_or(BfsError::InvalidCursor)?;

    let size = store.size(file.inum)?;
    if new_size > size {
        let cur_blocks = blocks_for(size, bs);
        if cur_blocks * (bs as u64) < new_size {
            let wanted = u32::try_from(blocks_for(new_size, bs))
                .map_err(|_| BfsAllocError::FileTooLarge)?;
            store.extend(file.inum, wanted)?;
        }
        store.set_size(file.inum, new_size)?;
    }

    let mut done = 0;
    for span in block_spans(file.cursor, data.len(), bs)? {
        let dbn = store.resolve_block(file.inum, span.fbn)?;
        let src = &data[done..done + span.len];

        if span.is_whole(bs) {
            store.write_block(dbn, src)?;
        } else {
            let mut block = vec![0u8; bs];
            store.read_block(dbn, &mut block)?;
            block[span.offset..span.offset + span.len].copy_from_slice(src);
            store.write_block(dbn, &block)?;
        }
        done += span.len;
    }

    trace!("inode {}: wrote {n} bytes at {}", file.inum, file.cursor);
    file.cursor = new_size;
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{Dbn, Inum};

    const B: usize = 512;

    /// Single-file store that counts block transfers.
    struct CountingStore {
        blocks: Vec<Vec<u8>>,
        map: Vec<Dbn>,
        size: u64,
        capacity: usize,
        reads: usize,
        writes: usize,
        resolved: Vec<Fbn>,
    }

    impl CountingStore {
        fn new(capacity: usize) -> Self {
            Self {
                blocks: Vec::new(),
                map: Vec::new(),
                size: 0,
                capacity,
                reads: 0,
                writes: 0,
                resolved: Vec::new(),
            }
        }

        fn reset_counters(&mut self) {
            self.reads = 0;
            self.writes = 0;
            self.resolved.clear();
        }
    }

    impl BlockStore for CountingStore {
        fn block_size(&self) -> usize {
            B
        }

        fn lookup(&mut self, _name: &str) -> BfsResult<Inum> {
            Ok(0)
        }

        fn create_or_truncate(&mut self, _name: &str) -> BfsResult<Inum> {
            self.map.clear();
            self.size = 0;
            Ok(0)
        }

        fn resolve_block(&mut self, _inum: Inum, fbn: Fbn) -> BfsResult<Dbn> {
            self.resolved.push(fbn);
            self.map
                .get(fbn as usize)
                .copied()
                .ok_or(BfsError::Corrupt("unmapped block"))
        }

        fn extend(&mut self, _inum: Inum, block_count: u32) -> BfsResult {
            let wanted = block_count as usize;
            if wanted <= self.map.len() {
                return Ok(());
            }
            if wanted > self.capacity {
                return Err(BfsAllocError::OutOfBlocks.into());
            }
            while self.map.len() < wanted {
                self.map.push(self.blocks.len() as Dbn);
                self.blocks.push(vec![0u8; B]);
            }
            Ok(())
        }

        fn size(&mut self, _inum: Inum) -> BfsResult<u64> {
            Ok(self.size)
        }

        fn set_size(&mut self, _inum: Inum, size: u64) -> BfsResult {
            self.size = size;
            Ok(())
        }

        fn read_block(&mut self, dbn: Dbn, buf: &mut [u8]) -> BfsResult {
            assert_eq!(buf.len(), B);
            self.reads += 1;
            buf.copy_from_slice(&self.blocks[dbn as usize]);
            Ok(())
        }

        fn write_block(&mut self, dbn: Dbn, buf: &[u8]) -> BfsResult {
            assert_eq!(buf.len(), B);
            self.writes += 1;
            self.blocks[dbn as usize].copy_from_slice(buf);
            Ok(())
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn spans_split_on_block_boundaries() {
        let spans = block_spans(510, 10, B).unwrap();
        assert_eq!(
            spans,
            vec![
                BlockSpan { fbn: 0, offset: 510, len: 2 },
                BlockSpan { fbn: 1, offset: 0, len: 8 },
            ]
        );

        let spans = block_spans(100, 3 * B, B).unwrap();
        assert_eq!(spans.len(), 4);
        assert!(spans[1].is_whole(B) && spans[2].is_whole(B));
        assert_eq!(spans[3].len, 100);

        assert!(block_spans(0, 0, B).unwrap().is_empty());
        assert_eq!(blocks_for(0, B), 0);
        assert_eq!(blocks_for(512, B), 1);
        assert_eq!(blocks_for(513, B), 2);
    }

    #[test]
    fn write_grows_file() {
        let mut store = CountingStore::new(16);
        let mut file = OpenFile::new(0);

        assert_eq!(write_at(&mut store, &mut file, &pattern(600)).unwrap(), 600);
        assert_eq!(store.size, 600);
        assert_eq!(store.map.len(), 2);
        assert_eq!(file.cursor, 600);

        file.cursor = 0;
        let mut back = vec![0u8; 600];
        assert_eq!(read_at(&mut store, &mut file, &mut back).unwrap(), 600);
        assert_eq!(back, pattern(600));
    }

    #[test]
    fn write_across_boundary() {
        let mut store = CountingStore::new(16);
        let mut file = OpenFile::new(0);
        write_at(&mut store, &mut file, &pattern(600)).unwrap();

        file.cursor = 510;
        write_at(&mut store, &mut file, b"0123456789").unwrap();
        assert_eq!(store.size, 600);

        file.cursor = 510;
        let mut back = [0u8; 10];
        read_at(&mut store, &mut file, &mut back).unwrap();
        assert_eq!(&back, b"0123456789");

        // neighbours untouched
        file.cursor = 500;
        let mut around = [0u8; 10];
        read_at(&mut store, &mut file, &mut around).unwrap();
        assert_eq!(&around[..], &pattern(600)[500..510]);
    }

    #[test]
    fn whole_blocks_skip_pre_read() {
        let mut store = CountingStore::new(16);
        let mut file = OpenFile::new(0);

        write_at(&mut store, &mut file, &pattern(2 * B)).unwrap();
        assert_eq!(store.reads, 0);
        assert_eq!(store.writes, 2);

        store.reset_counters();
        file.cursor = 100;
        write_at(&mut store, &mut file, &pattern(3 * B)).unwrap();
        // only the partial first and last blocks are fetched
        assert_eq!(store.reads, 2);
        assert_eq!(store.writes, 4);
    }

    #[test]
    fn read_clamps_at_eof() {
        let mut store = CountingStore::new(16);
        let mut file = OpenFile::new(0);
        write_at(&mut store, &mut file, &pattern(2 * B)).unwrap();

        store.reset_counters();
        file.cursor = 0;
        let mut buf = vec![0u8; 4 * B];
        assert_eq!(read_at(&mut store, &mut file, &mut buf).unwrap(), 2 * B);
        // aligned end never touches a block past the allocation
        assert_eq!(store.resolved, vec![0, 1]);
        assert_eq!(file.cursor, 2 * B as u64);

        store.reset_counters();
        assert_eq!(read_at(&mut store, &mut file, &mut buf).unwrap(), 0);
        file.cursor = 10_000;
        assert_eq!(read_at(&mut store, &mut file, &mut buf).unwrap(), 0);
        assert_eq!(file.cursor, 10_000);
        assert!(store.resolved.is_empty());
    }

    #[test]
    fn empty_transfers_are_noops() {
        let mut store = CountingStore::new(16);
        let mut file = OpenFile::new(0);
        file.cursor = 42;

        assert_eq!(write_at(&mut store, &mut file, &[]).unwrap(), 0);
        assert_eq!(read_at(&mut store, &mut file, &mut []).unwrap(), 0);
        assert_eq!(store.size, 0);
        assert_eq!(file.cursor, 42);
        assert!(store.map.is_empty());
    }

    #[test]
    fn gap_reads_zero() {
        let mut store = CountingStore::new(16);
        let mut file = OpenFile::new(0);

        file.cursor = 1000;
        write_at(&mut store, &mut file, b"end").unwrap();
        assert_eq!(store.size, 1003);

        file.cursor = 0;
        let mut buf = vec![0xFFu8; 1003];
        read_at(&mut store, &mut file, &mut buf).unwrap();
        assert!(buf[..1000].iter().all(|&b| b == 0));
        assert_eq!(&buf[1000..], b"end");
    }

    #[test]
    fn allocation_failure_changes_nothing() {
        let mut store = CountingStore::new(2);
        let mut file = OpenFile::new(0);
        write_at(&mut store, &mut file, &pattern(B)).unwrap();
        store.reset_counters();

        let err = write_at(&mut store, &mut file, &pattern(2 * B)).unwrap_err();
        assert_eq!(err, BfsError::Allocation(BfsAllocError::OutOfBlocks));
        assert_eq!(store.size, B as u64);
        assert_eq!(file.cursor, B as u64);
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn growth_within_last_block_skips_extend() {
        let mut store = CountingStore::new(1);
        let mut file = OpenFile::new(0);
        write_at(&mut store, &mut file, &pattern(100)).unwrap();
        write_at(&mut store, &mut file, &pattern(412)).unwrap();
        assert_eq!(store.size, B as u64);
        assert_eq!(store.map.len(), 1);
    }

    #[test]
    fn cursor_overflow() {
        let mut store = CountingStore::new(1);
        let mut file = OpenFile::new(0);
        file.cursor = u64::MAX;
        assert_eq!(
            write_at(&mut store, &mut file, b"x"),
            Err(BfsError::InvalidCursor)
        );
    }
}
