// SPDX-License-Identifier: MIT

use crate::core::errors::BfsResult;

/// Identifier of a file's metadata record inside the store.
pub type Inum = u32;

/// Physical block number on the medium.
pub type Dbn = u32;

/// Logical block index inside a file (0-based).
pub type Fbn = u32;

/// Block-granular storage collaborator consumed by the file engine.
///
/// The store owns identifiers, maps logical blocks to physical ones, grows
/// allocations and moves whole blocks. It never calls back into the engine.
/// Buffers passed to `read_block`/`write_block` are exactly `block_size()`
/// bytes long.
pub trait BlockStore {
    /// Size of one block in bytes.
    fn block_size(&self) -> usize;

    /// Resolves `name` to its identifier.
    ///
    /// Returns `BfsError::FileNotFound` if the name is absent.
    fn lookup(&mut self, name: &str) -> BfsResult<Inum>;

    /// Creates `name`, or truncates it to zero bytes if it already exists.
    ///
    /// Returns `BfsError::Allocation(OutOfInodes)` when the store is full.
    fn create_or_truncate(&mut self, name: &str) -> BfsResult<Inum>;

    /// Maps logical block `fbn` of `inum` to a physical block.
    ///
    /// Must succeed for every `fbn < ceil(size / block_size)`.
    fn resolve_block(&mut self, inum: Inum, fbn: Fbn) -> BfsResult<Dbn>;

    /// Grows the allocation of `inum` to at least `block_count` blocks.
    ///
    /// Either every new block is allocated or nothing changes.
    fn extend(&mut self, inum: Inum, block_count: u32) -> BfsResult;

    /// File size in bytes.
    fn size(&mut self, inum: Inum) -> BfsResult<u64>;

    /// Records a new file size in bytes.
    fn set_size(&mut self, inum: Inum, size: u64) -> BfsResult;

    /// Reads one whole physical block.
    fn read_block(&mut self, dbn: Dbn, buf: &mut [u8]) -> BfsResult;

    /// Writes one whole physical block.
    fn write_block(&mut self, dbn: Dbn, buf: &[u8]) -> BfsResult;

    /// Notified when a handle to `inum` is opened.
    fn acquire(&mut self, _inum: Inum) {}

    /// Notified when a handle to `inum` is closed.
    fn release(&mut self, _inum: Inum) {}

    /// Flushes buffered state to the medium.
    fn flush(&mut self) -> BfsResult {
        Ok(())
    }
}

impl<S: BlockStore + ?Sized> BlockStore for &mut S {
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn lookup(&mut self, name: &str) -> BfsResult<Inum> {
        (**self).lookup(name)
    }

    fn create_or_truncate(&mut self, name: &str) -> BfsResult<Inum> {
        (**self).create_or_truncate(name)
    }

    fn resolve_block(&mut self, inum: Inum, fbn: Fbn) -> BfsResult<Dbn> {
        (**self).resolve_block(inum, fbn)
    }

    fn extend(&mut self, inum: Inum, block_count: u32) -> BfsResult {
        (**self).extend(inum, block_count)
    }

    fn size(&mut self, inum: Inum) -> BfsResult<u64> {
        (**self).size(inum)
    }

    fn set_size(&mut self, inum: Inum, size: u64) -> BfsResult {
        (**self).set_size(inum, size)
    }

    fn read_block(&mut self, dbn: Dbn, buf: &mut [u8]) -> BfsResult {
        (**self).read_block(dbn, buf)
    }

    fn write_block(&mut self, dbn: Dbn, buf: &[u8]) -> BfsResult {
        (**self).write_block(dbn, buf)
    }

    fn acquire(&mut self, inum: Inum) {
        (**self).acquire(inum)
    }

    fn release(&mut self, inum: Inum) {
        (**self).release(inum)
    }

    fn flush(&mut self) -> BfsResult {
        (**self).flush()
    }
}
