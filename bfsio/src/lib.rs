// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

// Core modules
pub mod errors;
#[macro_use]
mod macros;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod host;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::BfsIO;
    pub use super::BfsIOExt;
    pub use super::BfsIOSetLen;
    pub use super::BfsIOStructExt;
    pub use super::errors::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemBfsIO;

    #[cfg(feature = "std")]
    pub use super::host::StdBfsIO;
}

pub use errors::*;

// Constants

/// Stack scratch size for `zero_fill` and `read_struct`.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Byte-addressed medium.
///
/// The block store sits on top of this and only ever issues whole-block or
/// whole-record transfers, but the trait itself accepts arbitrary offsets.
/// Implementations may target RAM, host files, raw devices, etc.
pub trait BfsIO {
    /// Writes `data` at absolute `offset`.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BfsIOResult;

    /// Reads `buf.len()` bytes into `buf` from absolute `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BfsIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> BfsIOResult;

    /// Current size of the medium in bytes.
    fn medium_size(&mut self) -> BfsIOResult<u64>;
}

impl<T: BfsIO + ?Sized> BfsIO for &mut T {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BfsIOResult {
        (**self).write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BfsIOResult {
        (**self).read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> BfsIOResult {
        (**self).flush()
    }

    #[inline]
    fn medium_size(&mut self) -> BfsIOResult<u64> {
        (**self).medium_size()
    }
}

/// Extension helpers for `BfsIO`.
///
/// - zero fill
/// - little-endian primitive read/write (`read_u32_at`, `write_u32_at`)
pub trait BfsIOExt: BfsIO {
    /// Fills a region with zeroes.
    ///
    /// Used to clear freshly allocated blocks and metadata regions at format time.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> BfsIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    bfsio_impl_primitive_rw!(u32);
}

impl<T: BfsIO + ?Sized> BfsIOExt for T {}

/// Resizable media (host files, growable buffers).
pub trait BfsIOSetLen: BfsIO {
    /// Sets the length of the storage.
    fn set_len(&mut self, len: u64) -> BfsIOResult;
}

/// Reads and writes fixed-layout records using zerocopy.
pub trait BfsIOStructExt: BfsIO {
    /// Reads a record of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> BfsIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(BfsIOError::Other("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| BfsIOError::Other("read_struct failed"))
    }

    /// Writes a record of type `T` at the given offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> BfsIOResult {
        self.write_at(offset, val.as_bytes())
    }
}

impl<T: BfsIO + ?Sized> BfsIOStructExt for T {}
