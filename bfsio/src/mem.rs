// SPDX-License-Identifier: MIT

use crate::{BfsIO, BfsIOError, BfsIOResult, BfsIOSetLen};

/// In-memory implementation of `BfsIO` over a borrowed byte slice.
///
/// Useful for tests and RAM disks. The logical length may be shrunk below
/// the slice length with `set_len`, never grown past it.
#[derive(Debug)]
pub struct MemBfsIO<'a> {
    buffer: &'a mut [u8],
    logical_len: usize,
}

impl<'a> MemBfsIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let logical_len = buffer.len();
        Self {
            buffer,
            logical_len,
        }
    }

    #[inline]
    fn range(&self, offset: u64, len: usize) -> BfsIOResult<core::ops::Range<usize>> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(BfsIOError::OutOfBounds)?;
        if end > self.logical_len as u64 {
            return Err(BfsIOError::OutOfBounds);
        }
        Ok(offset as usize..end as usize)
    }
}

impl<'a> BfsIO for MemBfsIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BfsIOResult {
        let range = self.range(offset, data.len())?;
        self.buffer[range].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BfsIOResult {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[range]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> BfsIOResult {
        Ok(())
    }

    #[inline]
    fn medium_size(&mut self) -> BfsIOResult<u64> {
        Ok(self.logical_len as u64)
    }
}

impl<'a> BfsIOSetLen for MemBfsIO<'a> {
    fn set_len(&mut self, new_len: u64) -> BfsIOResult {
        if new_len > self.buffer.len() as u64 {
            return Err(BfsIOError::OutOfBounds);
        }
        self.logical_len = new_len as usize;
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod test {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_rw() {
        let mut buf = [0u8; 256];
        let mut io = MemBfsIO::new(&mut buf);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut buf = [0u8; 64];
        let mut io = MemBfsIO::new(&mut buf);

        assert_eq!(io.write_at(60, &[0u8; 8]), Err(BfsIOError::OutOfBounds));
        let mut out = [0u8; 2];
        assert_eq!(io.read_at(u64::MAX, &mut out), Err(BfsIOError::OutOfBounds));
    }

    #[test]
    fn test_set_len_safe() {
        let mut buf = [0u8; 512];
        let mut io = MemBfsIO::new(&mut buf);
        io.set_len(256).unwrap();
        assert_eq!(io.medium_size().unwrap(), 256);
        assert!(io.read_at(256, &mut [0u8; 1]).is_err());
        assert!(io.set_len(1024).is_err());
    }

    #[test]
    fn test_primitive_rw() {
        let mut buf = [0u8; 32];
        let mut io = MemBfsIO::new(&mut buf);

        io.write_u32_at(4, 0x4253_4631).unwrap();
        assert_eq!(io.read_u32_at(4).unwrap(), 0x4253_4631);
        drop(io);
        assert_eq!(&buf[4..8], &[0x31, 0x46, 0x53, 0x42]);
    }

    #[test]
    fn test_zero_fill() {
        let mut buf = [0xFF; 64];
        let mut io = MemBfsIO::new(&mut buf);

        io.zero_fill(10, 8).unwrap();

        let mut output = [0xAA; 8];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [0u8; 8]);
    }
}
