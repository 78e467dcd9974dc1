// SPDX-License-Identifier: MIT

use std::io::{Error, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::{BfsIO, BfsIOError, BfsIOResult, BfsIOSetLen};

/// `BfsIO` over any owned `Read + Write + Seek` host object (usually a `File`).
#[derive(Debug)]
pub struct StdBfsIO<T: Read + Write + Seek> {
    io: T,
}

impl<T: Read + Write + Seek> StdBfsIO<T> {
    #[inline]
    pub fn new(io: T) -> Self {
        Self { io }
    }
}

impl<T: Read + Write + Seek> BfsIO for StdBfsIO<T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BfsIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BfsIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> BfsIOResult {
        self.io.flush()?;
        Ok(())
    }

    fn medium_size(&mut self) -> BfsIOResult<u64> {
        Ok(self.io.seek(SeekFrom::End(0))?)
    }
}

impl BfsIOSetLen for StdBfsIO<std::fs::File> {
    fn set_len(&mut self, len: u64) -> BfsIOResult {
        self.io.set_len(len)?;
        self.flush()?;
        Ok(())
    }
}

impl From<Error> for BfsIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        match e.kind() {
            ErrorKind::NotFound => BfsIOError::NotFound,
            ErrorKind::UnexpectedEof => BfsIOError::OutOfBounds,
            ErrorKind::Unsupported => BfsIOError::Unsupported,
            ErrorKind::PermissionDenied => BfsIOError::Other("Permission denied"),
            ErrorKind::InvalidInput => BfsIOError::Other("Invalid input"),
            ErrorKind::StorageFull => BfsIOError::Other("No space left on host storage"),
            _ => BfsIOError::Other("Host I/O error"),
        }
    }
}
