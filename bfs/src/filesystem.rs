// SPDX-License-Identifier: MIT

use alloc::vec;
use alloc::vec::Vec;

use bfsio::BfsIO;
use log::debug;

use crate::core::errors::BfsResult;
use crate::core::store::BlockStore;
use crate::disk::meta::{BfsMeta, BfsParams};
use crate::disk::store::BfsDisk;
use crate::file::descriptor::{OpenFileTable, seek_target};
use crate::file::{Fd, Whence, engine};

/// File API over a block store: named files, handles with cursors and
/// byte-granular read/write.
///
/// Every operation takes `&mut self`; sharing a `Bfs` between threads is up
/// to the caller.
#[derive(Debug)]
pub struct Bfs<S: BlockStore> {
    store: S,
    files: OpenFileTable,
}

impl<S: BlockStore> Bfs<S> {
    /// Wraps an already mounted store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            files: OpenFileTable::new(),
        }
    }

    /// Opens an existing file with its cursor at 0.
    pub fn open(&mut self, name: &str) -> BfsResult<Fd> {
        let inum = self.store.lookup(name)?;
        self.store.acquire(inum);
        let fd = self.files.insert(inum);
        debug!("open '{name}' -> {fd}");
        Ok(fd)
    }

    /// Creates `name`, truncating it if it exists. Cursor starts at 0.
    ///
    /// Fails with `Allocation(OutOfInodes)` when no inode is free and with
    /// `InvalidName` when the name cannot be stored. Medium failures surface
    /// as `IO` or `Corrupt`.
    pub fn create(&mut self, name: &str) -> BfsResult<Fd> {
        let inum = self.store.create_or_truncate(name)?;
        self.store.acquire(inum);
        let fd = self.files.insert(inum);
        debug!("create '{name}' -> {fd}");
        Ok(fd)
    }

    pub fn close(&mut self, fd: Fd) -> BfsResult {
        let file = self.files.remove(fd)?;
        self.store.release(file.inum);
        Ok(())
    }

    /// Reads into `buf` from the cursor; fewer bytes than requested at EOF.
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> BfsResult<usize> {
        let file = self.files.get_mut(fd)?;
        engine::read_at(&mut self.store, file, buf)
    }

    /// Reads up to `n` bytes from the cursor into a new buffer.
    pub fn read_to_vec(&mut self, fd: Fd, n: usize) -> BfsResult<Vec<u8>> {
        let file = self.files.get_mut(fd)?;
        let size = self.store.size(file.inum)?;
        let available = size.saturating_sub(file.cursor);
        let mut buf = vec![0u8; (n as u64).min(available) as usize];
        let read = engine::read_at(&mut self.store, file, &mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    /// Writes all of `data` at the cursor, growing the file as needed.
    pub fn write(&mut self, fd: Fd, data: &[u8]) -> BfsResult<usize> {
        let file = self.files.get_mut(fd)?;
        engine::write_at(&mut self.store, file, data)
    }

    /// Moves the cursor. Negative offsets fail with `InvalidCursor`.
    pub fn seek(&mut self, fd: Fd, offset: i64, whence: Whence) -> BfsResult<u64> {
        let file = self.files.get_mut(fd)?;
        let size = match whence {
            Whence::End => self.store.size(file.inum)?,
            _ => 0,
        };
        file.cursor = seek_target(file.cursor, size, offset, whence)?;
        Ok(file.cursor)
    }

    pub fn tell(&self, fd: Fd) -> BfsResult<u64> {
        Ok(self.files.get(fd)?.cursor)
    }

    pub fn size(&mut self, fd: Fd) -> BfsResult<u64> {
        let inum = self.files.get(fd)?.inum;
        self.store.size(inum)
    }

    #[inline]
    pub fn open_handles(&self) -> usize {
        self.files.len()
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Closes every open handle, flushes the store and hands it back.
    pub fn unmount(mut self) -> BfsResult<S> {
        for (fd, file) in self.files.drain() {
            debug!("unmount: closing {fd}");
            self.store.release(file.inum);
        }
        self.store.flush()?;
        Ok(self.store)
    }
}

impl<IO: BfsIO> Bfs<BfsDisk<IO>> {
    /// Formats `io` with `params` and mounts it.
    pub fn format(io: IO, params: &BfsParams) -> BfsResult<Self> {
        let meta = BfsMeta::new(params)?;
        Ok(Self::new(BfsDisk::format(io, &meta)?))
    }

    /// Mounts an already formatted medium.
    pub fn mount(io: IO) -> BfsResult<Self> {
        Ok(Self::new(BfsDisk::mount(io)?))
    }
}

#[cfg(feature = "std")]
mod host {
    use std::fs::{File, OpenOptions};
    use std::path::Path;

    use bfsio::BfsIOError;
    use bfsio::prelude::{BfsIOSetLen, StdBfsIO};

    use super::*;
    use crate::core::errors::BfsError;

    /// `Bfs` backed by a host file.
    pub type HostBfs = Bfs<BfsDisk<StdBfsIO<File>>>;

    impl HostBfs {
        /// Creates (or truncates) the image at `path`, sizes it for `params`
        /// and formats it.
        pub fn format_path<P: AsRef<Path>>(path: P, params: &BfsParams) -> BfsResult<Self> {
            let meta = BfsMeta::new(params)?;
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path.as_ref())
                .map_err(|e| BfsError::MediumUnavailable(BfsIOError::from(e)))?;
            let mut io = StdBfsIO::new(file);
            io.set_len(meta.size_bytes())
                .map_err(BfsError::MediumUnavailable)?;

            debug!("formatting {}", path.as_ref().display());
            Ok(Self::new(BfsDisk::format(io, &meta)?))
        }

        /// Opens and mounts the image at `path`.
        pub fn mount_path<P: AsRef<Path>>(path: P) -> BfsResult<Self> {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path.as_ref())
                .map_err(|e| BfsError::MediumUnavailable(BfsIOError::from(e)))?;

            debug!("mounting {}", path.as_ref().display());
            Self::mount(StdBfsIO::new(file))
        }
    }
}

#[cfg(feature = "std")]
pub use host::HostBfs;

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::core::errors::BfsError;
    use bfsio::prelude::*;

    fn params() -> BfsParams {
        BfsParams::new(512, 128, 8)
    }

    #[test]
    fn create_write_seek_read() {
        let mut buf = vec![0u8; params().size_bytes() as usize];
        let mut fs = Bfs::format(MemBfsIO::new(&mut buf), &params()).unwrap();

        let fd = fs.create("notes").unwrap();
        assert_eq!(fs.write(fd, b"hello world").unwrap(), 11);
        assert_eq!(fs.tell(fd).unwrap(), 11);

        assert_eq!(fs.seek(fd, 6, Whence::Set).unwrap(), 6);
        assert_eq!(fs.read_to_vec(fd, 100).unwrap(), b"world");
        assert_eq!(fs.seek(fd, 0, Whence::End).unwrap(), 11);
        assert_eq!(fs.size(fd).unwrap(), 11);
        fs.close(fd).unwrap();
    }

    #[test]
    fn bad_descriptor_and_negative_seek() {
        let mut buf = vec![0u8; params().size_bytes() as usize];
        let mut fs = Bfs::format(MemBfsIO::new(&mut buf), &params()).unwrap();

        assert_eq!(fs.tell(Fd(3)), Err(BfsError::BadDescriptor(Fd(3))));
        assert_eq!(fs.close(Fd(0)), Err(BfsError::BadDescriptor(Fd(0))));

        let fd = fs.create("x").unwrap();
        fs.seek(fd, 4, Whence::Set).unwrap();
        assert_eq!(fs.seek(fd, -1, Whence::Current), Err(BfsError::InvalidCursor));
        assert_eq!(fs.tell(fd).unwrap(), 4);
    }

    #[test]
    fn open_missing_then_create() {
        let mut buf = vec![0u8; params().size_bytes() as usize];
        let mut fs = Bfs::format(MemBfsIO::new(&mut buf), &params()).unwrap();

        assert_eq!(fs.open("log"), Err(BfsError::FileNotFound));
        let fd = fs.create("log").unwrap();
        fs.write(fd, b"abc").unwrap();

        let again = fs.open("log").unwrap();
        assert_ne!(fd, again);
        let inum = fs.store_mut().lookup("log").unwrap();
        assert_eq!(fs.store().open_count(inum), 2);
    }

    #[test]
    fn unmount_releases_handles() {
        let mut buf = vec![0u8; params().size_bytes() as usize];
        let mut fs = Bfs::format(MemBfsIO::new(&mut buf), &params()).unwrap();
        let a = fs.create("a").unwrap();
        fs.open("a").unwrap();
        fs.write(a, b"persist me").unwrap();
        assert_eq!(fs.open_handles(), 2);

        let disk = fs.unmount().unwrap();
        drop(disk);

        let mut fs = Bfs::mount(MemBfsIO::new(&mut buf)).unwrap();
        let fd = fs.open("a").unwrap();
        assert_eq!(fs.read_to_vec(fd, 64).unwrap(), b"persist me");
    }
}
