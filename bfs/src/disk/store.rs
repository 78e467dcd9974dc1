// SPDX-License-Identifier: MIT

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use bfsio::{BfsIO, BfsIOExt, BfsIOStructExt};
use log::{debug, trace};
use zerocopy::FromBytes;

use crate::core::errors::{BfsAllocError, BfsError, BfsResult};
use crate::core::store::{BlockStore, Dbn, Fbn, Inum};
use crate::core::utils::time_utils::now_unix;
use crate::disk::allocator::BfsAllocator;
use crate::disk::constant::*;
use crate::disk::formatter::BfsFormatter;
use crate::disk::meta::BfsMeta;
use crate::disk::types::*;

/// One directory listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsEntryInfo {
    pub name: String,
    pub inum: Inum,
    pub size: u64,
    pub block_count: u32,
    pub mtime: i64,
}

/// Reference block store: superblock, inode table, flat directory and a
/// free-block bitmap on a `BfsIO` medium.
///
/// The bitmap is cached in memory and written through on every change.
/// Inodes and directory entries are read from the medium on demand.
#[derive(Debug)]
pub struct BfsDisk<IO: BfsIO> {
    io: IO,
    meta: BfsMeta,
    alloc: BfsAllocator,
    refs: BTreeMap<Inum, u32>,
    created_at: i64,
}

impl<IO: BfsIO> BfsDisk<IO> {
    /// Formats `io` with `meta` and mounts the result.
    pub fn format(mut io: IO, meta: &BfsMeta) -> BfsResult<Self> {
        BfsFormatter::new(&mut io, meta).format(false)?;
        Self::mount(io)
    }

    /// Validates a formatted medium and loads its bitmap.
    ///
    /// An unreadable medium is `MediumUnavailable`; a readable one without a
    /// consistent superblock is `Corrupt`.
    pub fn mount(mut io: IO) -> BfsResult<Self> {
        let sb: BfsSuperblock = io
            .read_struct(0)
            .map_err(BfsError::MediumUnavailable)?;
        if !sb.is_valid_signature() {
            return Err(BfsError::Corrupt("no BFS superblock on medium"));
        }
        let meta = BfsMeta::from_superblock(&sb)?;

        let size = io.medium_size().map_err(BfsError::MediumUnavailable)?;
        if size < meta.size_bytes() {
            return Err(BfsError::Corrupt("medium shorter than formatted size"));
        }

        let mut bitmap = vec![0u8; meta.bitmap_len()];
        io.read_at(meta.bitmap_offset(), &mut bitmap)?;
        let alloc = BfsAllocator::from_bytes(&meta, bitmap)?;

        debug!(
            "mounted: {} blocks of {} bytes, {} free",
            meta.total_blocks,
            meta.block_size,
            alloc.free_blocks()
        );

        Ok(Self {
            io,
            meta,
            alloc,
            refs: BTreeMap::new(),
            created_at: sb.created_at,
        })
    }

    #[inline]
    pub fn meta(&self) -> &BfsMeta {
        &self.meta
    }

    /// Format time, seconds since the Unix epoch.
    #[inline]
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.alloc.free_blocks()
    }

    #[inline]
    pub fn used_blocks(&self) -> usize {
        self.alloc.used_blocks()
    }

    /// Open handles currently counted against `inum`.
    pub fn open_count(&self, inum: Inum) -> u32 {
        self.refs.get(&inum).copied().unwrap_or(0)
    }

    /// Lists every file in directory order.
    pub fn entries(&mut self) -> BfsResult<Vec<BfsEntryInfo>> {
        let mut out = Vec::new();
        for (_, entry) in self.read_directory()? {
            if entry.is_free() {
                continue;
            }
            let inode = self.read_inode(entry.inum)?;
            out.push(BfsEntryInfo {
                name: String::from_utf8_lossy(entry.name_bytes()).into_owned(),
                inum: entry.inum,
                size: inode.size,
                block_count: inode.block_count,
                mtime: inode.mtime,
            });
        }
        Ok(out)
    }

    // === Inodes ===

    fn read_inode(&mut self, inum: Inum) -> BfsResult<BfsInode> {
        if !self.meta.is_valid_inum(inum) {
            return Err(BfsError::Corrupt("inode number out of range"));
        }
        let inode: BfsInode = self.io.read_struct(self.meta.inode_offset(inum))?;
        if !inode.is_in_use() {
            return Err(BfsError::Corrupt("inode is not in use"));
        }
        Ok(inode)
    }

    fn write_inode(&mut self, inum: Inum, inode: &BfsInode) -> BfsResult {
        self.io.write_struct(self.meta.inode_offset(inum), inode)?;
        Ok(())
    }

    fn find_free_inode(&mut self) -> BfsResult<Option<Inum>> {
        for inum in 0..self.meta.inode_count {
            let inode: BfsInode = self.io.read_struct(self.meta.inode_offset(inum))?;
            if !inode.is_in_use() {
                return Ok(Some(inum));
            }
        }
        Ok(None)
    }

    // === Directory ===

    fn read_directory(&mut self) -> BfsResult<Vec<(u32, BfsDirEntry)>> {
        let len = self.meta.inode_count as usize * BFS_DIRENT_SIZE;
        let mut raw = vec![0u8; len];
        self.io.read_at(self.meta.dirent_offset(0), &mut raw)?;

        raw.chunks_exact(BFS_DIRENT_SIZE)
            .enumerate()
            .map(|(slot, chunk)| {
                BfsDirEntry::read_from_bytes(chunk)
                    .map(|e| (slot as u32, e))
                    .map_err(|_| BfsError::Corrupt("unreadable directory entry"))
            })
            .collect()
    }

    fn find_entry(&mut self, name: &str) -> BfsResult<Option<BfsDirEntry>> {
        Ok(self
            .read_directory()?
            .into_iter()
            .map(|(_, e)| e)
            .find(|e| e.matches(name)))
    }

    // === Block map ===

    fn read_indirect(&mut self, dbn: Dbn) -> BfsResult<Vec<Dbn>> {
        let mut raw = vec![0u8; self.meta.block_size()];
        self.io.read_at(self.meta.block_offset(dbn), &mut raw)?;
        Ok(raw
            .chunks_exact(BFS_DBN_SIZE)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    fn write_indirect(&mut self, dbn: Dbn, table: &[Dbn]) -> BfsResult {
        let raw: Vec<u8> = table.iter().flat_map(|d| d.to_le_bytes()).collect();
        self.io.write_at(self.meta.block_offset(dbn), &raw)?;
        Ok(())
    }

    /// Every data block mapped by `inode`, in FBN order.
    fn mapped_blocks(&mut self, inode: &BfsInode) -> BfsResult<Vec<Dbn>> {
        let count = inode.block_count as usize;
        let direct = inode.direct;
        let mut out: Vec<Dbn> = direct.iter().copied().take(count).collect();
        if count > BFS_NUM_DIRECT {
            let table = self.read_indirect(inode.indirect)?;
            out.extend(table.into_iter().take(count - BFS_NUM_DIRECT));
        }
        Ok(out)
    }

    /// Frees the whole block map of `inode` (data and indirect block).
    fn release_blocks(&mut self, inode: &mut BfsInode) -> BfsResult {
        for dbn in self.mapped_blocks(inode)? {
            self.alloc.free(dbn);
        }
        if inode.indirect != BFS_NO_BLOCK {
            self.alloc.free(inode.indirect);
        }
        inode.clear_blocks();
        Ok(())
    }

    /// Zeroes `fresh` and records them as FBNs `from..` of `inode`.
    fn map_new_blocks(&mut self, inode: &mut BfsInode, from: u32, fresh: &[Dbn]) -> BfsResult {
        for &dbn in fresh {
            self.io
                .zero_fill(self.meta.block_offset(dbn), self.meta.block_size())?;
        }

        let mut direct = inode.direct;
        let mut table: Option<Vec<Dbn>> = None;
        for (fbn, &dbn) in (from..).zip(fresh) {
            let fbn = fbn as usize;
            if fbn < BFS_NUM_DIRECT {
                direct[fbn] = dbn;
            } else {
                if table.is_none() {
                    table = Some(self.read_indirect(inode.indirect)?);
                }
                if let Some(t) = table.as_mut() {
                    t[fbn - BFS_NUM_DIRECT] = dbn;
                }
            }
        }
        inode.direct = direct;

        if let Some(t) = table {
            self.write_indirect(inode.indirect, &t)?;
        }
        Ok(())
    }

    /// Writes the grown block map of `inode` once its blocks are reserved.
    ///
    /// The bitmap reaches the medium before the inode, so a mapped block is
    /// never free on disk.
    fn commit_extend(
        &mut self,
        inum: Inum,
        inode: &mut BfsInode,
        block_count: u32,
        indirect: Option<Dbn>,
        fresh: &[Dbn],
    ) -> BfsResult {
        let mut staged = *inode;
        if let Some(dbn) = indirect {
            self.io
                .zero_fill(self.meta.block_offset(dbn), self.meta.block_size())?;
            staged.indirect = dbn;
        }
        self.map_new_blocks(&mut staged, inode.block_count, fresh)?;
        staged.block_count = block_count;
        staged.mtime = now_unix();
        self.persist_bitmap()?;
        self.write_inode(inum, &staged)?;
        *inode = staged;
        Ok(())
    }

    fn persist_bitmap(&mut self) -> BfsResult {
        let offset = self.meta.bitmap_offset();
        self.io.write_at(offset, self.alloc.as_bytes())?;
        Ok(())
    }

    fn check_block_transfer(&self, dbn: Dbn, len: usize) -> BfsResult {
        if len != self.meta.block_size() {
            return Err(BfsError::Corrupt("block buffer is not one block long"));
        }
        if !self.meta.is_data_block(dbn) {
            return Err(BfsError::Corrupt("block outside the data region"));
        }
        Ok(())
    }
}

impl<IO: BfsIO> BlockStore for BfsDisk<IO> {
    fn block_size(&self) -> usize {
        self.meta.block_size()
    }

    fn lookup(&mut self, name: &str) -> BfsResult<Inum> {
        if validate_name(name).is_err() {
            return Err(BfsError::FileNotFound);
        }
        self.find_entry(name)?
            .map(|e| e.inum)
            .ok_or(BfsError::FileNotFound)
    }

    fn create_or_truncate(&mut self, name: &str) -> BfsResult<Inum> {
        validate_name(name)?;

        if let Some(entry) = self.find_entry(name)? {
            let inum = entry.inum;
            let mut inode = self.read_inode(inum)?;
            let freed = inode.block_count;
            self.release_blocks(&mut inode)?;
            inode.mtime = now_unix();
            self.write_inode(inum, &inode)?;
            self.persist_bitmap()?;
            debug!("truncated '{name}' (inode {inum}, {freed} blocks freed)");
            return Ok(inum);
        }

        let inum = self
            .find_free_inode()?
            .ok_or(BfsAllocError::OutOfInodes)?;
        let slot = self
            .read_directory()?
            .into_iter()
            .find(|(_, e)| e.is_free())
            .map(|(slot, _)| slot)
            .ok_or(BfsAllocError::OutOfInodes)?;

        let entry = BfsDirEntry::new(name, inum)?;
        self.write_inode(inum, &BfsInode::new_in_use(now_unix()))?;
        self.io.write_struct(self.meta.dirent_offset(slot), &entry)?;
        debug!("created '{name}' (inode {inum}, slot {slot})");
        Ok(inum)
    }

    fn resolve_block(&mut self, inum: Inum, fbn: Fbn) -> BfsResult<Dbn> {
        let inode = self.read_inode(inum)?;
        if fbn >= inode.block_count {
            return Err(BfsError::Corrupt("logical block beyond allocation"));
        }

        let dbn = match inode.direct_block(fbn) {
            Some(dbn) => dbn,
            None => {
                let slot = (fbn as usize - BFS_NUM_DIRECT) * BFS_DBN_SIZE;
                let offset = self.meta.block_offset(inode.indirect) + slot as u64;
                self.io.read_u32_at(offset)?
            }
        };

        if !self.meta.is_data_block(dbn) {
            return Err(BfsError::Corrupt("block map points outside the data region"));
        }
        Ok(dbn)
    }

    fn extend(&mut self, inum: Inum, block_count: u32) -> BfsResult {
        let mut inode = self.read_inode(inum)?;
        let current = inode.block_count;
        if block_count <= current {
            return Ok(());
        }
        if block_count > self.meta.max_file_blocks() {
            return Err(BfsAllocError::FileTooLarge.into());
        }

        let needs_indirect =
            block_count as usize > BFS_NUM_DIRECT && inode.indirect == BFS_NO_BLOCK;
        let wanted = (block_count - current) as usize + usize::from(needs_indirect);
        let mut fresh = self.alloc.allocate(wanted)?;
        let indirect = if needs_indirect { fresh.pop() } else { None };

        if let Err(e) = self.commit_extend(inum, &mut inode, block_count, indirect, &fresh) {
            // Give the blocks back so the cached bitmap matches the medium.
            for dbn in fresh.into_iter().chain(indirect) {
                self.alloc.free(dbn);
            }
            if let Err(sync) = self.persist_bitmap() {
                debug!("inode {inum}: bitmap left with leaked blocks: {sync}");
            }
            return Err(e);
        }

        trace!("inode {inum}: {current} -> {block_count} blocks");
        Ok(())
    }

    fn size(&mut self, inum: Inum) -> BfsResult<u64> {
        Ok(self.read_inode(inum)?.size)
    }

    fn set_size(&mut self, inum: Inum, size: u64) -> BfsResult {
        let mut inode = self.read_inode(inum)?;
        inode.size = size;
        inode.mtime = now_unix();
        self.write_inode(inum, &inode)
    }

    fn read_block(&mut self, dbn: Dbn, buf: &mut [u8]) -> BfsResult {
        self.check_block_transfer(dbn, buf.len())?;
        self.io.read_at(self.meta.block_offset(dbn), buf)?;
        Ok(())
    }

    fn write_block(&mut self, dbn: Dbn, buf: &[u8]) -> BfsResult {
        self.check_block_transfer(dbn, buf.len())?;
        self.io.write_at(self.meta.block_offset(dbn), buf)?;
        Ok(())
    }

    fn acquire(&mut self, inum: Inum) {
        *self.refs.entry(inum).or_insert(0) += 1;
    }

    fn release(&mut self, inum: Inum) {
        if let Some(count) = self.refs.get_mut(&inum) {
            *count -= 1;
            if *count == 0 {
                self.refs.remove(&inum);
            }
        }
    }

    fn flush(&mut self) -> BfsResult {
        self.io.flush()?;
        Ok(())
    }
}
