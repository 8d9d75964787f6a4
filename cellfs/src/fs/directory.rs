// SPDX-License-Identifier: MIT

use cellio::prelude::*;
use tracing::{debug, trace};
use zerocopy::FromBytes;

use crate::core::errors::*;
use crate::fs::constant::*;
use crate::fs::inode_table::InodeTable;
use crate::fs::superblock::SuperblockStore;
use crate::fs::types::{CellDirent, CellInode, validate_name};

/// A live directory entry as handed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub id: u64,
}

/// Live entries of one container, in append order.
///
/// Iterates a private copy of the entry block taken when the listing was
/// produced; later appends or removals are not observed. Call
/// [`rewind`](Self::rewind) (or clone before iterating) to scan again.
#[derive(Debug, Clone)]
pub struct DirEntries {
    block: Vec<u8>,
    bound: usize,
    pos: usize,
}

impl DirEntries {
    fn new(block: Vec<u8>, cursor: u64) -> Self {
        Self {
            block,
            bound: (cursor as usize).min(CELLFS_DIRENTS_PER_BLOCK),
            pos: 0,
        }
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }
}

impl Iterator for DirEntries {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        while self.pos < self.bound {
            let raw = dirent_at(&self.block, self.pos);
            self.pos += 1;
            if let Some(d) = raw.filter(CellDirent::is_live) {
                return Some(DirEntry {
                    name: d.name_lossy(),
                    id: d.id,
                });
            }
        }
        None
    }
}

fn dirent_at(block: &[u8], slot: usize) -> Option<CellDirent> {
    let start = slot * CELLFS_DIRENT_SIZE;
    block
        .get(start..start + CELLFS_DIRENT_SIZE)
        .and_then(|raw| CellDirent::read_from_bytes(raw).ok())
}

#[inline]
fn entry_offset(data_block: u64, slot: u64) -> u64 {
    data_block * CELLFS_BLOCK_SIZE as u64 + slot * CELLFS_DIRENT_SIZE as u64
}

/// View over container entry blocks for the length of one operation.
///
/// The container's `child_slots` is the append cursor: it bounds every
/// scan and is never decremented. Removal only tombstones.
pub struct DirectoryTable<'a, IO: CellIO + ?Sized> {
    io: &'a mut IO,
    store: &'a mut SuperblockStore,
}

impl<'a, IO: CellIO + ?Sized> DirectoryTable<'a, IO> {
    pub fn new(io: &'a mut IO, store: &'a mut SuperblockStore) -> Self {
        Self { io, store }
    }

    fn read_entries(&mut self, parent: &CellInode) -> FsResult<Vec<u8>> {
        let mut block = vec![0u8; CELLFS_BLOCK_SIZE];
        self.io.read_block(parent.data_block, &mut block)?;
        Ok(block)
    }

    /// Slots `0..cursor` as `(slot, entry)`.
    fn scan(&mut self, parent: &CellInode) -> FsResult<Vec<(u64, CellDirent)>> {
        let block = self.read_entries(parent)?;
        let bound = (parent.child_slots as usize).min(CELLFS_DIRENTS_PER_BLOCK);
        trace!(container = parent.id, bound, "entry scan");
        Ok((0..bound)
            .filter_map(|slot| dirent_at(&block, slot).map(|d| (slot as u64, d)))
            .collect())
    }

    /// Appends a live entry at the cursor, then advances the cursor in
    /// the container's record. `parent` is updated in place.
    pub fn append(&mut self, parent: &mut CellInode, name: &str, id: u64, now: u64) -> FsResult {
        validate_name(name)?;
        if parent.child_slots >= CELLFS_DIRENTS_PER_BLOCK as u64 {
            return Err(FsError::NoSpace);
        }

        let slot = parent.child_slots;
        let entry = CellDirent::live(name, id);
        self.io.write_struct(entry_offset(parent.data_block, slot), &entry)?;
        self.io.flush()?;

        let mut next = *parent;
        next.child_slots += 1;
        next.modified_at = now;
        InodeTable::new(&mut *self.io, &mut *self.store).update(&next)?;
        *parent = next;

        debug!(container = parent.id, slot, id, name, "entry append");
        Ok(())
    }

    /// Identifier of the first live entry named `name`.
    pub fn lookup(&mut self, parent: &CellInode, name: &str) -> FsResult<Option<u64>> {
        Ok(self
            .scan(parent)?
            .into_iter()
            .find(|(_, d)| d.is_live() && d.name_matches(name))
            .map(|(_, d)| d.id))
    }

    pub fn entries(&mut self, parent: &CellInode) -> FsResult<DirEntries> {
        let block = self.read_entries(parent)?;
        Ok(DirEntries::new(block, parent.child_slots))
    }

    pub fn live_count(&mut self, parent: &CellInode) -> FsResult<usize> {
        Ok(self.scan(parent)?.iter().filter(|(_, d)| d.is_live()).count())
    }

    /// Slot of the live entry matching both `name` and `id`.
    pub fn find_live(&mut self, parent: &CellInode, id: u64, name: &str) -> FsResult<Option<u64>> {
        Ok(self
            .scan(parent)?
            .into_iter()
            .find(|(_, d)| d.is_live() && d.id == id && d.name_matches(name))
            .map(|(slot, _)| slot))
    }

    /// Tombstones the live entry matching `name` and `id`. The scan stops
    /// at the cursor; nothing is written when no entry matches.
    pub fn remove(&mut self, parent: &mut CellInode, id: u64, name: &str, now: u64) -> FsResult {
        let slot = self.find_live(parent, id, name)?.ok_or(FsError::NotFound)?;

        let offset = entry_offset(parent.data_block, slot);
        let mut entry: CellDirent = self.io.read_struct(offset)?;
        entry.state = CELLFS_DIRENT_TOMBSTONE;
        self.io.write_struct(offset, &entry)?;
        self.io.flush()?;

        let mut next = *parent;
        next.modified_at = now;
        InodeTable::new(&mut *self.io, &mut *self.store).update(&next)?;
        *parent = next;

        debug!(container = parent.id, slot, id, name, "entry tombstoned");
        Ok(())
    }
}
