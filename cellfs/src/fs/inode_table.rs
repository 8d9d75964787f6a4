// SPDX-License-Identifier: MIT

use cellio::prelude::*;
use tracing::{debug, trace, warn};
use zerocopy::FromBytes;

use crate::core::errors::*;
use crate::fs::constant::*;
use crate::fs::superblock::SuperblockStore;
use crate::fs::types::CellInode;

#[inline]
fn slot_offset(slot: u64) -> u64 {
    CELLFS_INODE_TABLE_BLOCK * CELLFS_BLOCK_SIZE as u64 + slot * CELLFS_INODE_SIZE as u64
}

/// View over the metadata table block for the length of one operation.
///
/// Slots `0..object_count` are in use. Slots are never reclaimed: a
/// deleted object's record stays until its identifier is reused and the
/// slot is overwritten.
pub struct InodeTable<'a, IO: CellIO + ?Sized> {
    io: &'a mut IO,
    store: &'a mut SuperblockStore,
}

impl<'a, IO: CellIO + ?Sized> InodeTable<'a, IO> {
    pub fn new(io: &'a mut IO, store: &'a mut SuperblockStore) -> Self {
        Self { io, store }
    }

    /// Every record up to the append cursor, in slot order. Stale
    /// records of released identifiers are included.
    pub fn records(&mut self) -> FsResult<Vec<CellInode>> {
        let mut block = [0u8; CELLFS_BLOCK_SIZE];
        self.io.read_block(CELLFS_INODE_TABLE_BLOCK, &mut block)?;

        let count = self.store.object_count().min(CELLFS_MAX_OBJECTS) as usize;
        block
            .chunks_exact(CELLFS_INODE_SIZE)
            .take(count)
            .map(|raw| {
                CellInode::read_from_bytes(raw).map_err(|_| FsError::Corrupted("unreadable table slot"))
            })
            .collect()
    }

    /// Slot holding `id`, if any.
    fn find_slot(&mut self, id: u64) -> FsResult<Option<(u64, CellInode)>> {
        trace!(id, count = self.store.object_count(), "table scan");
        let found = self
            .records()?
            .into_iter()
            .enumerate()
            .find(|(_, rec)| rec.id == id)
            .map(|(slot, rec)| (slot as u64, rec));
        Ok(found)
    }

    /// First record carrying `id`. Does not consult the identifier bitmap.
    pub fn find(&mut self, id: u64) -> FsResult<CellInode> {
        self.find_slot(id)?
            .map(|(_, rec)| rec)
            .ok_or(FsError::NotFound)
    }

    /// Like [`find`](Self::find) but only for identifiers currently in use.
    pub fn get(&mut self, id: u64) -> FsResult<CellInode> {
        if id != CELLFS_ROOT_ID && self.store.record().is_id_free(id) {
            return Err(FsError::NotFound);
        }
        self.find(id)
    }

    /// Writes `rec` at the append cursor and advances it.
    pub fn append(&mut self, rec: &CellInode) -> FsResult<u64> {
        let slot = self.store.object_count();
        if slot >= CELLFS_MAX_OBJECTS {
            return Err(FsError::CapacityExceeded);
        }
        self.io.write_struct(slot_offset(slot), rec)?;
        self.io.flush()?;
        self.store.set_object_count(&mut *self.io, slot + 1)?;
        debug!(id = rec.id, slot, "table append");
        Ok(slot)
    }

    /// Overwrites the slot already holding `rec.id`.
    pub fn update(&mut self, rec: &CellInode) -> FsResult {
        let Some((slot, _)) = self.find_slot(rec.id)? else {
            warn!(id = rec.id, "update of a record that was never appended");
            return Err(FsError::NotFound);
        };
        self.io.write_struct(slot_offset(slot), rec)?;
        self.io.flush()?;
        debug!(id = rec.id, slot, "table update");
        Ok(())
    }

    /// Overwrites a stale slot for `rec.id` if one exists, else appends.
    ///
    /// A reused slot gets the stale record's generation plus one, so
    /// handles pinned to the old object stop matching. Returns the
    /// record as written.
    pub fn put(&mut self, rec: &CellInode) -> FsResult<CellInode> {
        match self.find_slot(rec.id)? {
            Some((slot, stale)) => {
                let next = CellInode {
                    generation: stale.generation.wrapping_add(1),
                    ..*rec
                };
                self.io.write_struct(slot_offset(slot), &next)?;
                self.io.flush()?;
                debug!(id = rec.id, slot, generation = next.generation, "table slot reused");
                Ok(next)
            }
            None => {
                self.append(rec)?;
                Ok(*rec)
            }
        }
    }

    /// Whether [`put`](Self::put) for `id` would need a new slot, and
    /// whether one is available.
    pub fn can_put(&mut self, id: u64) -> FsResult<bool> {
        if self.find_slot(id)?.is_some() {
            return Ok(true);
        }
        Ok(self.store.object_count() < CELLFS_MAX_OBJECTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::types::{CellSuperblock, ObjectKind};
    use zerocopy::IntoBytes;

    fn image() -> Vec<u8> {
        let mut buf = vec![0u8; 8 * CELLFS_BLOCK_SIZE];
        let sb = CellSuperblock::new(8, 0, [0; 16], [0; CELLFS_LABEL_LEN]);
        buf[..CELLFS_BLOCK_SIZE].copy_from_slice(sb.as_bytes());
        let root = CellInode::new(CELLFS_ROOT_ID, ObjectKind::Container, CELLFS_ROOT_DATA_BLOCK, 0);
        let off = CELLFS_BLOCK_SIZE;
        buf[off..off + CELLFS_INODE_SIZE].copy_from_slice(root.as_bytes());
        buf
    }

    #[test]
    fn test_append_find_update() {
        let mut buf = image();
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();
        let mut table = InodeTable::new(&mut io, &mut store);

        let rec = CellInode::new(5, ObjectKind::Leaf, 3, 10);
        assert_eq!(table.append(&rec).unwrap(), 1);
        assert_eq!(table.find(5).unwrap(), rec);

        let mut changed = rec;
        changed.size = 42;
        table.update(&changed).unwrap();
        assert_eq!(table.find(5).unwrap().size, 42);
        assert_eq!(store.object_count(), 2);
    }

    #[test]
    fn test_missing_record() {
        let mut buf = image();
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();
        let mut table = InodeTable::new(&mut io, &mut store);

        assert_eq!(table.find(9), Err(FsError::NotFound));
        let ghost = CellInode::new(9, ObjectKind::Leaf, 4, 0);
        assert_eq!(table.update(&ghost), Err(FsError::NotFound));
    }

    #[test]
    fn test_put_reuses_slot() {
        let mut buf = image();
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();
        let mut table = InodeTable::new(&mut io, &mut store);

        let mut old = CellInode::new(2, ObjectKind::Leaf, 3, 0);
        old.size = 100;
        table.put(&old).unwrap();
        let new = CellInode::new(2, ObjectKind::Container, 4, 5);
        let written = table.put(&new).unwrap();

        assert_eq!(table.records().unwrap().len(), 2);
        let got = table.find(2).unwrap();
        assert_eq!(got, written);
        assert_eq!(got.size, 0);
        assert_eq!(got.data_block, 4);
        assert_eq!(got.generation, old.generation + 1);

        table.put(&new).unwrap();
        assert_eq!(table.find(2).unwrap().generation, 2);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut buf = image();
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();
        let mut table = InodeTable::new(&mut io, &mut store);

        for id in 100..100 + CELLFS_MAX_OBJECTS - 1 {
            table.append(&CellInode::new(id, ObjectKind::Leaf, 3, 0)).unwrap();
        }
        assert!(!table.can_put(7).unwrap());
        assert_eq!(
            table.append(&CellInode::new(7, ObjectKind::Leaf, 3, 0)),
            Err(FsError::CapacityExceeded)
        );
    }
}
