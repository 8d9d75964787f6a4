// SPDX-License-Identifier: MIT

use cellio::prelude::*;
use tracing::{debug, info};

use crate::core::allocator::FsAllocator;
use crate::core::errors::*;
use crate::fs::allocator::{BitmapAllocator, BitmapSpace};
use crate::fs::constant::*;
use crate::fs::types::CellSuperblock;

/// Owner of the superblock record.
///
/// The cached copy always equals what is on disk: a change is written
/// and flushed first, and only then replaces the cache. A failed write
/// leaves the cache on the last durable value.
#[derive(Debug, Clone)]
pub struct SuperblockStore {
    current: CellSuperblock,
}

impl SuperblockStore {
    /// Reads block 0 and validates it against this build's format.
    pub fn load<IO: CellIO + ?Sized>(io: &mut IO) -> FsResult<Self> {
        let sb: CellSuperblock = io.read_struct(CELLFS_SUPERBLOCK_BLOCK * CELLFS_BLOCK_SIZE as u64)?;

        crate::ensure!(
            sb.magic == CELLFS_MAGIC,
            FsError::IncompatibleFormat("bad magic number")
        );
        crate::ensure!(
            sb.block_size == CELLFS_BLOCK_SIZE as u64,
            FsError::IncompatibleFormat("unsupported block size")
        );
        crate::ensure!(
            sb.version == CELLFS_VERSION,
            FsError::IncompatibleFormat("unsupported format version")
        );
        crate::ensure!(
            (1..=CELLFS_MAX_OBJECTS).contains(&sb.object_count),
            FsError::Corrupted("object count out of range")
        );

        info!(
            objects = sb.object_count,
            free_blocks = sb.free_blocks.count_ones(),
            free_ids = sb.free_ids.count_ones(),
            "superblock loaded"
        );
        Ok(Self { current: sb })
    }

    /// Wraps a record that is already on disk (formatter output).
    pub fn from_record(sb: CellSuperblock) -> Self {
        Self { current: sb }
    }

    pub fn record(&self) -> &CellSuperblock {
        &self.current
    }

    pub fn object_count(&self) -> u64 {
        self.current.object_count
    }

    /// Writes `next` to block 0, flushes, then adopts it.
    pub fn persist<IO: CellIO + ?Sized>(&mut self, io: &mut IO, next: CellSuperblock) -> CellIOResult {
        io.write_struct(CELLFS_SUPERBLOCK_BLOCK * CELLFS_BLOCK_SIZE as u64, &next)?;
        io.flush()?;
        self.current = next;
        Ok(())
    }

    /// Clears the lowest free bit of `space` and persists.
    pub fn allocate<IO: CellIO + ?Sized>(&mut self, io: &mut IO, space: BitmapSpace) -> FsResult<u64> {
        let mut next = self.current;
        let index = BitmapAllocator::new(&mut next, space).allocate_unit()?;
        self.persist(io, next)?;
        debug!(?space, index, "allocated");
        Ok(index)
    }

    /// Marks `index` free again and persists.
    pub fn release<IO: CellIO + ?Sized>(
        &mut self,
        io: &mut IO,
        space: BitmapSpace,
        index: u64,
    ) -> FsResult {
        let mut next = self.current;
        BitmapAllocator::new(&mut next, space)
            .release_unit(index)
            .inspect_err(|e| tracing::warn!(?space, index, error = %e, "release rejected"))?;
        self.persist(io, next)?;
        debug!(?space, index, "released");
        Ok(())
    }

    /// What `allocate(space)` would return right now.
    pub fn peek(&self, space: BitmapSpace) -> Option<u64> {
        let mut copy = self.current;
        BitmapAllocator::new(&mut copy, space).peek_unit()
    }

    pub fn remaining(&self, space: BitmapSpace) -> usize {
        let mut copy = self.current;
        BitmapAllocator::new(&mut copy, space).remaining_units()
    }

    /// Persists a new table length.
    pub fn set_object_count<IO: CellIO + ?Sized>(&mut self, io: &mut IO, count: u64) -> FsResult {
        let mut next = self.current;
        next.object_count = count;
        self.persist(io, next)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    fn fresh_image(blocks: usize) -> Vec<u8> {
        let mut buf = vec![0u8; blocks * CELLFS_BLOCK_SIZE];
        let sb = CellSuperblock::new(blocks as u64, 0, [1; 16], [0; CELLFS_LABEL_LEN]);
        buf[..CELLFS_BLOCK_SIZE].copy_from_slice(sb.as_bytes());
        buf
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let mut buf = vec![0u8; 4 * CELLFS_BLOCK_SIZE];
        let mut io = MemCellIO::new(&mut buf);
        assert!(matches!(
            SuperblockStore::load(&mut io),
            Err(FsError::IncompatibleFormat(_))
        ));
    }

    #[test]
    fn test_load_rejects_bad_block_size() {
        let mut buf = fresh_image(4);
        buf[16..24].copy_from_slice(&512u64.to_ne_bytes());
        let mut io = MemCellIO::new(&mut buf);
        assert_eq!(
            SuperblockStore::load(&mut io).unwrap_err(),
            FsError::IncompatibleFormat("unsupported block size")
        );
    }

    #[test]
    fn test_allocate_persists_and_release_restores() {
        let mut buf = fresh_image(16);
        let mut io = MemCellIO::new(&mut buf);
        let mut store = SuperblockStore::load(&mut io).unwrap();

        assert_eq!(store.peek(BitmapSpace::Blocks), Some(3));
        let b = store.allocate(&mut io, BitmapSpace::Blocks).unwrap();
        assert_eq!(b, 3);

        let reloaded = SuperblockStore::load(&mut io).unwrap();
        assert!(!reloaded.record().is_block_free(3));

        store.release(&mut io, BitmapSpace::Blocks, 3).unwrap();
        assert_eq!(
            store.release(&mut io, BitmapSpace::Blocks, 3),
            Err(FsError::Allocator(FsAllocatorError::AlreadyFree(3)))
        );
        let reloaded = SuperblockStore::load(&mut io).unwrap();
        assert!(reloaded.record().is_block_free(3));
    }

    #[test]
    fn test_failed_persist_keeps_cache() {
        let mut buf = fresh_image(4);
        let mut store = {
            let mut io = MemCellIO::new(&mut buf);
            SuperblockStore::load(&mut io).unwrap()
        };
        // A device too small for block 0 cannot take the write.
        let mut tiny = vec![0u8; 16];
        let mut io = MemCellIO::new(&mut tiny);
        let before = store.record().free_ids;
        assert!(store.allocate(&mut io, BitmapSpace::Identifiers).is_err());
        assert_eq!(store.record().free_ids, before);
    }
}
