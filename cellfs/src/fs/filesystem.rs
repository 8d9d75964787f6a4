// SPDX-License-Identifier: MIT

//! The mounted filesystem handle.
//!
//! Two lock domains:
//! - `meta` owns the device and the superblock store; every read or
//!   write of block 0, the table block or an entry block happens under
//!   it, and each multi-step mutation holds it from first check to last
//!   write.
//! - `pool` owns the [`ObjectPool`] of pinned records.
//!
//! No code path holds both. Handles copy what they need out of one
//! domain, drop it, then take the other.

use cellio::prelude::*;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::core::allocator::FsAllocatorError;
use crate::core::checker::FsChecker;
use crate::core::errors::*;
use crate::core::utils::{time_utils::unix_now, volume};
use crate::fs::allocator::BitmapSpace;
use crate::fs::checker::{CellCheckOptions, CellChecker, VerifyReport};
use crate::fs::constant::*;
use crate::fs::content;
use crate::fs::directory::{DirEntries, DirectoryTable};
use crate::fs::inode_table::InodeTable;
use crate::fs::pool::ObjectPool;
use crate::fs::superblock::SuperblockStore;
use crate::fs::types::{CellInode, ObjectKind, validate_name};

#[derive(Debug, Clone)]
pub struct MountOptions {
    /// Maximum simultaneously open [`ObjectRef`]s.
    pub pool_capacity: usize,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            pool_capacity: CELLFS_DEFAULT_POOL_CAPACITY,
        }
    }
}

/// Value copy of an object's metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub id: u64,
    pub kind: ObjectKind,
    pub size: u64,
    pub data_block: u64,
    /// Entry slots ever appended (containers). Not a live child count.
    pub child_slots: u64,
    pub created_at: u64,
    pub modified_at: u64,
}

impl TryFrom<&CellInode> for ObjectMetadata {
    type Error = FsError;

    fn try_from(rec: &CellInode) -> FsResult<Self> {
        let kind = rec
            .object_kind()
            .ok_or(FsError::Corrupted("record has an unknown kind"))?;
        Ok(Self {
            id: rec.id,
            kind,
            size: rec.size,
            data_block: rec.data_block,
            child_slots: rec.child_slots,
            created_at: rec.created_at,
            modified_at: rec.modified_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsStats {
    pub block_size: u64,
    pub total_blocks: u64,
    pub free_blocks: u64,
    pub total_ids: u64,
    pub free_ids: u64,
    pub object_count: u64,
    pub max_objects: u64,
    pub label: String,
    pub volume_id: [u8; 16],
    pub created_at: u64,
}

/// Device plus superblock store: everything the metadata lock guards.
pub struct MetadataDomain<IO: CellIO> {
    io: IO,
    store: SuperblockStore,
}

impl<IO: CellIO> MetadataDomain<IO> {
    fn inodes(&mut self) -> InodeTable<'_, IO> {
        InodeTable::new(&mut self.io, &mut self.store)
    }

    fn dirs(&mut self) -> DirectoryTable<'_, IO> {
        DirectoryTable::new(&mut self.io, &mut self.store)
    }

    fn container(&mut self, id: u64) -> FsResult<CellInode> {
        let rec = self.inodes().get(id)?;
        if !rec.is_container() {
            return Err(FsError::NotDirectory);
        }
        Ok(rec)
    }

    fn leaf(&mut self, id: u64) -> FsResult<CellInode> {
        let rec = self.inodes().get(id)?;
        if rec.is_container() {
            return Err(FsError::IsDirectory);
        }
        Ok(rec)
    }

    /// The record for `id` if it is still the incarnation a handle pinned.
    fn pinned(&mut self, id: u64, generation: u64) -> FsResult<CellInode> {
        let rec = self.inodes().get(id)?;
        crate::ensure!(rec.generation == generation, FsError::NotFound);
        Ok(rec)
    }

    fn pinned_leaf(&mut self, id: u64, generation: u64) -> FsResult<CellInode> {
        let rec = self.pinned(id, generation)?;
        crate::ensure!(!rec.is_container(), FsError::IsDirectory);
        Ok(rec)
    }

    fn write_leaf(&mut self, rec: &CellInode, offset: u64, bytes: &[u8]) -> FsResult<(usize, CellInode)> {
        content::write(&mut self.io, &mut self.store, rec, offset, bytes, unix_now())
    }
}

/// A mounted image.
///
/// Safe to share between threads (`&CellFs` is `Sync` when the device is
/// `Send`). Every operation persists its writes before returning.
pub struct CellFs<IO: CellIO> {
    meta: Mutex<MetadataDomain<IO>>,
    pool: Mutex<ObjectPool>,
}

impl<IO: CellIO> CellFs<IO> {
    /// Mounts with default options. Fails with `IncompatibleFormat` when
    /// block 0 is not a superblock this build understands.
    pub fn mount(io: IO) -> FsResult<Self> {
        Self::mount_with(io, MountOptions::default())
    }

    pub fn mount_with(mut io: IO, opts: MountOptions) -> FsResult<Self> {
        let mut store = SuperblockStore::load(&mut io)?;

        let root = InodeTable::new(&mut io, &mut store)
            .find(CELLFS_ROOT_ID)
            .map_err(|e| match e {
                FsError::NotFound => FsError::Corrupted("root record missing"),
                other => other,
            })?;
        if !root.is_container() {
            return Err(FsError::Corrupted("root is not a container"));
        }

        info!(
            objects = store.object_count(),
            label = %volume::decode_label(&store.record().label),
            pool = opts.pool_capacity,
            "mounted"
        );
        Ok(Self {
            meta: Mutex::new(MetadataDomain { io, store }),
            pool: Mutex::new(ObjectPool::new(opts.pool_capacity)),
        })
    }

    /// Flushes and hands the device back.
    pub fn unmount(self) -> FsResult<IO> {
        let mut domain = self.meta.into_inner();
        domain.io.flush()?;
        info!("unmounted");
        Ok(domain.io)
    }

    /// Runs `f` on the device under the metadata lock.
    pub fn with_device<R>(&self, f: impl FnOnce(&IO) -> R) -> R {
        f(&self.meta.lock().io)
    }

    pub fn sync(&self) -> FsResult {
        self.meta.lock().io.flush()?;
        Ok(())
    }

    /// Creates `name` under `parent` and returns its identifier.
    ///
    /// Every rejection (bad name, duplicate, full container, no block,
    /// no identifier, table full) is detected before the first write.
    pub fn create_object(&self, parent: u64, name: &str, kind: ObjectKind) -> FsResult<u64> {
        validate_name(name)?;

        let mut guard = self.meta.lock();
        let domain = &mut *guard;

        let mut parent_rec = domain.container(parent)?;
        crate::ensure!(domain.dirs().lookup(&parent_rec, name)?.is_none(), FsError::Exists);
        crate::ensure!(
            parent_rec.child_slots < CELLFS_DIRENTS_PER_BLOCK as u64,
            FsError::NoSpace
        );
        let next_id = domain
            .store
            .peek(BitmapSpace::Identifiers)
            .ok_or(FsAllocatorError::Exhausted)?;
        domain
            .store
            .peek(BitmapSpace::Blocks)
            .ok_or(FsAllocatorError::Exhausted)?;
        crate::ensure!(domain.inodes().can_put(next_id)?, FsError::CapacityExceeded);

        let now = unix_now();
        let id = domain.store.allocate(&mut domain.io, BitmapSpace::Identifiers)?;
        let block = domain.store.allocate(&mut domain.io, BitmapSpace::Blocks)?;

        domain
            .io
            .zero_fill(block * CELLFS_BLOCK_SIZE as u64, CELLFS_BLOCK_SIZE)?;
        domain.io.flush()?;

        let rec = CellInode::new(id, kind, block, now);
        domain.inodes().put(&rec)?;
        domain.dirs().append(&mut parent_rec, name, id, now)?;

        debug!(parent, id, block, %kind, name, "object created");
        Ok(id)
    }

    /// Tombstones the entry, then returns the identifier and data block
    /// to their allocators. Containers must have no live children.
    pub fn remove_object(&self, parent: u64, id: u64, name: &str) -> FsResult {
        let mut guard = self.meta.lock();
        let domain = &mut *guard;

        let mut parent_rec = domain.container(parent)?;
        if domain.dirs().find_live(&parent_rec, id, name)?.is_none() {
            crate::bail!(FsError::NotFound);
        }
        crate::ensure!(id != CELLFS_ROOT_ID, FsError::Corrupted("root listed as a child"));
        let target = domain.inodes().get(id)?;
        if target.is_container() && domain.dirs().live_count(&target)? > 0 {
            return Err(FsError::NotEmpty);
        }

        domain.dirs().remove(&mut parent_rec, id, name, unix_now())?;
        domain.store.release(&mut domain.io, BitmapSpace::Identifiers, id)?;
        domain
            .store
            .release(&mut domain.io, BitmapSpace::Blocks, target.data_block)?;

        debug!(parent, id, block = target.data_block, name, "object removed");
        Ok(())
    }

    /// `Ok(None)` when `parent` has no live entry named `name`.
    pub fn lookup(&self, parent: u64, name: &str) -> FsResult<Option<u64>> {
        let mut domain = self.meta.lock();
        let parent_rec = domain.container(parent)?;
        domain.dirs().lookup(&parent_rec, name)
    }

    pub fn list_children(&self, parent: u64) -> FsResult<DirEntries> {
        let mut domain = self.meta.lock();
        let parent_rec = domain.container(parent)?;
        domain.dirs().entries(&parent_rec)
    }

    pub fn read_content(&self, id: u64, offset: u64, len: usize) -> FsResult<Vec<u8>> {
        let mut domain = self.meta.lock();
        let rec = domain.leaf(id)?;
        content::read(&mut domain.io, &rec, offset, len)
    }

    /// Returns the number of bytes written. The object's size becomes
    /// `offset + bytes.len()`.
    pub fn write_content(&self, id: u64, offset: u64, bytes: &[u8]) -> FsResult<usize> {
        let mut domain = self.meta.lock();
        let rec = domain.leaf(id)?;
        let (n, _) = domain.write_leaf(&rec, offset, bytes)?;
        Ok(n)
    }

    /// `NotFound` for identifiers not currently in use, even when a stale
    /// record still sits in the table.
    pub fn get_metadata(&self, id: u64) -> FsResult<ObjectMetadata> {
        let rec = self.meta.lock().inodes().get(id)?;
        ObjectMetadata::try_from(&rec)
    }

    pub fn statfs(&self) -> FsResult<FsStats> {
        let domain = self.meta.lock();
        let sb = domain.store.record();
        let reserved = CELLFS_FIRST_ALLOCATABLE;
        Ok(FsStats {
            block_size: sb.block_size,
            total_blocks: CELLFS_BITMAP_WIDTH - reserved,
            free_blocks: domain.store.remaining(BitmapSpace::Blocks) as u64,
            total_ids: CELLFS_BITMAP_WIDTH - reserved,
            free_ids: domain.store.remaining(BitmapSpace::Identifiers) as u64,
            object_count: sb.object_count,
            max_objects: CELLFS_MAX_OBJECTS,
            label: volume::decode_label(&sb.label),
            volume_id: sb.volume_id,
            created_at: sb.created_at,
        })
    }

    /// Pins `id` in the object pool.
    ///
    /// The handle is bound to this incarnation of `id`: once the object is
    /// removed, its operations fail with `NotFound` even after the
    /// identifier is handed to a new object.
    pub fn open(&self, id: u64) -> FsResult<ObjectRef<'_, IO>> {
        let rec = self.meta.lock().inodes().get(id)?;
        let generation = rec.generation;
        let slot = self.pool.lock().acquire(rec)?;
        Ok(ObjectRef {
            fs: self,
            id,
            generation,
            slot,
        })
    }

    /// Open handles right now.
    pub fn open_count(&self) -> usize {
        self.pool.lock().in_use()
    }

    pub fn check(&self) -> FsResult<VerifyReport> {
        self.check_with(&CellCheckOptions::default())
    }

    pub fn check_with(&self, opts: &CellCheckOptions) -> FsResult<VerifyReport> {
        let mut domain = self.meta.lock();
        let report = CellChecker::new(&mut domain.io).check_with(opts)?;
        Ok(report)
    }
}

/// An open object. Holds a pool slot until dropped.
pub struct ObjectRef<'fs, IO: CellIO> {
    fs: &'fs CellFs<IO>,
    id: u64,
    generation: u64,
    slot: usize,
}

impl<IO: CellIO> ObjectRef<'_, IO> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The pinned copy, as of open or the last write/refresh through this handle.
    pub fn metadata(&self) -> FsResult<ObjectMetadata> {
        let rec = self
            .fs
            .pool
            .lock()
            .get(self.slot)
            .copied()
            .ok_or(FsError::Other("pool slot vacated"))?;
        ObjectMetadata::try_from(&rec)
    }

    pub fn read(&self, offset: u64, len: usize) -> FsResult<Vec<u8>> {
        let mut domain = self.fs.meta.lock();
        let rec = domain.pinned_leaf(self.id, self.generation)?;
        content::read(&mut domain.io, &rec, offset, len)
    }

    pub fn write(&self, offset: u64, bytes: &[u8]) -> FsResult<usize> {
        let (n, rec) = {
            let mut domain = self.fs.meta.lock();
            let rec = domain.pinned_leaf(self.id, self.generation)?;
            domain.write_leaf(&rec, offset, bytes)?
        };
        self.fs.pool.lock().replace(self.slot, rec);
        Ok(n)
    }

    /// Reloads the pinned copy from the table.
    pub fn refresh(&self) -> FsResult {
        let rec = self.fs.meta.lock().pinned(self.id, self.generation)?;
        self.fs.pool.lock().replace(self.slot, rec);
        Ok(())
    }
}

impl<IO: CellIO> Drop for ObjectRef<'_, IO> {
    fn drop(&mut self) {
        self.fs.pool.lock().release(self.slot);
    }
}
