// SPDX-License-Identifier: MIT

use tracing::trace;

use crate::core::errors::*;
use crate::fs::types::CellInode;

/// Fixed-capacity arena of pinned metadata copies.
///
/// Slots are recycled lowest-index first, so the same sequence of
/// acquire/release calls always lands on the same slots.
#[derive(Debug)]
pub struct ObjectPool {
    slots: Vec<Option<CellInode>>,
    free: Vec<usize>,
}

impl ObjectPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            // Popped from the back, so keep the lowest index last.
            free: (0..capacity).rev().collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn in_use(&self) -> usize {
        self.capacity() - self.free.len()
    }

    /// Pins a copy of `rec`; fails with `PoolExhausted` when full.
    pub fn acquire(&mut self, rec: CellInode) -> FsResult<usize> {
        let slot = self.free.pop().ok_or(FsError::PoolExhausted)?;
        self.slots[slot] = Some(rec);
        trace!(slot, id = rec.id, "pool acquire");
        Ok(slot)
    }

    pub fn get(&self, slot: usize) -> Option<&CellInode> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Replaces the pinned copy; ignored for a slot not in use.
    pub fn replace(&mut self, slot: usize, rec: CellInode) {
        if let Some(Some(pinned)) = self.slots.get_mut(slot) {
            *pinned = rec;
        }
    }

    pub fn release(&mut self, slot: usize) {
        let Some(entry) = self.slots.get_mut(slot) else {
            return;
        };
        if entry.take().is_none() {
            return;
        }
        // Keep the free list sorted descending so `pop` yields the lowest.
        let at = self.free.partition_point(|&s| s > slot);
        self.free.insert(at, slot);
        trace!(slot, "pool release");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::types::ObjectKind;

    fn rec(id: u64) -> CellInode {
        CellInode::new(id, ObjectKind::Leaf, 3, 0)
    }

    #[test]
    fn test_bounded_and_deterministic() {
        let mut pool = ObjectPool::new(3);
        assert_eq!(pool.acquire(rec(2)).unwrap(), 0);
        assert_eq!(pool.acquire(rec(3)).unwrap(), 1);
        assert_eq!(pool.acquire(rec(4)).unwrap(), 2);
        assert_eq!(pool.acquire(rec(5)), Err(FsError::PoolExhausted));

        pool.release(1);
        pool.release(0);
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.acquire(rec(6)).unwrap(), 0);
        assert_eq!(pool.acquire(rec(7)).unwrap(), 1);
    }

    #[test]
    fn test_double_release_is_ignored() {
        let mut pool = ObjectPool::new(2);
        let s = pool.acquire(rec(2)).unwrap();
        pool.release(s);
        pool.release(s);
        pool.release(99);
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.acquire(rec(3)).unwrap(), 0);
        assert_eq!(pool.acquire(rec(4)).unwrap(), 1);
    }

    #[test]
    fn test_replace_updates_pinned_copy() {
        let mut pool = ObjectPool::new(1);
        let s = pool.acquire(rec(2)).unwrap();
        let mut newer = rec(2);
        newer.size = 9;
        pool.replace(s, newer);
        assert_eq!(pool.get(s).map(|r| r.size), Some(9));
        pool.release(s);
        assert!(pool.get(s).is_none());
    }
}
