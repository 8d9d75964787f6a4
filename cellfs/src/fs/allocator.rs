// SPDX-License-Identifier: MIT

pub use crate::core::allocator::*;

use crate::core::utils::bitmap::BitmapOps;
use crate::fs::constant::*;
use crate::fs::types::CellSuperblock;

/// Which superblock bitmap an allocator works on. Both share the scan
/// policy and differ only in namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapSpace {
    Blocks,
    Identifiers,
}

/// Lowest-free-first allocator over one superblock bitmap.
///
/// Works on a record copy; the caller persists it. Indices below
/// [`CELLFS_FIRST_ALLOCATABLE`] are never handed out nor accepted back.
pub struct BitmapAllocator<'a> {
    bitmap: &'a mut u64,
}

impl<'a> BitmapAllocator<'a> {
    pub fn new(sb: &'a mut CellSuperblock, space: BitmapSpace) -> Self {
        let bitmap = match space {
            BitmapSpace::Blocks => &mut sb.free_blocks,
            BitmapSpace::Identifiers => &mut sb.free_ids,
        };
        Self { bitmap }
    }

    /// Allocator over a bare word, for callers without a superblock.
    pub fn from_word(bitmap: &'a mut u64) -> Self {
        Self { bitmap }
    }

    const START: usize = CELLFS_FIRST_ALLOCATABLE as usize;
    const END: usize = CELLFS_BITMAP_WIDTH as usize;
}

impl FsAllocator<u64> for BitmapAllocator<'_> {
    fn allocate_unit(&mut self) -> FsAllocatorResult<u64> {
        let bit = self
            .bitmap
            .find_first_set(Self::START, Self::END)
            .ok_or(FsAllocatorError::Exhausted)?;
        self.bitmap.set_bit(bit, false);
        Ok(bit as u64)
    }

    fn release_unit(&mut self, unit: u64) -> FsAllocatorResult {
        crate::ensure!(unit < CELLFS_BITMAP_WIDTH, FsAllocatorError::OutOfRange(unit));
        crate::ensure!(unit >= CELLFS_FIRST_ALLOCATABLE, FsAllocatorError::Reserved(unit));
        crate::ensure!(!self.bitmap.get_bit(unit as usize), FsAllocatorError::AlreadyFree(unit));
        self.bitmap.set_bit(unit as usize, true);
        Ok(())
    }

    fn peek_unit(&self) -> Option<u64> {
        self.bitmap
            .find_first_set(Self::START, Self::END)
            .map(|b| b as u64)
    }

    fn used_units(&self) -> usize {
        (Self::END - Self::START) - self.remaining_units()
    }

    fn remaining_units(&self) -> usize {
        self.bitmap.count_ones_in_range(Self::START, Self::END)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lowest_free_first_and_reuse() {
        let mut word = u64::MAX;
        let mut alloc = BitmapAllocator::from_word(&mut word);
        assert_eq!(alloc.allocate_unit().unwrap(), 2);
        assert_eq!(alloc.allocate_unit().unwrap(), 3);
        assert_eq!(alloc.allocate_unit().unwrap(), 4);
        alloc.release_unit(3).unwrap();
        assert_eq!(alloc.peek_unit(), Some(3));
        assert_eq!(alloc.allocate_unit().unwrap(), 3);
    }

    #[test]
    fn test_exhaustion_never_wraps_to_reserved() {
        let mut word = u64::MAX;
        let mut alloc = BitmapAllocator::from_word(&mut word);
        let mut seen = HashSet::new();
        for _ in 0..62 {
            let unit = alloc.allocate_unit().unwrap();
            assert!(unit >= 2 && unit < 64);
            assert!(seen.insert(unit), "unit {unit} handed out twice");
        }
        assert_eq!(alloc.allocate_unit(), Err(FsAllocatorError::Exhausted));
        assert_eq!(alloc.remaining_units(), 0);
        assert_eq!(alloc.used_units(), 62);
    }

    #[test]
    fn test_release_guards() {
        let mut word = u64::MAX;
        let mut alloc = BitmapAllocator::from_word(&mut word);
        assert_eq!(alloc.release_unit(1), Err(FsAllocatorError::Reserved(1)));
        assert_eq!(alloc.release_unit(64), Err(FsAllocatorError::OutOfRange(64)));
        assert_eq!(alloc.release_unit(5), Err(FsAllocatorError::AlreadyFree(5)));
    }

    #[test]
    fn test_interleaved_uniqueness() {
        let mut word = u64::MAX;
        let mut alloc = BitmapAllocator::from_word(&mut word);
        let mut live: Vec<u64> = Vec::new();
        // Deterministic mix of allocations and releases.
        for step in 0..200u64 {
            if step % 3 == 2 && !live.is_empty() {
                let victim = live.remove((step as usize * 7) % live.len());
                alloc.release_unit(victim).unwrap();
            } else if let Ok(unit) = alloc.allocate_unit() {
                assert!(!live.contains(&unit));
                live.push(unit);
            }
        }
        assert_eq!(alloc.used_units(), live.len());
    }
}
