// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsAllocatorError, FsAllocatorResult};

/// Trait for managing allocation of logical units in a filesystem.
///
/// `Unit` is whatever the allocator hands out: a block number, an
/// object identifier. Implementations scan deterministically so that
/// the same sequence of calls always yields the same units.
pub trait FsAllocator<Unit: Copy> {
    /// Takes the next free unit.
    fn allocate_unit(&mut self) -> FsAllocatorResult<Unit>;

    /// Returns `unit` to the free pool.
    fn release_unit(&mut self, unit: Unit) -> FsAllocatorResult;

    /// The unit the next `allocate_unit` would return, without taking it.
    fn peek_unit(&self) -> Option<Unit>;

    /// Number of units currently used.
    fn used_units(&self) -> usize;

    /// Number of remaining units.
    fn remaining_units(&self) -> usize;
}
