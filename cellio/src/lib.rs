// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod errors;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::CellIO;
    pub use super::CellIOExt;
    pub use super::CellIOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemCellIO;

    #[cfg(feature = "std")]
    pub use super::std::StdCellIO;
}

// Internal use
use errors::*;

// Constants

/// Size of the internal scratch buffer used by zero fill and struct reads.
/// 4 KiB = one cellfs block, also the typical page size.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Block IO abstraction trait.
///
/// Byte addressed read, write and flush.
/// Implementations may target RAM, image files or raw block devices.
pub trait CellIO {
    /// Writes `data` at `offset` (absolute).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> CellIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> CellIOResult;

    /// Forces buffered data to stable storage.
    ///
    /// Callers rely on this for durability: once `flush` returns, every
    /// preceding write must survive a crash of the process.
    fn flush(&mut self) -> CellIOResult;

    /// Size of the addressable region in bytes, if known.
    fn len_bytes(&self) -> Option<u64> {
        None
    }
}

/// Block addressed helpers over [`CellIO`].
pub trait CellIOExt: CellIO {
    /// Reads block `index` into `buf`; `buf.len()` is the block size.
    #[inline]
    fn read_block(&mut self, index: u64, buf: &mut [u8]) -> CellIOResult {
        if buf.is_empty() {
            return Err(CellIOError::Invalid("read_block: empty buffer"));
        }
        let offset = index
            .checked_mul(buf.len() as u64)
            .ok_or(CellIOError::OutOfBounds)?;
        self.read_at(offset, buf)
    }

    /// Fills a region with zeroes. Not durable until [`CellIO::flush`].
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> CellIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }
}

impl<T: CellIO + ?Sized> CellIOExt for T {}

/// Extension trait for reading and writing structs using zerocopy.
///
/// Requires the struct to implement zerocopy traits for safe conversion.
pub trait CellIOStructExt: CellIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> CellIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(CellIOError::Invalid("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| CellIOError::Other("read_struct failed"))
    }

    /// Writes a struct of type `T` at the given offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> CellIOResult {
        let bytes = val.as_bytes();
        self.write_at(offset, bytes)
    }
}

impl<T: CellIO + ?Sized> CellIOStructExt for T {}
