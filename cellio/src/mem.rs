// SPDX-License-Identifier: MIT

use crate::{CellIO, CellIOError, CellIOResult};

/// In-memory implementation of `CellIO` over a borrowed slice.
///
/// Used by tests and RAM-backed volumes. `flush` is a no-op.
#[derive(Debug)]
pub struct MemCellIO<'a> {
    buffer: &'a mut [u8],
}

impl<'a> MemCellIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer }
    }

    #[inline]
    fn range(&self, offset: u64, len: usize) -> CellIOResult<core::ops::Range<usize>> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(CellIOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(CellIOError::OutOfBounds);
        }
        Ok(offset as usize..end as usize)
    }
}

impl<'a> CellIO for MemCellIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> CellIOResult {
        let range = self.range(offset, data.len())?;
        self.buffer[range].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> CellIOResult {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[range]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> CellIOResult {
        Ok(())
    }

    #[inline]
    fn len_bytes(&self) -> Option<u64> {
        Some(self.buffer.len() as u64)
    }
}
