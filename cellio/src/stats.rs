// SPDX-License-Identifier: MIT

use crate::{CellIO, CellIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,

    // Writes issued since the last flush; zero means everything is durable.
    pub unflushed_writes: u64,
}

impl IoStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = IoStats::default();
    }
}

/// Transparent instrumentation wrapper.
///
/// Used by tests and by the CLI `info` command to observe how many
/// device round trips an operation costs.
#[derive(Debug)]
pub struct IOCounter<IO: CellIO> {
    inner: IO,
    pub stats: IoStats,
}

impl<IO: CellIO> IOCounter<IO> {
    #[inline]
    pub fn new(inner: IO) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> IoStats {
        self.stats
    }

    #[inline]
    pub fn into_inner(self) -> IO {
        self.inner
    }
}

impl<IO: CellIO> CellIO for IOCounter<IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> CellIOResult {
        self.stats.writes += 1;
        self.stats.write_bytes += data.len() as u64;
        self.stats.unflushed_writes += 1;
        self.inner.write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> CellIOResult {
        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;
        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> CellIOResult {
        self.stats.flushes += 1;
        self.stats.unflushed_writes = 0;
        self.inner.flush()
    }

    #[inline]
    fn len_bytes(&self) -> Option<u64> {
        self.inner.len_bytes()
    }
}
