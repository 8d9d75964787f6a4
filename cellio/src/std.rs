// SPDX-License-Identifier: MIT

use std::io::{Error, Read, Seek, SeekFrom, Write};

use crate::{CellIO, CellIOError, CellIOResult};

/// `CellIO` over any seekable stream (image files, raw block devices).
///
/// `flush` flushes the stream; for `std::fs::File` it additionally
/// syncs data to the device, see [`StdCellIO::with_sync`].
///
/// The stream length is read once at construction and then grows with
/// writes past the end.
#[derive(Debug)]
pub struct StdCellIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    len: Option<u64>,
    sync: Option<fn(&mut T) -> std::io::Result<()>>,
}

impl<'a, T: Read + Write + Seek> StdCellIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        let len = io.seek(SeekFrom::End(0)).ok();
        Self {
            io,
            len,
            sync: None,
        }
    }

    /// Runs `sync` after every flush.
    #[inline]
    pub fn with_sync(mut self, sync: fn(&mut T) -> std::io::Result<()>) -> Self {
        self.sync = Some(sync);
        self
    }
}

impl<'a> StdCellIO<'a, std::fs::File> {
    /// File backend whose `flush` ends with `File::sync_data`.
    #[inline]
    pub fn durable(io: &'a mut std::fs::File) -> Self {
        Self::new(io).with_sync(|f| f.sync_data())
    }
}

impl<'a, T: Read + Write + Seek> CellIO for StdCellIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> CellIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.write_all(data)?;
        let end = offset + data.len() as u64;
        if let Some(len) = self.len.as_mut() {
            *len = (*len).max(end);
        }
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> CellIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> CellIOResult {
        self.io.flush()?;
        if let Some(sync) = self.sync {
            sync(&mut *self.io)?;
        }
        Ok(())
    }

    #[inline]
    fn len_bytes(&self) -> Option<u64> {
        self.len
    }
}

impl From<Error> for CellIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return CellIOError::OutOfBounds;
        }
        // Leaked once per distinct failure; error paths only.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        CellIOError::Other(leaked_str)
    }
}
