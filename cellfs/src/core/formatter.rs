// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsFormatterError, FsFormatterResult};

/// A Formatter for a filesystem type.
///
/// Implementations hold their I/O backend and options and lay down the
/// initial on-disk structures.
///
/// A *full format* zeroes every data block; a quick format only writes
/// the metadata blocks.
pub trait FsFormatter {
    /// Format the filesystem.
    ///
    /// - `full_format`: if `true`, zero the whole data region as well
    #[must_use = "format result must be checked for errors"]
    fn format(&mut self, full_format: bool) -> FsFormatterResult;

    /// Flush any buffered writes to disk.
    #[must_use = "flush result must be checked for errors"]
    fn flush(&mut self) -> FsFormatterResult<()> {
        Ok(())
    }
}
