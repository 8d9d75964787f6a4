// SPDX-License-Identifier: MIT

use cellio::prelude::*;
use tracing::info;

pub use crate::core::formatter::*;

use crate::core::utils::{time_utils, volume};
use crate::fs::{constant::*, types::*};

/// Format-time settings.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Volume label, cut to 16 bytes.
    pub label: Option<String>,
    /// Generated from the clock when absent.
    pub volume_id: Option<[u8; 16]>,
    /// Device size in blocks. Probed from the backend when absent; if
    /// the backend cannot tell, the full bitmap width is assumed.
    pub device_blocks: Option<u64>,
}

impl FormatOptions {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_volume_id(mut self, id: [u8; 16]) -> Self {
        self.volume_id = Some(id);
        self
    }

    pub fn with_device_blocks(mut self, blocks: u64) -> Self {
        self.device_blocks = Some(blocks);
        self
    }
}

/// CellFormatter:
/// - Writes the superblock, a metadata table holding only the root, and
///   an empty root entry block.
/// - Clamps the block bitmap to the blocks the device actually has.
/// - Full format also zeroes every data block in that range.
pub struct CellFormatter<'a, IO: CellIO + ?Sized> {
    io: &'a mut IO,
    opts: FormatOptions,
}

impl<'a, IO: CellIO + ?Sized> CellFormatter<'a, IO> {
    pub fn new(io: &'a mut IO, opts: FormatOptions) -> Self {
        Self { io, opts }
    }

    fn device_blocks(&self) -> FsFormatterResult<u64> {
        self.opts
            .device_blocks
            .or_else(|| self.io.len_bytes().map(|b| b / CELLFS_BLOCK_SIZE as u64))
            .ok_or(FsFormatterError::Invalid(
                "device size unknown: set FormatOptions::device_blocks",
            ))
    }

    fn zero_blocks(&mut self, first: u64, last_exclusive: u64) -> FsFormatterResult {
        let len = (last_exclusive - first) as usize * CELLFS_BLOCK_SIZE;
        self.io.zero_fill(first * CELLFS_BLOCK_SIZE as u64, len)?;
        Ok(())
    }

    fn write_table(&mut self, now: u64) -> FsFormatterResult {
        let root = CellInode::new(
            CELLFS_ROOT_ID,
            ObjectKind::Container,
            CELLFS_ROOT_DATA_BLOCK,
            now,
        );
        self.io
            .write_struct(CELLFS_INODE_TABLE_BLOCK * CELLFS_BLOCK_SIZE as u64, &root)?;
        Ok(())
    }

    fn write_superblock(&mut self, device_blocks: u64, now: u64) -> FsFormatterResult<CellSuperblock> {
        let volume_id = self
            .opts
            .volume_id
            .unwrap_or_else(volume::generate_volume_id_128);
        let label = volume::encode_label(self.opts.label.as_deref().unwrap_or(""));

        let sb = CellSuperblock::new(device_blocks, now, volume_id, label);
        self.io
            .write_struct(CELLFS_SUPERBLOCK_BLOCK * CELLFS_BLOCK_SIZE as u64, &sb)?;
        Ok(sb)
    }
}

impl<IO: CellIO + ?Sized> FsFormatter for CellFormatter<'_, IO> {
    fn format(&mut self, full_format: bool) -> FsFormatterResult {
        let device_blocks = self.device_blocks()?;
        if device_blocks <= CELLFS_ROOT_DATA_BLOCK {
            return Err(FsFormatterError::Invalid(
                "device too small: need superblock, table and root blocks",
            ));
        }
        let usable = device_blocks.min(CELLFS_BITMAP_WIDTH);
        let now = time_utils::unix_now();

        let zero_end = if full_format {
            usable
        } else {
            CELLFS_ROOT_DATA_BLOCK + 1
        };
        self.zero_blocks(0, zero_end)?;
        self.write_table(now)?;
        self.flush()?;

        // Superblock last: an interrupted format never looks mountable.
        let sb = self.write_superblock(device_blocks, now)?;
        self.flush()?;

        info!(
            blocks = usable,
            full_format,
            label = %volume::decode_label(&sb.label),
            "formatted"
        );
        Ok(())
    }

    fn flush(&mut self) -> FsFormatterResult<()> {
        self.io.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::superblock::SuperblockStore;

    #[test]
    fn test_format_fresh_layout() {
        let mut buf = vec![0xFFu8; 64 * CELLFS_BLOCK_SIZE];
        let mut io = MemCellIO::new(&mut buf);
        let opts = FormatOptions::default()
            .with_label("scratch")
            .with_volume_id([7; 16]);
        CellFormatter::new(&mut io, opts).format(false).unwrap();

        let store = SuperblockStore::load(&mut io).unwrap();
        let sb = store.record();
        assert_eq!(sb.object_count, 1);
        assert_eq!(sb.volume_id, [7; 16]);
        assert_eq!(volume::decode_label(&sb.label), "scratch");
        assert_eq!(sb.free_blocks.count_ones(), 61);
        assert_eq!(sb.free_ids.count_ones(), 62);

        let root: CellInode = io.read_struct(CELLFS_BLOCK_SIZE as u64).unwrap();
        assert_eq!(root.id, CELLFS_ROOT_ID);
        assert!(root.is_container());
        assert_eq!(root.data_block, CELLFS_ROOT_DATA_BLOCK);
        assert_eq!(root.child_slots, 0);

        drop(io);
        let root_block = &buf[2 * CELLFS_BLOCK_SIZE..3 * CELLFS_BLOCK_SIZE];
        assert!(root_block.iter().all(|&b| b == 0));
        // Quick format leaves data blocks alone.
        assert_eq!(buf[3 * CELLFS_BLOCK_SIZE], 0xFF);
    }

    #[test]
    fn test_full_format_zeroes_data() {
        let mut buf = vec![0xFFu8; 8 * CELLFS_BLOCK_SIZE];
        let mut io = MemCellIO::new(&mut buf);
        CellFormatter::new(&mut io, FormatOptions::default())
            .format(true)
            .unwrap();
        drop(io);
        assert!(buf[3 * CELLFS_BLOCK_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_small_device_clamps_and_rejects() {
        let mut buf = vec![0u8; 6 * CELLFS_BLOCK_SIZE];
        let mut io = MemCellIO::new(&mut buf);
        CellFormatter::new(&mut io, FormatOptions::default())
            .format(false)
            .unwrap();
        let store = SuperblockStore::load(&mut io).unwrap();
        assert_eq!(store.record().free_blocks.count_ones(), 3);

        let mut tiny = vec![0u8; 2 * CELLFS_BLOCK_SIZE];
        let mut io = MemCellIO::new(&mut tiny);
        assert!(matches!(
            CellFormatter::new(&mut io, FormatOptions::default()).format(false),
            Err(FsFormatterError::Invalid(_))
        ));
    }

    /// Device that cannot report its length.
    struct Unsized<'a>(MemCellIO<'a>);

    impl CellIO for Unsized<'_> {
        fn write_at(&mut self, offset: u64, data: &[u8]) -> CellIOResult {
            self.0.write_at(offset, data)
        }
        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> CellIOResult {
            self.0.read_at(offset, buf)
        }
        fn flush(&mut self) -> CellIOResult {
            self.0.flush()
        }
    }

    #[test]
    fn test_unknown_size_needs_explicit_geometry() {
        let mut buf = vec![0u8; 8 * CELLFS_BLOCK_SIZE];
        let mut io = Unsized(MemCellIO::new(&mut buf));
        assert!(matches!(
            CellFormatter::new(&mut io, FormatOptions::default()).format(false),
            Err(FsFormatterError::Invalid(_))
        ));

        CellFormatter::new(&mut io, FormatOptions::default().with_device_blocks(8))
            .format(false)
            .unwrap();
        let store = SuperblockStore::load(&mut io).unwrap();
        assert_eq!(store.record().free_blocks.count_ones(), 5);
    }
}
