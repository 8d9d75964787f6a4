// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::core::utils::bitmap::BitmapOps;
use crate::fs::constant::*;

/// Block 0. Every allocator decision and the table length live here.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CellSuperblock {
    pub version: u64,
    pub magic: u64,
    pub block_size: u64,
    /// Table slots in use (append cursor of the metadata table).
    pub object_count: u64,
    /// Bit set = block free.
    pub free_blocks: u64,
    /// Bit set = identifier free.
    pub free_ids: u64,
    /// Unix seconds.
    pub created_at: u64,
    pub volume_id: [u8; 16],
    pub label: [u8; CELLFS_LABEL_LEN],
    pub padding: [u8; 4008],
}

impl CellSuperblock {
    /// Superblock of a freshly formatted image whose device holds
    /// `device_blocks` blocks. Only the root object exists.
    pub fn new(
        device_blocks: u64,
        created_at: u64,
        volume_id: [u8; 16],
        label: [u8; CELLFS_LABEL_LEN],
    ) -> Self {
        let usable = device_blocks.min(CELLFS_BITMAP_WIDTH) as usize;

        let mut free_blocks = 0u64;
        free_blocks.fill_range(CELLFS_FIRST_ALLOCATABLE as usize, usable, true);
        free_blocks.set_bit(CELLFS_ROOT_DATA_BLOCK as usize, false);

        let mut free_ids = 0u64;
        free_ids.fill_range(
            CELLFS_FIRST_ALLOCATABLE as usize,
            CELLFS_BITMAP_WIDTH as usize,
            true,
        );

        Self {
            version: CELLFS_VERSION,
            magic: CELLFS_MAGIC,
            block_size: CELLFS_BLOCK_SIZE as u64,
            object_count: 1,
            free_blocks,
            free_ids,
            created_at,
            volume_id,
            label,
            padding: [0u8; 4008],
        }
    }

    pub fn is_block_free(&self, block: u64) -> bool {
        self.free_blocks.get_bit(block as usize)
    }

    pub fn is_id_free(&self, id: u64) -> bool {
        self.free_ids.get_bit(id as usize)
    }
}
