// SPDX-License-Identifier: MIT
// cellfs/fs/constant.rs

// === Superblock ===

pub const CELLFS_MAGIC: u64 = 0x2020_0406;
pub const CELLFS_VERSION: u64 = 1;

// === Geometry ===

pub const CELLFS_BLOCK_SIZE: usize = 4096;

pub const CELLFS_SUPERBLOCK_BLOCK: u64 = 0;
pub const CELLFS_INODE_TABLE_BLOCK: u64 = 1;
pub const CELLFS_ROOT_DATA_BLOCK: u64 = 2;

// === Bitmaps ===

// One u64 word per bitmap, bit set = free.
pub const CELLFS_BITMAP_WIDTH: u64 = 64;

// Indices 0 and 1 are never handed out by either allocator.
pub const CELLFS_FIRST_ALLOCATABLE: u64 = 2;

// === Identifiers ===

pub const CELLFS_ROOT_ID: u64 = 1;

// === Metadata table ===

pub const CELLFS_INODE_SIZE: usize = 64;
pub const CELLFS_INODES_PER_BLOCK: usize = CELLFS_BLOCK_SIZE / CELLFS_INODE_SIZE;

// Hard ceiling on table slots: whichever is smaller of the identifier
// space and what fits in the single table block.
pub const CELLFS_MAX_OBJECTS: u64 = if (CELLFS_INODES_PER_BLOCK as u64) < CELLFS_BITMAP_WIDTH {
    CELLFS_INODES_PER_BLOCK as u64
} else {
    CELLFS_BITMAP_WIDTH
};

pub const CELLFS_KIND_CONTAINER: u32 = 1;
pub const CELLFS_KIND_LEAF: u32 = 2;

// === Directory entries ===

pub const CELLFS_DIRENT_SIZE: usize = 64;
pub const CELLFS_DIRENTS_PER_BLOCK: usize = CELLFS_BLOCK_SIZE / CELLFS_DIRENT_SIZE;
pub const CELLFS_NAME_MAX: usize = 54;

pub const CELLFS_DIRENT_UNUSED: u8 = 0;
pub const CELLFS_DIRENT_LIVE: u8 = 1;
pub const CELLFS_DIRENT_TOMBSTONE: u8 = 2;

// === Runtime ===

pub const CELLFS_DEFAULT_POOL_CAPACITY: usize = 32;
pub const CELLFS_LABEL_LEN: usize = 16;
