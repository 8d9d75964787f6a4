// SPDX-License-Identifier: MIT

mod dirent;
mod inode;
mod superblock;

pub use dirent::*;
pub use inode::*;
pub use superblock::*;

use crate::core::errors::{FsError, FsResult};
use crate::fs::constant::*;

/// What an object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Holds directory entries in its data block.
    Container,
    /// Holds up to one block of bytes.
    Leaf,
}

impl ObjectKind {
    pub fn to_raw(self) -> u32 {
        match self {
            ObjectKind::Container => CELLFS_KIND_CONTAINER,
            ObjectKind::Leaf => CELLFS_KIND_LEAF,
        }
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            CELLFS_KIND_CONTAINER => Some(ObjectKind::Container),
            CELLFS_KIND_LEAF => Some(ObjectKind::Leaf),
            _ => None,
        }
    }

    pub fn is_container(self) -> bool {
        self == ObjectKind::Container
    }
}

impl core::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ObjectKind::Container => "container",
            ObjectKind::Leaf => "leaf",
        })
    }
}

/// Rejects names no directory entry may carry.
pub fn validate_name(name: &str) -> FsResult {
    if name.is_empty() || name == "." || name == ".." {
        return Err(FsError::InvalidName);
    }
    if name.bytes().any(|b| b == b'/' || b == 0) {
        return Err(FsError::InvalidName);
    }
    if name.len() > CELLFS_NAME_MAX {
        return Err(FsError::NameTooLong);
    }
    Ok(())
}
