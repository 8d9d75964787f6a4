// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::constant::*;

/// Directory entry, packed densely in the container's data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CellDirent {
    pub id: u64,
    pub state: u8,
    pub name_len: u8,
    pub name: [u8; CELLFS_NAME_MAX],
}

impl CellDirent {
    pub fn empty() -> Self {
        Self {
            id: 0,
            state: CELLFS_DIRENT_UNUSED,
            name_len: 0,
            name: [0; CELLFS_NAME_MAX],
        }
    }

    /// Live entry. `name` must already be validated.
    pub fn live(name: &str, id: u64) -> Self {
        let bytes = name.as_bytes();
        let len = bytes.len().min(CELLFS_NAME_MAX);
        let mut raw = [0u8; CELLFS_NAME_MAX];
        raw[..len].copy_from_slice(&bytes[..len]);
        Self {
            id,
            state: CELLFS_DIRENT_LIVE,
            name_len: len as u8,
            name: raw,
        }
    }

    pub fn is_live(&self) -> bool {
        self.state == CELLFS_DIRENT_LIVE
    }

    pub fn is_tombstone(&self) -> bool {
        self.state == CELLFS_DIRENT_TOMBSTONE
    }

    pub fn name_bytes(&self) -> &[u8] {
        let len = (self.name_len as usize).min(CELLFS_NAME_MAX);
        &self.name[..len]
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }

    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }
}
