// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::types::ObjectKind;

/// One metadata table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CellInode {
    pub kind: u32,
    pub flags: u32,
    pub id: u64,
    pub data_block: u64,
    /// Bytes of content; leaves only.
    pub size: u64,
    /// Directory entry slots ever appended; containers only. Never
    /// decremented, tombstoned slots included.
    pub child_slots: u64,
    pub created_at: u64,
    pub modified_at: u64,
    /// Bumped each time a released identifier's slot is reused.
    pub generation: u64,
}

impl CellInode {
    /// Record for a brand new object. All fields are set, so writing it
    /// over a stale slot leaves nothing behind.
    pub fn new(id: u64, kind: ObjectKind, data_block: u64, now: u64) -> Self {
        Self {
            kind: kind.to_raw(),
            flags: 0,
            id,
            data_block,
            size: 0,
            child_slots: 0,
            created_at: now,
            modified_at: now,
            generation: 0,
        }
    }

    pub fn object_kind(&self) -> Option<ObjectKind> {
        ObjectKind::from_raw(self.kind)
    }

    pub fn is_container(&self) -> bool {
        self.object_kind() == Some(ObjectKind::Container)
    }
}
