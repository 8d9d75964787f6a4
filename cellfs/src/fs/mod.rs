// SPDX-License-Identifier: MIT

pub mod allocator;
pub mod checker;
pub mod constant;
pub mod content;
pub mod directory;
pub mod filesystem;
pub mod formatter;
pub mod inode_table;
pub mod pool;
pub mod superblock;
pub mod types;

// === Public Interface ===
pub mod traits {
    pub use super::allocator::{BitmapAllocator, BitmapSpace};
    pub use super::checker::{CellCheckOptions, CellChecker};
    pub use super::formatter::{CellFormatter, FormatOptions};
}

pub mod prelude {
    pub use super::constant::*;
    pub use super::directory::{DirEntries, DirEntry};
    pub use super::filesystem::{CellFs, FsStats, MountOptions, ObjectMetadata, ObjectRef};
    pub use super::traits::*;
    pub use super::types::ObjectKind;
    pub use crate::core::checker::{Finding, ReportDisplayOpts, Severity, VerifyPhases, VerifyReport};
    pub use crate::core::errors::*;
    pub use crate::core::traits::*;
    pub use cellio::prelude::*;
}
