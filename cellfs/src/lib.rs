// SPDX-License-Identifier: MIT

//! Bitmap-allocated object storage on a block device.
//!
//! Block 0 holds the superblock with both allocation bitmaps, block 1 the
//! metadata table, and every object owns exactly one further block: its
//! content (leaf) or its directory entries (container).
//!
//! ```no_run
//! use cellfs::prelude::*;
//!
//! let mut buf = vec![0u8; 64 * CELLFS_BLOCK_SIZE];
//! let mut io = MemCellIO::new(&mut buf);
//! CellFormatter::new(&mut io, FormatOptions::default()).format(false)?;
//!
//! let fs = CellFs::mount(io)?;
//! let id = fs.create_object(CELLFS_ROOT_ID, "a.txt", ObjectKind::Leaf)?;
//! fs.write_content(id, 0, b"hello")?;
//! assert_eq!(fs.read_content(id, 3, 10)?, b"lo");
//! # Ok::<(), FsError>(())
//! ```

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use crate::core::traits::*;

// Utilities
pub use crate::core::utils::{time_utils::*, volume::*};

pub use fs::prelude;
