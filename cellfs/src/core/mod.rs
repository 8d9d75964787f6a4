// SPDX-License-Identifier: MIT

// === Sub-modules ===
pub mod allocator;
pub mod checker;
pub mod errors;
pub mod formatter;
pub mod macros;
pub mod utils;

// === Core Traits ===
pub mod traits {
    pub use super::allocator::FsAllocator;
    pub use super::checker::FsChecker;
    pub use super::formatter::FsFormatter;
}

// === Error types ===
pub use errors::*;

// === Utilities ===
pub use utils::{time_utils::*, volume::*};
