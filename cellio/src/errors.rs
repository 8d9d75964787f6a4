// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for CellIO operations.
pub type CellIOResult<T = ()> = core::result::Result<T, CellIOError>;

/// Error type for CellIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellIOError {
    Other(&'static str),
    Invalid(&'static str),
    OutOfBounds,
    Unsupported,
}

impl CellIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            CellIOError::Other(msg) => msg,
            CellIOError::Invalid(msg) => msg,
            CellIOError::OutOfBounds => "Out of bounds",
            CellIOError::Unsupported => "Unsupported operation",
        }
    }
}

impl From<&'static str> for CellIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        CellIOError::Other(msg)
    }
}

impl fmt::Display for CellIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CellIOError {}
