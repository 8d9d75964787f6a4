// SPDX-License-Identifier: MIT

//! Error taxonomy.
//!
//! Every layer owns a small `Copy` enum; [`FsError`] is what the public
//! filesystem operations return. Recoverability by class:
//!
//! | Class | Variants | Caller action |
//! |-------|----------|---------------|
//! | fatal at mount | `IncompatibleFormat`, `Corrupted` | abort the mount |
//! | out of resources | `Allocator(Exhausted)`, `CapacityExceeded`, `NoSpace`, `PoolExhausted` | report "no space", retrying is pointless until something is freed |
//! | negative result | `NotFound` | normal outcome |
//! | input validation | `NameTooLong`, `InvalidName`, `Exists`, `NotDirectory`, `IsDirectory`, `NotEmpty` | reject the single operation |
//! | device | `IO` | surface to the caller |

pub use cellio::errors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsAllocatorError {
    /// No free bit left in the allocatable range.
    Exhausted,
    /// Release of an index whose bit is already free.
    AlreadyFree(u64),
    /// Release of a permanently reserved index.
    Reserved(u64),
    /// Index past the bitmap width.
    OutOfRange(u64),
    IO(CellIOError),
    Other(&'static str),
}

impl FsAllocatorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsAllocatorError::Exhausted => "No free units left",
            FsAllocatorError::AlreadyFree(_) => "Unit released twice",
            FsAllocatorError::Reserved(_) => "Unit is reserved",
            FsAllocatorError::OutOfRange(_) => "Unit out of bitmap range",
            FsAllocatorError::IO(_) => "IO error",
            FsAllocatorError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsAllocatorError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsFormatterError {
    IO(CellIOError),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsFormatterError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsFormatterError::IO(_) => "IO error",
            FsFormatterError::Invalid(msg) => msg,
            FsFormatterError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsFormatterError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCheckerError {
    IO(CellIOError),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsCheckerError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCheckerError::IO(_) => "IO error",
            FsCheckerError::Invalid(msg) => msg,
            FsCheckerError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsCheckerError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(CellIOError),
    Allocator(FsAllocatorError),
    Formatter(FsFormatterError),
    Checker(FsCheckerError),
    /// Bad magic, block size or version at mount.
    IncompatibleFormat(&'static str),
    /// Metadata table reached its slot ceiling.
    CapacityExceeded,
    NotFound,
    NameTooLong,
    InvalidName,
    /// Write past the single data block, or container entry block full.
    NoSpace,
    Exists,
    NotDirectory,
    IsDirectory,
    NotEmpty,
    PoolExhausted,
    /// On-disk state contradicts an invariant.
    Corrupted(&'static str),
    Other(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Allocator(e) => e.msg(),
            FsError::Formatter(e) => e.msg(),
            FsError::Checker(e) => e.msg(),
            FsError::IncompatibleFormat(msg) => msg,
            FsError::CapacityExceeded => "Object table is full",
            FsError::NotFound => "Not found",
            FsError::NameTooLong => "Name too long",
            FsError::InvalidName => "Invalid name",
            FsError::NoSpace => "No space left in block",
            FsError::Exists => "Name already exists",
            FsError::NotDirectory => "Not a container",
            FsError::IsDirectory => "Is a container",
            FsError::NotEmpty => "Container not empty",
            FsError::PoolExhausted => "Object pool exhausted",
            FsError::Corrupted(msg) => msg,
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Allocator(e) => e.source(),
            FsError::Formatter(e) => e.source(),
            FsError::Checker(e) => e.source(),
            FsError::IO(_)
            | FsError::IncompatibleFormat(_)
            | FsError::CapacityExceeded
            | FsError::NotFound
            | FsError::NameTooLong
            | FsError::InvalidName
            | FsError::NoSpace
            | FsError::Exists
            | FsError::NotDirectory
            | FsError::IsDirectory
            | FsError::NotEmpty
            | FsError::PoolExhausted
            | FsError::Corrupted(_)
            | FsError::Other(_) => None,
        }
    }

    /// True for allocator exhaustion (blocks or identifiers).
    pub fn is_exhausted(&self) -> bool {
        matches!(self, FsError::Allocator(FsAllocatorError::Exhausted))
    }

    /// POSIX errno a filesystem driver would report for this error.
    ///
    /// Exhaustive on purpose: a new variant must pick its errno.
    pub fn to_errno(&self) -> i32 {
        const EIO: i32 = 5;
        const ENOENT: i32 = 2;
        const ENOMEM: i32 = 12;
        const EEXIST: i32 = 17;
        const ENOTDIR: i32 = 20;
        const EISDIR: i32 = 21;
        const EINVAL: i32 = 22;
        const ENOSPC: i32 = 28;
        const ENAMETOOLONG: i32 = 36;
        const ENOTEMPTY: i32 = 39;

        match self {
            FsError::IO(_) => EIO,
            FsError::Allocator(FsAllocatorError::Exhausted) => ENOSPC,
            FsError::Allocator(FsAllocatorError::IO(_)) => EIO,
            FsError::Allocator(
                FsAllocatorError::AlreadyFree(_)
                | FsAllocatorError::Reserved(_)
                | FsAllocatorError::OutOfRange(_)
                | FsAllocatorError::Other(_),
            ) => EINVAL,
            FsError::Formatter(_) => EINVAL,
            FsError::Checker(_) => EIO,
            FsError::IncompatibleFormat(_) => EINVAL,
            FsError::CapacityExceeded => ENOSPC,
            FsError::NotFound => ENOENT,
            FsError::NameTooLong => ENAMETOOLONG,
            FsError::InvalidName => EINVAL,
            FsError::NoSpace => ENOSPC,
            FsError::Exists => EEXIST,
            FsError::NotDirectory => ENOTDIR,
            FsError::IsDirectory => EISDIR,
            FsError::NotEmpty => ENOTEMPTY,
            FsError::PoolExhausted => ENOMEM,
            FsError::Corrupted(_) => EIO,
            FsError::Other(_) => EIO,
        }
    }
}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsAllocatorResult<T = ()> = Result<T, FsAllocatorError>;
pub type FsFormatterResult<T = ()> = Result<T, FsFormatterError>;
pub type FsCheckerResult<T = ()> = Result<T, FsCheckerError>;

crate::fs_error_wiring! {
    top => FsError {
        CellIOError      : IO,
        FsAllocatorError : Allocator,
        FsFormatterError : Formatter,
        FsCheckerError   : Checker,
    },
    str_into => [
        FsAllocatorError,
        FsFormatterError,
        FsCheckerError,
    ],
    sub => {
        CellIOError => [ FsAllocatorError::IO, FsFormatterError::IO, FsCheckerError::IO ],
    },
    chained => [
        FsError,
        FsAllocatorError,
        FsFormatterError,
        FsCheckerError,
    ],
}
