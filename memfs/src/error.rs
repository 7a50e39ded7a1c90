use crate::fd::Fd;
use crate::node::{FileType, InodeId};

use thiserror::Error;

/// Value returned to hosts that only understand the classic `-1` failure status.
pub const STATUS_FAILED: i32 = -1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("parent of {0} is missing or not a directory")]
    InvalidParent(String),
    #[error("bad file descriptor: {0}")]
    BadDescriptor(Fd),
    #[error("inode {ino} is not a {expected:?}")]
    WrongType { ino: InodeId, expected: FileType },
    #[error("no free inodes left")]
    Exhausted,
    #[error("directory not empty: {0}")]
    NotEmpty(String),
    #[error("file exists: {0}")]
    AlreadyExists(String),
    #[error("invalid path: {0:?}")]
    InvalidPath(String),
    #[error("resource busy: {0}")]
    Busy(String),
}

impl FsError {
    /// Collapses any error into the sentinel status of the C-style interface.
    pub fn status(&self) -> i32 {
        STATUS_FAILED
    }

    /// Closest POSIX errno for the failure (Linux numbering).
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound(_) => 2,           // ENOENT
            FsError::BadDescriptor(_) => 9,      // EBADF
            FsError::Busy(_) => 16,              // EBUSY
            FsError::AlreadyExists(_) => 17,     // EEXIST
            FsError::InvalidParent(_) => 20,     // ENOTDIR
            FsError::WrongType { expected, .. } => match expected {
                FileType::Directory => 20,       // ENOTDIR
                _ => 21,                         // EISDIR
            },
            FsError::InvalidPath(_) => 22,       // EINVAL
            FsError::Exhausted => 28,            // ENOSPC
            FsError::NotEmpty(_) => 39,          // ENOTEMPTY
        }
    }
}
