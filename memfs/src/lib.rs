//! An in-memory, single volume file system core: an inode table, path
//! resolution through directory entries, and a descriptor table handing out
//! process visible handles onto inodes.
//!
//! ```
//! use memfs::{FileSystem, OpenMode};
//!
//! let mut fs = FileSystem::new();
//! fs.mkdir("/docs", 0o755).unwrap();
//!
//! let fd = fs.creat("/docs/notes.txt", 0o644).unwrap();
//! fs.write(fd, b"Simple file content").unwrap();
//! fs.close(fd).unwrap();
//!
//! let fd = fs.open("/docs/notes.txt", OpenMode::RO, 0).unwrap();
//! assert_eq!(fs.read(fd, 1024).unwrap(), b"Simple file content");
//! ```

mod alloc;
pub mod dir;
mod error;
pub mod fd;
mod fs;
pub mod node;
pub mod path;
pub mod sb;
mod shared;

pub use crate::error::{FsError, STATUS_FAILED};
pub use crate::fd::Fd;
pub use crate::fs::{FileSystem, FileSystemBuilder, OpenMode, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};
pub use crate::node::{FileType, InodeId, Metadata, ROOT_INODE};
pub use crate::sb::SuperBlock;
pub use crate::shared::SharedFileSystem;
