use std::collections::HashMap;

use crate::node::InodeId;

/// Process visible handle onto an inode.
pub type Fd = u32;

/// 0, 1 and 2 stay reserved for the standard streams.
pub const FIRST_FD: Fd = 3;

/// What a descriptor points at. The generation pins the descriptor to one
/// particular inode, so a recycled inode number is not mistaken for the file
/// that was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFile {
    pub ino: InodeId,
    pub generation: u64,
}

/// Maps descriptors to open files. Descriptors are handed out in increasing
/// order and never reused.
#[derive(Debug)]
pub struct DescriptorTable {
    open: HashMap<Fd, OpenFile>,
    next_fd: Fd,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self {
            open: HashMap::new(),
            next_fd: FIRST_FD,
        }
    }

    pub fn insert(&mut self, file: OpenFile) -> Fd {
        let fd = self.next_fd;
        self.next_fd += 1;
        self.open.insert(fd, file);
        fd
    }

    pub fn get(&self, fd: Fd) -> Option<OpenFile> {
        self.open.get(&fd).copied()
    }

    pub fn remove(&mut self, fd: Fd) -> Option<OpenFile> {
        self.open.remove(&fd)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}
