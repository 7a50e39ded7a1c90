use log::{debug, trace};

use crate::dir::{is_synthetic, Directory};
use crate::error::FsError;
use crate::fd::{DescriptorTable, Fd, OpenFile};
use crate::node::{FileType, InodeId, InodeTable, Metadata, Payload};
use crate::path::{components, PathResolver};
use crate::sb::{SuperBlock, BLOCK_SIZE, DEFAULT_BLOCKS, DEFAULT_INODES};

pub const DEFAULT_FILE_MODE: u32 = 0o644;
pub const DEFAULT_DIR_MODE: u32 = 0o755;

// Encodes open filesystem call options http://man7.org/linux/man-pages/man2/open.2.html.
// Accepted for interface parity, access is never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    RO,
    WO,
    RW,
}

/// Configures a new in-memory volume.
#[derive(Debug, Clone)]
pub struct FileSystemBuilder {
    inodes_count: u32,
    block_size: u32,
    blocks_count: u32,
}

impl Default for FileSystemBuilder {
    fn default() -> Self {
        Self {
            inodes_count: DEFAULT_INODES,
            block_size: BLOCK_SIZE,
            blocks_count: DEFAULT_BLOCKS,
        }
    }
}

impl FileSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many inodes, root included, the volume can hold at once.
    pub fn with_inode_count(mut self, inodes: u32) -> Self {
        self.inodes_count = inodes;
        self
    }

    /// Recorded in the superblock only.
    pub fn with_block_size(mut self, bytes: u32) -> Self {
        self.block_size = bytes;
        self
    }

    /// Recorded in the superblock only.
    pub fn with_block_count(mut self, blocks: u32) -> Self {
        self.blocks_count = blocks;
        self
    }

    /// Creates the volume with its root directory. Fails with `Exhausted` if
    /// the inode count leaves no room for the root.
    pub fn build(self) -> Result<FileSystem, FsError> {
        let super_block = SuperBlock::new(self.inodes_count, self.block_size, self.blocks_count);
        let inodes = InodeTable::new(super_block)?;
        debug!(
            "Created file system with {} inodes of {} byte blocks.",
            self.inodes_count, self.block_size
        );
        Ok(FileSystem {
            inodes,
            fds: DescriptorTable::new(),
        })
    }
}

/// A single volume, non-persistent file system.
///
/// Owns the inode table, the free inode set and the descriptor table. Every
/// operation either completes or leaves all three untouched.
pub struct FileSystem {
    inodes: InodeTable,
    fds: DescriptorTable,
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem {
    /// A volume with 256 inodes.
    pub fn new() -> Self {
        let inodes = InodeTable::new(SuperBlock::default())
            .unwrap_or_else(|_| unreachable!("default superblock has room for the root"));
        Self {
            inodes,
            fds: DescriptorTable::new(),
        }
    }

    pub fn builder() -> FileSystemBuilder {
        FileSystemBuilder::new()
    }

    pub fn super_block(&self) -> &SuperBlock {
        self.inodes.super_block()
    }

    /// Read access to every live inode.
    pub fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    pub fn open_descriptors(&self) -> usize {
        self.fds.len()
    }

    /// Opens an existing file or directory. `mode` and `perm` are accepted
    /// but not enforced.
    pub fn open(&mut self, path: &str, mode: OpenMode, perm: u32) -> Result<Fd, FsError> {
        let ino = self.resolve(path)?;
        trace!("Opening {} ({:?}, {:o}).", path, mode, perm);
        self.open_inode(ino)
    }

    /// Creates a regular file, or truncates it if it already exists, and opens
    /// it.
    pub fn creat(&mut self, path: &str, perm: u32) -> Result<Fd, FsError> {
        let (parent, name) = self.parent_of(path)?;

        let ino = match self.entry(parent, name)? {
            Some(ino) => {
                let node = self.inodes.get_mut(ino).ok_or_else(|| not_found(path))?;
                if node.file_type() != FileType::Regular {
                    return Err(FsError::WrongType {
                        ino,
                        expected: FileType::Regular,
                    });
                }
                node.set_bytes(Vec::new())?;
                debug!("Truncated {} (inode {}).", path, ino);
                ino
            }
            None => {
                let ino = self
                    .inodes
                    .allocate(perm, |_| Payload::Regular(Vec::new()))
                    .ok_or(FsError::Exhausted)?;
                self.add_entry(parent, name, ino)?;
                debug!("Created {} (inode {}).", path, ino);
                ino
            }
        };

        self.open_inode(ino)
    }

    /// Returns up to `count` bytes from the start of the file. There is no
    /// cursor, so repeated reads return the same prefix.
    pub fn read(&mut self, fd: Fd, count: usize) -> Result<Vec<u8>, FsError> {
        let file = self.open_file(fd)?;
        let node = self
            .inodes
            .get_mut(file.ino)
            .ok_or(FsError::BadDescriptor(fd))?;

        let data = node.bytes()?;
        let prefix = data[..count.min(data.len())].to_vec();
        node.touch_accessed();
        trace!("Read {} bytes from inode {}.", prefix.len(), file.ino);
        Ok(prefix)
    }

    /// Replaces the whole contents of the file and returns the number of bytes
    /// written.
    pub fn write(&mut self, fd: Fd, data: &[u8]) -> Result<usize, FsError> {
        let file = self.open_file(fd)?;
        let node = self
            .inodes
            .get_mut(file.ino)
            .ok_or(FsError::BadDescriptor(fd))?;

        node.set_bytes(data.to_vec())?;
        debug!("Wrote {} bytes to inode {}.", data.len(), file.ino);
        Ok(data.len())
    }

    /// Releases a descriptor. Closing the same descriptor twice fails.
    pub fn close(&mut self, fd: Fd) -> Result<(), FsError> {
        let file = self.fds.remove(fd).ok_or(FsError::BadDescriptor(fd))?;
        debug!("Closed descriptor {} (inode {}).", fd, file.ino);
        Ok(())
    }

    pub fn stat(&self, path: &str) -> Option<Metadata> {
        let ino = PathResolver::new(&self.inodes).resolve(path)?;
        self.inodes.get(ino).map(|node| node.metadata())
    }

    pub fn fstat(&self, fd: Fd) -> Result<Metadata, FsError> {
        let file = self.open_file(fd)?;
        self.inodes
            .get(file.ino)
            .map(|node| node.metadata())
            .ok_or(FsError::BadDescriptor(fd))
    }

    /// Removes a name from its directory. The inode is freed once its last
    /// link is gone, even if descriptors still reference it.
    pub fn unlink(&mut self, path: &str) -> Result<(), FsError> {
        let (parent, name) = self.parent_of(path)?;
        let ino = self.entry(parent, name)?.ok_or_else(|| not_found(path))?;
        if let Some(node) = self.inodes.get(ino) {
            if node.file_type() == FileType::Directory {
                return Err(FsError::WrongType {
                    ino,
                    expected: FileType::Regular,
                });
            }
        }

        self.remove_entry(parent, name)?;
        let remaining = match self.inodes.get_mut(ino) {
            Some(node) => node.dec_nlink(),
            None => 0,
        };
        if remaining == 0 {
            self.inodes.free(ino);
        }
        debug!("Unlinked {} (inode {}, {} links left).", path, ino, remaining);
        Ok(())
    }

    pub fn mkdir(&mut self, path: &str, perm: u32) -> Result<(), FsError> {
        let (parent, name) = self.parent_of(path)?;
        if self.entry(parent, name)?.is_some() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }

        let ino = self
            .inodes
            .allocate(perm, |ino| Payload::Directory(Directory::new(ino, parent)))
            .ok_or(FsError::Exhausted)?;
        self.add_entry(parent, name, ino)?;
        debug!("Created directory {} (inode {}).", path, ino);
        Ok(())
    }

    /// Removes an empty directory and frees its inode.
    pub fn rmdir(&mut self, path: &str) -> Result<(), FsError> {
        if components(path).is_empty() {
            return Err(FsError::Busy(path.to_string()));
        }
        let (parent, name) = self.parent_of(path)?;
        let ino = self.entry(parent, name)?.ok_or_else(|| not_found(path))?;
        let node = self.inodes.get(ino).ok_or_else(|| not_found(path))?;
        if !node.dir()?.is_empty() {
            return Err(FsError::NotEmpty(path.to_string()));
        }

        self.remove_entry(parent, name)?;
        self.inodes.free(ino);
        debug!("Removed directory {} (inode {}).", path, ino);
        Ok(())
    }

    /// Adds another name for an existing regular file.
    pub fn link(&mut self, existing: &str, new_path: &str) -> Result<(), FsError> {
        let ino = self.resolve(existing)?;
        if let Some(node) = self.inodes.get(ino) {
            if node.file_type() != FileType::Regular {
                return Err(FsError::WrongType {
                    ino,
                    expected: FileType::Regular,
                });
            }
        }
        let (parent, name) = self.parent_of(new_path)?;
        if self.entry(parent, name)?.is_some() {
            return Err(FsError::AlreadyExists(new_path.to_string()));
        }

        self.add_entry(parent, name, ino)?;
        if let Some(node) = self.inodes.get_mut(ino) {
            node.inc_nlink();
        }
        debug!("Linked {} to {} (inode {}).", new_path, existing, ino);
        Ok(())
    }

    /// Lists a directory's entries in name order, `.` and `..` included.
    pub fn readdir(&mut self, path: &str) -> Result<Vec<(String, InodeId)>, FsError> {
        let ino = self.resolve(path)?;
        let node = self.inodes.get_mut(ino).ok_or_else(|| not_found(path))?;

        let entries = node
            .dir()?
            .entries()
            .map(|(name, ino)| (name.to_string(), ino))
            .collect();
        node.touch_accessed();
        Ok(entries)
    }

    fn resolve(&self, path: &str) -> Result<InodeId, FsError> {
        PathResolver::new(&self.inodes)
            .resolve(path)
            .ok_or_else(|| not_found(path))
    }

    /// Resolves the directory that holds (or will hold) the final component
    /// of `path`. The component must be a real name, not `.` or `..`.
    fn parent_of<'p>(&self, path: &'p str) -> Result<(InodeId, &'p str), FsError> {
        let (parent, name) = PathResolver::new(&self.inodes).resolve_parent(path);
        if name.is_empty() || is_synthetic(name) {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        match parent.and_then(|ino| self.inodes.get(ino)) {
            Some(node) if node.file_type() == FileType::Directory => Ok((node.ino(), name)),
            _ => Err(FsError::InvalidParent(path.to_string())),
        }
    }

    fn entry(&self, dir: InodeId, name: &str) -> Result<Option<InodeId>, FsError> {
        let node = self
            .inodes
            .get(dir)
            .ok_or_else(|| FsError::InvalidParent(name.to_string()))?;
        Ok(node.dir()?.lookup(name))
    }

    fn add_entry(&mut self, dir: InodeId, name: &str, ino: InodeId) -> Result<(), FsError> {
        let parent = self
            .inodes
            .get_mut(dir)
            .ok_or_else(|| FsError::InvalidParent(name.to_string()))?;
        parent.dir_mut()?.insert(name, ino);
        parent.inc_nlink();
        parent.touch_modified();
        Ok(())
    }

    fn remove_entry(&mut self, dir: InodeId, name: &str) -> Result<(), FsError> {
        let parent = self
            .inodes
            .get_mut(dir)
            .ok_or_else(|| FsError::InvalidParent(name.to_string()))?;
        parent.dir_mut()?.remove(name);
        parent.dec_nlink();
        parent.touch_modified();
        Ok(())
    }

    fn open_inode(&mut self, ino: InodeId) -> Result<Fd, FsError> {
        let node = self
            .inodes
            .get_mut(ino)
            .ok_or_else(|| FsError::NotFound(format!("inode {}", ino)))?;
        node.touch_accessed();
        let fd = self.fds.insert(OpenFile {
            ino,
            generation: node.generation(),
        });
        debug!("Opened inode {} as descriptor {}.", ino, fd);
        Ok(fd)
    }

    /// Looks up a descriptor and checks the inode it was opened on still
    /// exists.
    fn open_file(&self, fd: Fd) -> Result<OpenFile, FsError> {
        let file = self.fds.get(fd).ok_or(FsError::BadDescriptor(fd))?;
        match self.inodes.get(file.ino) {
            Some(node) if node.generation() == file.generation => Ok(file),
            _ => {
                debug!("Descriptor {} outlived inode {}.", fd, file.ino);
                Err(FsError::BadDescriptor(fd))
            }
        }
    }
}

fn not_found(path: &str) -> FsError {
    FsError::NotFound(path.to_string())
}
