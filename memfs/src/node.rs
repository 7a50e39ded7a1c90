use std::collections::BTreeMap;
use std::time::SystemTime;

use log::{debug, warn};

use crate::alloc::{Bitmap, NextAvailableAllocation, State};
use crate::dir::Directory;
use crate::error::FsError;
use crate::sb::SuperBlock;

/// Inode number. Valid numbers run from 1 to the superblock's inode count.
pub type InodeId = u32;

/// The root directory always lives at inode 1.
pub const ROOT_INODE: InodeId = 1;

const ROOT_DEFAULT_MODE: u32 = 0o755;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
    /// Reserved. No payload exists for it and no operation creates one.
    Symlink,
}

/// Type dependent contents of an inode. The variant is the file type, so the
/// two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Regular(Vec<u8>),
    Directory(Directory),
}

impl Payload {
    pub fn file_type(&self) -> FileType {
        match self {
            Payload::Regular(_) => FileType::Regular,
            Payload::Directory(_) => FileType::Directory,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Inode {
    ino: InodeId,
    /// Distinguishes successive inodes that reuse the same number.
    generation: u64,
    /// Permission bits (e.g 0o644). Stored, never enforced.
    mode: u32,
    /// The id of the owning user.
    uid: u32,
    /// The id of the owning group.
    gid: u32,
    /// The total size of the file in bytes.
    size: u64,
    /// Last time the contents were read.
    atime: SystemTime,
    /// Last time the contents changed.
    mtime: SystemTime,
    /// Last time the contents or the metadata changed.
    ctime: SystemTime,
    /// The number of directory entries referencing this inode.
    nlink: u32,
    payload: Payload,
}

impl Inode {
    fn new(ino: InodeId, generation: u64, mode: u32, payload: Payload) -> Self {
        let now = SystemTime::now();
        // A directory starts out referenced by its parent and by its own ".".
        let nlink = match payload {
            Payload::Regular(_) => 1,
            Payload::Directory(_) => 2,
        };
        Self {
            ino,
            generation,
            mode,
            uid: 0,
            gid: 0,
            size: 0,
            atime: now,
            mtime: now,
            ctime: now,
            nlink,
            payload,
        }
    }

    pub fn ino(&self) -> InodeId {
        self.ino
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file_type(&self) -> FileType {
        self.payload.file_type()
    }

    pub fn nlink(&self) -> u32 {
        self.nlink
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// File contents, or `WrongType` if this is not a regular file.
    pub fn bytes(&self) -> Result<&[u8], FsError> {
        match &self.payload {
            Payload::Regular(data) => Ok(data),
            _ => Err(self.wrong_type(FileType::Regular)),
        }
    }

    /// Directory entries, or `WrongType` if this is not a directory.
    pub fn dir(&self) -> Result<&Directory, FsError> {
        match &self.payload {
            Payload::Directory(dir) => Ok(dir),
            _ => Err(self.wrong_type(FileType::Directory)),
        }
    }

    pub(crate) fn dir_mut(&mut self) -> Result<&mut Directory, FsError> {
        match &mut self.payload {
            Payload::Directory(dir) => Ok(dir),
            _ => Err(FsError::WrongType {
                ino: self.ino,
                expected: FileType::Directory,
            }),
        }
    }

    /// Replaces the whole contents of a regular file.
    pub(crate) fn set_bytes(&mut self, data: Vec<u8>) -> Result<(), FsError> {
        match &mut self.payload {
            Payload::Regular(current) => {
                self.size = data.len() as u64;
                *current = data;
                self.touch_modified();
                Ok(())
            }
            _ => Err(FsError::WrongType {
                ino: self.ino,
                expected: FileType::Regular,
            }),
        }
    }

    pub(crate) fn touch_accessed(&mut self) {
        self.atime = SystemTime::now();
    }

    pub(crate) fn touch_modified(&mut self) {
        let now = SystemTime::now();
        self.mtime = now;
        self.ctime = now;
    }

    pub(crate) fn inc_nlink(&mut self) {
        self.nlink += 1;
        self.ctime = SystemTime::now();
    }

    /// Drops one link and returns how many remain.
    pub(crate) fn dec_nlink(&mut self) -> u32 {
        self.nlink = self.nlink.saturating_sub(1);
        self.ctime = SystemTime::now();
        self.nlink
    }

    /// Read-only snapshot of the inode's attributes.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            ino: self.ino,
            file_type: self.file_type(),
            mode: self.mode,
            uid: self.uid,
            gid: self.gid,
            size: self.size,
            atime: self.atime,
            mtime: self.mtime,
            ctime: self.ctime,
            nlink: self.nlink,
        }
    }

    fn wrong_type(&self, expected: FileType) -> FsError {
        FsError::WrongType {
            ino: self.ino,
            expected,
        }
    }
}

/// What `stat` reports about an inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub ino: InodeId,
    pub file_type: FileType,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub nlink: u32,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::Regular
    }
}

/// Owns every live inode along with the bitmap of free inode numbers and the
/// superblock counters describing them.
///
/// An inode number is either present in `nodes` or marked free in
/// `alloc_tracker`, never both. Slot 0 of the bitmap is permanently reserved
/// because inode numbers start at 1.
pub struct InodeTable {
    nodes: BTreeMap<InodeId, Inode>,
    alloc_tracker: Bitmap,
    super_block: SuperBlock,
    next_generation: u64,
}

impl InodeTable {
    /// Builds the table and its root directory.
    pub fn new(super_block: SuperBlock) -> Result<Self, FsError> {
        if super_block.inodes_count == 0 {
            return Err(FsError::Exhausted);
        }
        let mut alloc_tracker = Bitmap::new(super_block.inodes_count as usize + 1);
        alloc_tracker.set_reserved(0);

        let mut table = Self {
            nodes: BTreeMap::new(),
            alloc_tracker,
            super_block,
            next_generation: 0,
        };
        let root = table.allocate(ROOT_DEFAULT_MODE, |ino| {
            Payload::Directory(Directory::new(ino, ino))
        });
        debug_assert_eq!(root, Some(ROOT_INODE));
        Ok(table)
    }

    /// Takes the lowest free inode number and stores a new inode under it.
    /// `payload` receives the number so directories can point `.` at
    /// themselves. Returns `None` when every number is in use.
    pub(crate) fn allocate<F>(&mut self, mode: u32, payload: F) -> Option<InodeId>
    where
        F: FnOnce(InodeId) -> Payload,
    {
        let slot = match NextAvailableAllocation::new(&self.alloc_tracker, 1).next() {
            Some(slot) => slot,
            None => {
                warn!(
                    "Inode table exhausted ({} inodes in use).",
                    self.super_block.inodes_count
                );
                return None;
            }
        };
        let ino = slot as InodeId;

        self.next_generation += 1;
        let node = Inode::new(ino, self.next_generation, mode, payload(ino));
        debug!("Allocated {:?} inode {}.", node.file_type(), ino);

        self.alloc_tracker.set_reserved(slot);
        self.super_block.note_allocated();
        self.nodes.insert(ino, node);
        Some(ino)
    }

    pub fn get(&self, ino: InodeId) -> Option<&Inode> {
        self.nodes.get(&ino)
    }

    pub(crate) fn get_mut(&mut self, ino: InodeId) -> Option<&mut Inode> {
        self.nodes.get_mut(&ino)
    }

    /// Removes the inode and returns its number to the free set. The root is
    /// never freed.
    pub(crate) fn free(&mut self, ino: InodeId) -> Option<Inode> {
        if ino == ROOT_INODE {
            return None;
        }
        let node = self.nodes.remove(&ino)?;
        self.alloc_tracker.set_free(ino as usize);
        self.super_block.note_freed();
        debug!("Freed inode {}.", ino);
        Some(node)
    }

    pub fn contains(&self, ino: InodeId) -> bool {
        self.nodes.contains_key(&ino)
    }

    /// Whether `ino` is a valid inode number waiting to be allocated.
    pub fn is_free(&self, ino: InodeId) -> bool {
        let slot = ino as usize;
        ino != 0
            && slot < self.alloc_tracker.len()
            && self.alloc_tracker.get(slot) == State::Free
    }

    /// Number of live inodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn free_count(&self) -> usize {
        self.alloc_tracker.count_free()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Inode> {
        self.nodes.values()
    }

    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sb::BLOCK_SIZE;

    fn table_with(inodes: u32) -> InodeTable {
        InodeTable::new(SuperBlock::new(inodes, BLOCK_SIZE, 16)).unwrap()
    }

    fn new_file(table: &mut InodeTable) -> Option<InodeId> {
        table.allocate(0o644, |_| Payload::Regular(Vec::new()))
    }

    #[test]
    fn root_is_created_with_self_references() {
        let table = table_with(8);
        let root = table.get(ROOT_INODE).unwrap();

        assert_eq!(root.file_type(), FileType::Directory);
        assert_eq!(root.nlink(), 2);
        let dir = root.dir().unwrap();
        assert_eq!(dir.lookup("."), Some(ROOT_INODE));
        assert_eq!(dir.lookup(".."), Some(ROOT_INODE));
        assert!(!table.is_free(ROOT_INODE));
        assert_eq!(table.super_block().free_inodes_count, 7);
    }

    #[test]
    fn allocation_takes_lowest_free_number() {
        let mut table = table_with(8);
        assert_eq!(new_file(&mut table), Some(2));
        assert_eq!(new_file(&mut table), Some(3));
        assert_eq!(new_file(&mut table), Some(4));

        table.free(3).unwrap();
        assert!(table.is_free(3));
        assert_eq!(new_file(&mut table), Some(3));
    }

    #[test]
    fn allocation_fails_when_exhausted() {
        let mut table = table_with(3);
        assert_eq!(new_file(&mut table), Some(2));
        assert_eq!(new_file(&mut table), Some(3));
        assert_eq!(new_file(&mut table), None);
        assert_eq!(table.super_block().free_inodes_count, 0);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn root_cannot_be_freed() {
        let mut table = table_with(4);
        assert!(table.free(ROOT_INODE).is_none());
        assert!(table.contains(ROOT_INODE));
    }

    #[test]
    fn reused_numbers_get_a_new_generation() {
        let mut table = table_with(4);
        let ino = new_file(&mut table).unwrap();
        let first = table.get(ino).unwrap().generation();

        table.free(ino);
        assert_eq!(new_file(&mut table), Some(ino));
        assert_ne!(table.get(ino).unwrap().generation(), first);
    }

    #[test]
    fn free_set_and_table_partition_the_numbers() {
        let mut table = table_with(6);
        new_file(&mut table);
        new_file(&mut table);
        table.free(2);

        for ino in 1..=6 {
            assert_ne!(table.is_free(ino), table.contains(ino), "inode {}", ino);
        }
        assert_eq!(table.free_count(), 4);
        assert_eq!(table.super_block().free_inodes_count, 4);
    }

    #[test]
    fn out_of_range_numbers_are_never_free() {
        let table = table_with(4);
        assert!(!table.is_free(0));
        assert!(!table.is_free(5));
    }

    #[test]
    fn payload_accessors_reject_the_wrong_shape() {
        let mut table = table_with(4);
        let ino = new_file(&mut table).unwrap();
        let file = table.get(ino).unwrap();

        assert_eq!(file.bytes().unwrap(), b"");
        assert_eq!(
            file.dir().unwrap_err(),
            FsError::WrongType {
                ino,
                expected: FileType::Directory
            }
        );
        let root = table.get(ROOT_INODE).unwrap();
        assert!(root.bytes().is_err());
    }

    #[test]
    fn set_bytes_updates_size() {
        let mut table = table_with(4);
        let ino = new_file(&mut table).unwrap();
        let file = table.get_mut(ino).unwrap();

        file.set_bytes(b"hello".to_vec()).unwrap();
        assert_eq!(file.size(), 5);
        assert_eq!(file.metadata().size, 5);
        assert!(file.metadata().is_file());
    }

    #[test]
    fn zero_inode_volume_is_rejected() {
        let result = InodeTable::new(SuperBlock::new(0, BLOCK_SIZE, 16));
        assert_eq!(result.err(), Some(FsError::Exhausted));
    }
}
