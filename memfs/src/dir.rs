//! Directory payload: the name to inode number mapping stored in every
//! directory inode.

use std::collections::BTreeMap;

use crate::node::InodeId;

/// Entry every directory holds for itself.
pub const SELF_ENTRY: &str = ".";
/// Entry every directory holds for its parent. The root points at itself.
pub const PARENT_ENTRY: &str = "..";

/// Returns true for the two entries a directory is created with.
pub fn is_synthetic(name: &str) -> bool {
    name == SELF_ENTRY || name == PARENT_ENTRY
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Child entries: name → inode number, kept sorted for stable listings.
    entries: BTreeMap<String, InodeId>,
}

impl Directory {
    /// Creates a directory holding only its `.` and `..` entries.
    pub fn new(ino: InodeId, parent: InodeId) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(SELF_ENTRY.to_string(), ino);
        entries.insert(PARENT_ENTRY.to_string(), parent);
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<InodeId> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn parent(&self) -> Option<InodeId> {
        self.lookup(PARENT_ENTRY)
    }

    /// Adds an entry, returning the inode number it displaced if the name was
    /// already taken.
    pub(crate) fn insert(&mut self, name: &str, ino: InodeId) -> Option<InodeId> {
        self.entries.insert(name.to_string(), ino)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<InodeId> {
        self.entries.remove(name)
    }

    /// Number of entries, `.` and `..` included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A directory is empty when nothing but `.` and `..` remain.
    pub fn is_empty(&self) -> bool {
        self.children().next().is_none()
    }

    /// Every entry in name order, `.` and `..` included.
    pub fn entries(&self) -> impl Iterator<Item = (&str, InodeId)> {
        self.entries.iter().map(|(name, &ino)| (name.as_str(), ino))
    }

    /// Entries other than `.` and `..`.
    pub fn children(&self) -> impl Iterator<Item = (&str, InodeId)> {
        self.entries().filter(|(name, _)| !is_synthetic(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_directory_links_self_and_parent() {
        let dir = Directory::new(5, 1);

        assert_eq!(dir.lookup("."), Some(5));
        assert_eq!(dir.lookup(".."), Some(1));
        assert_eq!(dir.parent(), Some(1));
        assert_eq!(dir.len(), 2);
        assert!(dir.is_empty());
    }

    #[test]
    fn children_skip_synthetic_entries() {
        let mut dir = Directory::new(1, 1);
        dir.insert("notes.txt", 2);
        dir.insert("docs", 3);

        let children: Vec<(&str, InodeId)> = dir.children().collect();
        assert_eq!(children, vec![("docs", 3), ("notes.txt", 2)]);
        assert_eq!(dir.len(), 4);
        assert!(!dir.is_empty());
    }

    #[test]
    fn remove_returns_the_unlinked_inode() {
        let mut dir = Directory::new(1, 1);
        dir.insert("a", 2);

        assert_eq!(dir.remove("a"), Some(2));
        assert_eq!(dir.remove("a"), None);
        assert!(!dir.contains("a"));
        assert!(dir.is_empty());
    }

    #[test]
    fn names_are_unique_within_a_directory() {
        let mut dir = Directory::new(1, 1);
        assert_eq!(dir.insert("a", 2), None);
        assert_eq!(dir.insert("a", 3), Some(2));
        assert_eq!(dir.lookup("a"), Some(3));
        assert_eq!(dir.len(), 3);
    }

    #[test]
    fn synthetic_names() {
        assert!(is_synthetic("."));
        assert!(is_synthetic(".."));
        assert!(!is_synthetic("..."));
        assert!(!is_synthetic(".hidden"));
    }
}
