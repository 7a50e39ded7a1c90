//! Path resolution.
//!
//! Paths are walked left to right from the root through the stored directory
//! entries. Nothing is cached and `.`/`..` are followed like any other entry.

use log::trace;

use crate::node::{InodeId, InodeTable, ROOT_INODE};

/// Splits a path into its components, dropping the empty pieces produced by
/// leading, trailing or repeated slashes.
///
/// ```
/// use memfs::path::components;
///
/// assert_eq!(components("/docs//notes.txt/"), vec!["docs", "notes.txt"]);
/// assert!(components("/").is_empty());
/// ```
pub fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Resolves paths against an inode table for the duration of one call.
pub struct PathResolver<'a> {
    table: &'a InodeTable,
}

impl<'a> PathResolver<'a> {
    pub fn new(table: &'a InodeTable) -> Self {
        Self { table }
    }

    /// Finds the inode a path names. Fails as a whole if any step goes
    /// through a non-directory or a missing entry.
    pub fn resolve(&self, path: &str) -> Option<InodeId> {
        self.walk(&components(path))
    }

    /// Splits off the final component and resolves what precedes it. Used by
    /// every operation that changes a directory's entries, since the target
    /// itself may not exist yet.
    ///
    /// The returned name is empty when the path has no components at all.
    pub fn resolve_parent<'p>(&self, path: &'p str) -> (Option<InodeId>, &'p str) {
        let parts = components(path);
        match parts.split_last() {
            Some((name, prefix)) => (self.walk(prefix), *name),
            None => (Some(ROOT_INODE), ""),
        }
    }

    fn walk(&self, parts: &[&str]) -> Option<InodeId> {
        let mut current = ROOT_INODE;
        for part in parts {
            let dir = self.table.get(current)?.dir().ok()?;
            current = match dir.lookup(part) {
                Some(next) => next,
                None => {
                    trace!("No entry {:?} in directory {}.", part, current);
                    return None;
                }
            };
        }
        // Entries pointing at freed inodes resolve to nothing.
        if self.table.contains(current) {
            Some(current)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::Directory;
    use crate::node::Payload;
    use crate::sb::SuperBlock;

    /// Builds `/docs/notes.txt` by hand.
    fn sample_table() -> (InodeTable, InodeId, InodeId) {
        let mut table = InodeTable::new(SuperBlock::default()).unwrap();
        let docs = table
            .allocate(0o755, |ino| {
                Payload::Directory(Directory::new(ino, ROOT_INODE))
            })
            .unwrap();
        let notes = table
            .allocate(0o644, |_| Payload::Regular(b"hi".to_vec()))
            .unwrap();
        table
            .get_mut(ROOT_INODE)
            .unwrap()
            .dir_mut()
            .unwrap()
            .insert("docs", docs);
        table
            .get_mut(docs)
            .unwrap()
            .dir_mut()
            .unwrap()
            .insert("notes.txt", notes);
        (table, docs, notes)
    }

    #[test]
    fn root_resolves_to_root_inode() {
        let (table, _, _) = sample_table();
        let resolver = PathResolver::new(&table);
        assert_eq!(resolver.resolve("/"), Some(ROOT_INODE));
        assert_eq!(resolver.resolve(""), Some(ROOT_INODE));
    }

    #[test]
    fn nested_paths_resolve() {
        let (table, docs, notes) = sample_table();
        let resolver = PathResolver::new(&table);

        assert_eq!(resolver.resolve("/docs"), Some(docs));
        assert_eq!(resolver.resolve("/docs/notes.txt"), Some(notes));
        assert_eq!(resolver.resolve("//docs///notes.txt/"), Some(notes));
        assert_eq!(resolver.resolve("docs/notes.txt"), Some(notes));
    }

    #[test]
    fn dot_entries_are_followed() {
        let (table, docs, notes) = sample_table();
        let resolver = PathResolver::new(&table);

        assert_eq!(resolver.resolve("/docs/."), Some(docs));
        assert_eq!(resolver.resolve("/docs/../docs/notes.txt"), Some(notes));
        assert_eq!(resolver.resolve("/.."), Some(ROOT_INODE));
    }

    #[test]
    fn missing_or_non_directory_steps_fail() {
        let (table, _, _) = sample_table();
        let resolver = PathResolver::new(&table);

        assert_eq!(resolver.resolve("/missing/path"), None);
        assert_eq!(resolver.resolve("/docs/missing"), None);
        assert_eq!(resolver.resolve("/docs/notes.txt/deeper"), None);
    }

    #[test]
    fn dangling_entries_do_not_resolve() {
        let (mut table, _, notes) = sample_table();
        table.free(notes);
        assert_eq!(PathResolver::new(&table).resolve("/docs/notes.txt"), None);
    }

    #[test]
    fn parent_resolution_splits_final_component() {
        let (table, docs, _) = sample_table();
        let resolver = PathResolver::new(&table);

        assert_eq!(resolver.resolve_parent("/a"), (Some(ROOT_INODE), "a"));
        assert_eq!(resolver.resolve_parent("/docs/new"), (Some(docs), "new"));
        assert_eq!(resolver.resolve_parent("/docs/new/"), (Some(docs), "new"));
        assert_eq!(resolver.resolve_parent("/nope/new"), (None, "new"));
        assert_eq!(resolver.resolve_parent("/"), (Some(ROOT_INODE), ""));
    }
}
