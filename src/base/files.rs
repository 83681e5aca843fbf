//! File set management for assigning stable ids to source paths.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::base::FileId;

/// Manages the mapping between file paths and [`FileId`]s.
///
/// The same physical file can be reachable from more than one package view
/// (an entry-point package and a dependency both listing it); interning the
/// path once gives every view the same id, which is what lets the loader's
/// syntax-tree cache deduplicate parses.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<FileSetInner>,
}

#[derive(Debug, Default)]
struct FileSetInner {
    /// Path → FileId mapping
    path_to_id: IndexMap<PathBuf, FileId>,
    /// FileId → Path mapping (reverse lookup)
    id_to_path: IndexMap<FileId, PathBuf>,
    /// Next FileId to assign
    next_id: u32,
}

impl FileSet {
    /// Create a new empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a [`FileId`] for a path.
    ///
    /// Ids are stable for the lifetime of the set: the same path always
    /// returns the same id.
    pub fn file_id(&self, path: &Path) -> FileId {
        // Fast path: read lock
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.path_to_id.get(path) {
                return id;
            }
        }

        // Slow path: write lock
        let mut inner = self.inner.write();

        // Double-check after acquiring the write lock
        if let Some(&id) = inner.path_to_id.get(path) {
            return id;
        }

        let id = FileId::new(inner.next_id);
        inner.next_id += 1;
        inner.path_to_id.insert(path.to_owned(), id);
        inner.id_to_path.insert(id, path.to_owned());
        id
    }

    /// Get the path for a [`FileId`].
    pub fn path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.read().id_to_path.get(&file).cloned()
    }

    /// Get the number of files registered.
    pub fn len(&self) -> usize {
        self.inner.read().path_to_id.len()
    }

    /// Check if the file set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_id_assignment() {
        let files = FileSet::new();

        let id1 = files.file_id(Path::new("/mod/a.go"));
        let id2 = files.file_id(Path::new("/mod/b.go"));
        let id3 = files.file_id(Path::new("/mod/a.go")); // same as id1

        assert_ne!(id1, id2);
        assert_eq!(id1, id3); // stable id for the same path
    }

    #[test]
    fn test_file_set_path_lookup() {
        let files = FileSet::new();
        let path = Path::new("/mod/types.go");
        let id = files.file_id(path);

        assert_eq!(files.path(id).as_deref(), Some(path));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_file_set_unknown_id() {
        let files = FileSet::new();
        assert!(files.path(FileId::new(42)).is_none());
    }
}
