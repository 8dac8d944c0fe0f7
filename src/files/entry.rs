use std::collections::btree_map;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Error kinds for tree mutation and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The name is already taken in the target directory. The existing
    /// entry is left untouched.
    #[error("entry already exists")]
    Exists,
    /// A child operation was attempted on something that is not a
    /// directory.
    #[error("entry is not a directory")]
    NotDir,
    /// Lookup miss.
    #[error("entry does not exist")]
    NotExists,
}

/// A single node in the virtual file tree.
///
/// Each variant carries only the data that is meaningful for it: regular
/// files remember the source path their bytes are read from at
/// serialization time, directories own their children, links carry the
/// target that is written into the archive verbatim.
///
/// Children are exclusively owned by their parent directory. Insertion
/// always allocates a fresh node, so the tree cannot contain cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Regular { source: PathBuf },
    Directory { children: BTreeMap<String, Entry> },
    Link { target: PathBuf },
}

impl Entry {
    /// A regular file entry reading its bytes from `source`.
    pub fn regular(source: impl Into<PathBuf>) -> Self {
        Entry::Regular {
            source: source.into(),
        }
    }

    /// An empty directory entry.
    pub fn directory() -> Self {
        Entry::Directory {
            children: BTreeMap::new(),
        }
    }

    /// A symbolic link entry pointing at `target`.
    pub fn link(target: impl Into<PathBuf>) -> Self {
        Entry::Link {
            target: target.into(),
        }
    }

    /// Returns true if this entry is a regular file.
    pub fn is_regular(&self) -> bool {
        matches!(self, Entry::Regular { .. })
    }

    /// Returns true if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }

    /// Returns true if this entry is a link.
    pub fn is_link(&self) -> bool {
        matches!(self, Entry::Link { .. })
    }

    /// The path this entry relates to: the source path for a regular
    /// file, the target for a link, nothing for a directory.
    pub fn related_path(&self) -> Option<&Path> {
        match self {
            Entry::Regular { source } => Some(source),
            Entry::Link { target } => Some(target),
            Entry::Directory { .. } => None,
        }
    }

    /// Add a new regular file entry as a child.
    pub fn add_file(
        &mut self,
        name: &str,
        source: impl Into<PathBuf>,
    ) -> Result<&mut Entry, TreeError> {
        self.add_entry(name, Entry::regular(source))
    }

    /// Add a new directory entry as a child.
    pub fn add_directory(&mut self, name: &str) -> Result<&mut Entry, TreeError> {
        self.add_entry(name, Entry::directory())
    }

    /// Add a new link entry as a child.
    pub fn add_link(
        &mut self,
        name: &str,
        target: impl Into<PathBuf>,
    ) -> Result<&mut Entry, TreeError> {
        self.add_entry(name, Entry::link(target))
    }

    /// Add an arbitrary entry as a child named `name`.
    ///
    /// Fails with [`TreeError::NotDir`] unless this entry is a directory
    /// and with [`TreeError::Exists`] if the name is taken; the existing
    /// child is never overwritten.
    pub fn add_entry(&mut self, name: &str, entry: Entry) -> Result<&mut Entry, TreeError> {
        let Entry::Directory { children } = self else {
            return Err(TreeError::NotDir);
        };
        match children.entry(name.to_string()) {
            btree_map::Entry::Occupied(_) => Err(TreeError::Exists),
            btree_map::Entry::Vacant(slot) => Ok(slot.insert(entry)),
        }
    }

    /// Look up a direct child by name.
    pub fn get(&self, name: &str) -> Result<&Entry, TreeError> {
        let Entry::Directory { children } = self else {
            return Err(TreeError::NotDir);
        };
        children.get(name).ok_or(TreeError::NotExists)
    }

    /// Get the directory child `name`, creating it if absent.
    ///
    /// Re-requesting an existing directory is not an error; a name taken
    /// by a non-directory is [`TreeError::NotDir`].
    pub(crate) fn ensure_directory(&mut self, name: &str) -> Result<&mut Entry, TreeError> {
        let Entry::Directory { children } = self else {
            return Err(TreeError::NotDir);
        };
        let child = children
            .entry(name.to_string())
            .or_insert_with(Entry::directory);
        if child.is_dir() {
            Ok(child)
        } else {
            Err(TreeError::NotDir)
        }
    }

    /// Depth-first traversal of all descendants.
    ///
    /// Invokes `f` with the full path and the entry for every descendant,
    /// parents before their children. Only directories are descended
    /// into. Sibling order is an implementation detail callers must not
    /// rely on.
    pub fn walk<E, F>(&self, base: &Path, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&Path, &Entry) -> Result<(), E>,
    {
        let Entry::Directory { children } = self else {
            return Ok(());
        };
        for (name, child) in children {
            let path = base.join(name);
            f(&path, child)?;
            if child.is_dir() {
                child.walk(&path, f)?;
            }
        }
        Ok(())
    }
}
