use std::path::{Component, Path};

use super::{Entry, TreeError};

/// A file tree rooted at a directory.
///
/// Adds slash-separated path resolution on top of the per-entry
/// operations of [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    root: Entry,
}

impl Tree {
    /// An empty tree: a root directory with no children.
    pub fn new() -> Self {
        Self {
            root: Entry::directory(),
        }
    }

    /// The root directory entry.
    pub fn root(&self) -> &Entry {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Entry {
        &mut self.root
    }

    /// Resolve a possibly multi-segment path from the root.
    ///
    /// A leading `/` and `.` segments are ignored. Fails with
    /// [`TreeError::NotDir`] if an intermediate segment is not a
    /// directory and [`TreeError::NotExists`] if a segment is absent.
    pub fn entry_at(&self, path: impl AsRef<Path>) -> Result<&Entry, TreeError> {
        let mut current = &self.root;
        for component in path.as_ref().components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(name) => {
                    current = current.get(&name.to_string_lossy())?;
                }
                // Archive paths never contain dot-dot or prefixes.
                _ => return Err(TreeError::NotExists),
            }
        }
        Ok(current)
    }

    /// Resolve a path to a directory, creating missing segments.
    ///
    /// Existing directories along the way are reused; a segment occupied
    /// by a non-directory fails with [`TreeError::NotDir`].
    pub fn mkdir_all(&mut self, path: impl AsRef<Path>) -> Result<&mut Entry, TreeError> {
        let mut current = &mut self.root;
        for component in path.as_ref().components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(name) => {
                    current = current.ensure_directory(&name.to_string_lossy())?;
                }
                _ => return Err(TreeError::NotExists),
            }
        }
        Ok(current)
    }

    /// Depth-first traversal of the whole tree with absolute paths.
    ///
    /// The root itself is not visited; every descendant is, parents
    /// before their children.
    pub fn walk<E, F>(&self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&Path, &Entry) -> Result<(), E>,
    {
        self.root.walk(Path::new("/"), f)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn entry_at_resolves_nested_paths() {
        let mut tree = Tree::new();
        tree.mkdir_all("usr/lib")
            .unwrap()
            .add_file("libc.so", "/src/libc.so")
            .unwrap();

        let entry = tree.entry_at("/usr/lib/libc.so").unwrap();
        assert!(entry.is_regular());
        assert_eq!(entry.related_path(), Some(Path::new("/src/libc.so")));

        // Leading slash is optional.
        assert!(tree.entry_at("usr/lib/libc.so").is_ok());
    }

    #[test]
    fn entry_at_root() {
        let tree = Tree::new();
        assert!(tree.entry_at("/").unwrap().is_dir());
    }

    #[test]
    fn entry_at_missing_segment() {
        let tree = Tree::new();
        assert_eq!(tree.entry_at("/404").unwrap_err(), TreeError::NotExists);
    }

    #[test]
    fn entry_at_non_directory_intermediate() {
        let mut tree = Tree::new();
        tree.root_mut().add_file("init", "first").unwrap();

        // The intermediate failure wins even though the final segment
        // could never exist.
        assert_eq!(
            tree.entry_at("/init/sub").unwrap_err(),
            TreeError::NotDir
        );
    }

    #[test]
    fn mkdir_all_is_idempotent() {
        let mut tree = Tree::new();
        tree.mkdir_all("a/b/c").unwrap();
        tree.mkdir_all("a/b/c")
            .unwrap()
            .add_file("keep", "source")
            .unwrap();
        tree.mkdir_all("a/b").unwrap();

        assert!(tree.entry_at("a/b/c/keep").unwrap().is_regular());
    }

    #[test]
    fn mkdir_all_conflicts_with_file() {
        let mut tree = Tree::new();
        tree.root_mut().add_file("etc", "source").unwrap();
        assert_eq!(tree.mkdir_all("etc/sub").unwrap_err(), TreeError::NotDir);
        assert_eq!(tree.mkdir_all("etc").unwrap_err(), TreeError::NotDir);
    }

    #[test]
    fn walk_reports_absolute_paths() {
        let mut tree = Tree::new();
        tree.mkdir_all("files")
            .unwrap()
            .add_file("second", "rel/third")
            .unwrap();

        let mut visited = Vec::new();
        tree.walk(&mut |path, _| -> Result<(), TreeError> {
            visited.push(path.to_path_buf());
            Ok(())
        })
        .unwrap();

        assert!(visited.contains(&PathBuf::from("/files")));
        assert!(visited.contains(&PathBuf::from("/files/second")));
    }
}
