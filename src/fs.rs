//! The read-only source filesystem seam.
//!
//! Everything the builder knows about the world it packages comes
//! through [`SourceFs`]: opening file bytes, lstat-style node kinds, and
//! symlink targets. The default binding is the host filesystem; tests
//! substitute [`MemoryFs`].

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// What a path refers to, without following a final symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    Symlink,
}

/// Read-only filesystem the builder reads file bytes and layout
/// metadata from.
pub trait SourceFs {
    /// Open a path for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// The kind of node at `path`, with lstat semantics: a final symlink
    /// is reported as [`NodeKind::Symlink`], not followed.
    fn node_kind(&self, path: &Path) -> io::Result<NodeKind>;

    /// The target of the symlink at `path`, verbatim.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The host filesystem, the default source binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl SourceFs for HostFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(path)?))
    }

    fn node_kind(&self, path: &Path) -> io::Result<NodeKind> {
        let file_type = std::fs::symlink_metadata(path)?.file_type();
        Ok(if file_type.is_symlink() {
            NodeKind::Symlink
        } else if file_type.is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }
}

#[derive(Debug, Clone)]
enum MemNode {
    File(Vec<u8>),
    Directory,
    Symlink(PathBuf),
}

/// In-memory source filesystem for tests.
///
/// Lookups are exact-path: intermediate symlinks are not traversed.
/// Fixtures that need real symlink semantics use a temporary directory
/// over [`HostFs`] instead.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    nodes: BTreeMap<PathBuf, MemNode>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a regular file with its contents.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        self.nodes.insert(path.into(), MemNode::File(data.into()));
    }

    /// Register a directory.
    pub fn add_dir(&mut self, path: impl Into<PathBuf>) {
        self.nodes.insert(path.into(), MemNode::Directory);
    }

    /// Register a symlink with its target.
    pub fn add_symlink(&mut self, path: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        self.nodes
            .insert(path.into(), MemNode::Symlink(target.into()));
    }

    fn get(&self, path: &Path) -> io::Result<&MemNode> {
        self.nodes.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: no such file or directory", path.display()),
            )
        })
    }
}

impl SourceFs for MemoryFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        match self.get(path)? {
            MemNode::File(data) => Ok(Box::new(Cursor::new(data.clone()))),
            _ => Err(io::Error::other(format!(
                "{}: not a regular file",
                path.display()
            ))),
        }
    }

    fn node_kind(&self, path: &Path) -> io::Result<NodeKind> {
        Ok(match self.get(path)? {
            MemNode::File(_) => NodeKind::File,
            MemNode::Directory => NodeKind::Directory,
            MemNode::Symlink(_) => NodeKind::Symlink,
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        match self.get(path)? {
            MemNode::Symlink(target) => Ok(target.clone()),
            _ => Err(io::Error::other(format!(
                "{}: not a symlink",
                path.display()
            ))),
        }
    }
}
