//! Shared-library dependency resolution.
//!
//! Discovers the dynamic libraries a binary needs and inserts them into
//! the archive tree so that every library lands at the location the
//! dynamic linker will look for it. The on-disk layout under the search
//! root is mirrored faithfully: plain directories become directory
//! entries, while a symlinked library directory is kept as a link entry
//! and the libraries themselves are remounted at the link's canonical
//! tree location.

use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::builder::{BuildError, Initrd, INIT_PATH};
use crate::files::TreeError;
use crate::fs::NodeKind;
use crate::ldd::Ldd;

/// Symlink chains longer than this abort resolution.
const MAX_LINK_HOPS: usize = 40;

impl Initrd {
    /// Discover the dynamic libraries `/init` needs and insert them into
    /// the tree, mirroring their layout under `search_path`.
    ///
    /// Discovery failure and libraries missing under the search root are
    /// fatal: the archive cannot be considered complete without its
    /// resolved dependencies.
    pub fn resolve_linked_libs(
        &mut self,
        search_path: impl AsRef<Path>,
        ldd: &dyn Ldd,
    ) -> Result<(), BuildError> {
        let binary = self
            .tree
            .entry_at(INIT_PATH)?
            .related_path()
            .expect("/init is seeded as a regular file at construction")
            .to_path_buf();
        self.resolve_binary_libs(&binary, search_path, ldd)
    }

    /// Same as [`Initrd::resolve_linked_libs`] for an arbitrary binary
    /// already known to the caller.
    pub fn resolve_binary_libs(
        &mut self,
        binary: &Path,
        search_path: impl AsRef<Path>,
        ldd: &dyn Ldd,
    ) -> Result<(), BuildError> {
        let search_path = search_path.as_ref();
        let libs = ldd
            .linked_libraries(binary)
            .map_err(|source| BuildError::Discovery {
                binary: binary.to_path_buf(),
                source,
            })?;

        let lib_dir = self.mirror_directory(search_path)?;

        let mut seen = HashSet::new();
        for lib in libs {
            let Some(name) = lib.file_name() else {
                continue;
            };
            let name = name.to_string_lossy().into_owned();
            if !seen.insert(name.clone()) {
                continue;
            }

            // The as-seen path goes through any symlinked directories;
            // the source filesystem resolves those on its own. Only a
            // symlink at the file itself needs following here.
            let as_seen = search_path.join(&name);
            let source_path = self.resolve_source_file(as_seen)?;

            match self.tree.mkdir_all(&lib_dir)?.add_file(&name, &source_path) {
                Ok(_) => {}
                // Shared dependency already inserted for another binary.
                Err(TreeError::Exists) => continue,
                Err(err) => return Err(err.into()),
            }
            println!("  Resolved library: {} -> {}", name, source_path.display());
        }
        Ok(())
    }

    /// Mirror the directory chain of `search_path` into the tree.
    ///
    /// Returns the tree directory libraries are inserted under. Plain
    /// directories are created idempotently. A symlinked segment becomes
    /// a link entry at its as-seen path pointing at `/<name>`, the
    /// canonical tree location the linked directory is remounted at;
    /// mirroring continues there.
    fn mirror_directory(&mut self, search_path: &Path) -> Result<PathBuf, BuildError> {
        let mut tree_dir = PathBuf::from("/");
        let mut seen_prefix = PathBuf::new();

        for component in search_path.components() {
            match component {
                Component::RootDir => seen_prefix.push("/"),
                Component::CurDir => {}
                Component::Normal(name) => {
                    seen_prefix.push(name);
                    let name = name.to_string_lossy().into_owned();
                    match self.stat(&seen_prefix)? {
                        NodeKind::Directory => {
                            self.tree.mkdir_all(tree_dir.join(&name))?;
                            tree_dir.push(&name);
                        }
                        NodeKind::Symlink => {
                            let target = PathBuf::from("/").join(&name);
                            match self.tree.mkdir_all(&tree_dir)?.add_link(&name, &target) {
                                Ok(_) | Err(TreeError::Exists) => {}
                                Err(err) => return Err(err.into()),
                            }
                            self.tree.mkdir_all(&target)?;
                            tree_dir = target;
                        }
                        NodeKind::File => return Err(TreeError::NotDir.into()),
                    }
                }
                // Dot-dot and prefixes have no mirror in the tree.
                _ => return Err(TreeError::NotExists.into()),
            }
        }
        Ok(tree_dir)
    }

    /// Follow a chain of source-filesystem symlinks to the real backing
    /// file. Relative targets resolve against the link's parent.
    fn resolve_source_file(&self, path: PathBuf) -> Result<PathBuf, BuildError> {
        let mut path = path;
        for _ in 0..MAX_LINK_HOPS {
            match self.stat(&path)? {
                NodeKind::Symlink => {
                    let target =
                        self.source
                            .read_link(&path)
                            .map_err(|source| BuildError::SourceStat {
                                path: path.clone(),
                                source,
                            })?;
                    path = if target.is_absolute() {
                        target
                    } else {
                        match path.parent() {
                            Some(parent) => parent.join(target),
                            None => target,
                        }
                    };
                }
                _ => return Ok(path),
            }
        }
        Err(BuildError::SourceStat {
            path,
            source: io::Error::other("too many levels of symbolic links"),
        })
    }

    fn stat(&self, path: &Path) -> Result<NodeKind, BuildError> {
        self.source
            .node_kind(path)
            .map_err(|source| BuildError::SourceStat {
                path: path.to_path_buf(),
                source,
            })
    }
}
