//! The initramfs archive builder.

use std::io;
use std::path::PathBuf;

use crate::archive::Writer;
use crate::files::{Entry, Tree, TreeError};
use crate::fs::{HostFs, SourceFs};

/// Archive path of the kernel bootstrap entry point. A kernel always
/// executes `/init` from the initramfs root.
pub const INIT_PATH: &str = "init";

/// Staging directory for files added via [`Initrd::add_file`].
const FILES_DIR: &str = "files";

/// Permission mode for every regular entry in the archive, regardless of
/// the source file's own mode.
const FILE_MODE: u32 = 0o755;

/// Errors from building and serializing the archive.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// A regular entry's bytes could not be opened on the source
    /// filesystem.
    #[error("cannot open source file {}", path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A source path could not be inspected during dependency
    /// resolution.
    #[error("cannot stat source path {}", path.display())]
    SourceStat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The archive writer reported a failure; the serialization was
    /// aborted at this entry.
    #[error("archive writer failed for {}", path.display())]
    Writer {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The dependency-discovery collaborator failed. The archive cannot
    /// be considered complete without resolved dependencies.
    #[error("dependency discovery failed for {}", binary.display())]
    Discovery {
        binary: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// In-memory model of an initramfs image.
///
/// Owns the virtual file tree and a handle to the source filesystem the
/// file bytes are read from at serialization time. Built up by a single
/// owner, then serialized once through [`Initrd::write_to`].
pub struct Initrd {
    pub(crate) source: Box<dyn SourceFs>,
    pub(crate) tree: Tree,
}

impl Initrd {
    /// Create a builder whose `/init` entry reads its bytes from `init`
    /// on the host filesystem.
    pub fn new(init: impl Into<PathBuf>) -> Self {
        Self::with_source(Box::new(HostFs), init)
    }

    /// Create a builder over an injected source filesystem.
    pub fn with_source(source: Box<dyn SourceFs>, init: impl Into<PathBuf>) -> Self {
        let mut tree = Tree::new();
        tree.root_mut()
            .add_file(INIT_PATH, init)
            .expect("fresh tree has no entries");
        Self { source, tree }
    }

    /// The virtual file tree built so far.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Add a regular file under the `files/` staging directory.
    ///
    /// An empty `name` uses the base name of `source_path` as the
    /// insertion key. Fails with [`TreeError::Exists`] if the name is
    /// already taken there.
    pub fn add_file(&mut self, name: &str, source_path: impl Into<PathBuf>) -> Result<(), BuildError> {
        let source_path = source_path.into();
        let name = match name {
            "" => source_path
                .file_name()
                .ok_or(TreeError::NotExists)?
                .to_string_lossy()
                .into_owned(),
            given => given.to_string(),
        };
        self.tree.mkdir_all(FILES_DIR)?.add_file(&name, source_path)?;
        Ok(())
    }

    /// Add a batch of files, each under its base name. An empty batch is
    /// a successful no-op.
    pub fn add_files<I, P>(&mut self, paths: I) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.add_file("", path)?;
        }
        Ok(())
    }

    /// Serialize the whole tree through `writer`.
    ///
    /// Walks depth first, parents before children, and makes one writer
    /// call per entry. Regular entries are opened lazily on the source
    /// filesystem and written with mode `0o755`. The first error from
    /// either side aborts the walk; the caller discards any partially
    /// written archive.
    pub fn write_to(&self, writer: &mut dyn Writer) -> Result<(), BuildError> {
        self.tree.walk(&mut |path, entry| match entry {
            Entry::Directory { .. } => {
                writer
                    .write_directory(path)
                    .map_err(|source| BuildError::Writer {
                        path: path.to_path_buf(),
                        source,
                    })
            }
            Entry::Link { target } => {
                writer
                    .write_link(path, target)
                    .map_err(|source| BuildError::Writer {
                        path: path.to_path_buf(),
                        source,
                    })
            }
            Entry::Regular { source } => {
                let mut reader =
                    self.source
                        .open(source)
                        .map_err(|err| BuildError::SourceOpen {
                            path: source.clone(),
                            source: err,
                        })?;
                writer
                    .write_regular(path, &mut *reader, FILE_MODE)
                    .map_err(|source| BuildError::Writer {
                        path: path.to_path_buf(),
                        source,
                    })
            }
        })
    }
}
