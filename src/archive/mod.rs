//! The abstract archive writer contract.
//!
//! The builder serializes its tree through this trait without knowing
//! anything about the concrete byte format. Implementations encode the
//! calls into a cpio-style archive stream, a directory on disk, or (in
//! tests) a plain record of what was written.

use std::io::{self, Read};
use std::path::Path;

/// Destination for serialized tree entries.
///
/// The builder makes exactly one call per entry, depth first, parents
/// before their children. There is no retry: a failing call aborts the
/// whole serialization and the caller discards the partial archive.
pub trait Writer {
    /// Write a regular file from a readable byte source.
    fn write_regular(&mut self, path: &Path, source: &mut dyn Read, mode: u32) -> io::Result<()>;

    /// Write a directory.
    fn write_directory(&mut self, path: &Path) -> io::Result<()>;

    /// Write a symbolic link with its target verbatim.
    fn write_link(&mut self, path: &Path, target: &Path) -> io::Result<()>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::io::{self, Read};
    use std::path::{Path, PathBuf};

    use super::Writer;

    /// One recorded writer invocation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Regular {
            path: PathBuf,
            data: Vec<u8>,
            mode: u32,
        },
        Directory {
            path: PathBuf,
        },
        Link {
            path: PathBuf,
            target: PathBuf,
        },
    }

    /// Records every call; arm `fail` to report an error instead.
    #[derive(Debug, Default)]
    pub struct MockWriter {
        pub calls: Vec<Call>,
        pub fail: bool,
    }

    impl MockWriter {
        fn check(&self) -> io::Result<()> {
            if self.fail {
                Err(io::Error::other("mock writer failure"))
            } else {
                Ok(())
            }
        }
    }

    impl Writer for MockWriter {
        fn write_regular(
            &mut self,
            path: &Path,
            source: &mut dyn Read,
            mode: u32,
        ) -> io::Result<()> {
            self.check()?;
            let mut data = Vec::new();
            source.read_to_end(&mut data)?;
            self.calls.push(Call::Regular {
                path: path.to_path_buf(),
                data,
                mode,
            });
            Ok(())
        }

        fn write_directory(&mut self, path: &Path) -> io::Result<()> {
            self.check()?;
            self.calls.push(Call::Directory {
                path: path.to_path_buf(),
            });
            Ok(())
        }

        fn write_link(&mut self, path: &Path, target: &Path) -> io::Result<()> {
            self.check()?;
            self.calls.push(Call::Link {
                path: path.to_path_buf(),
                target: target.to_path_buf(),
            });
            Ok(())
        }
    }
}
