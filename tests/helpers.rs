//! Shared test utilities for initrd integration tests.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use initrd::archive::Writer;
use initrd::ldd::Ldd;
use tempfile::TempDir;

/// Test environment rooted in a temporary directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Canonicalized root; keeps symlinked system temp locations from
    /// leaking into the mirrored tree paths.
    pub root: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp dir");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }
}

/// Create a mock executable binary file.
pub fn create_mock_binary(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir for binary");
    }
    fs::write(path, "#!/bin/sh\necho mock\n").expect("Failed to create mock binary");
}

/// Create a mock shared library file with recognizable contents.
pub fn create_mock_library(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir for library");
    }
    fs::write(path, contents).expect("Failed to create mock library");
}

/// Dependency discovery returning a fixed library list.
pub struct FixedLdd(pub Vec<PathBuf>);

impl Ldd for FixedLdd {
    fn linked_libraries(&self, _: &Path) -> Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}

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

impl Call {
    pub fn path(&self) -> &Path {
        match self {
            Call::Regular { path, .. } => path,
            Call::Directory { path } => path,
            Call::Link { path, .. } => path,
        }
    }
}

/// Archive writer that records every call.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub calls: Vec<Call>,
}

impl RecordingWriter {
    pub fn position(&self, path: &Path) -> usize {
        self.calls
            .iter()
            .position(|c| c.path() == path)
            .unwrap_or_else(|| panic!("{} not written", path.display()))
    }
}

impl Writer for RecordingWriter {
    fn write_regular(&mut self, path: &Path, source: &mut dyn Read, mode: u32) -> io::Result<()> {
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
        self.calls.push(Call::Directory {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn write_link(&mut self, path: &Path, target: &Path) -> io::Result<()> {
        self.calls.push(Call::Link {
            path: path.to_path_buf(),
            target: target.to_path_buf(),
        });
        Ok(())
    }
}
