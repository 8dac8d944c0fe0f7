//! Shared-library dependency discovery.
//!
//! The resolver only depends on the [`Ldd`] trait; the default binding
//! shells out to the host's `ldd` program, which already reports the
//! transitive closure of a binary's dynamic dependencies.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Discovers the shared libraries a compiled binary needs at run time.
pub trait Ldd {
    /// The absolute paths of every shared library `binary` requires,
    /// including transitive dependencies.
    fn linked_libraries(&self, binary: &Path) -> Result<Vec<PathBuf>>;
}

/// Dependency discovery backed by the host's `ldd` program.
#[derive(Debug, Clone)]
pub struct SystemLdd {
    program: PathBuf,
}

impl SystemLdd {
    /// Locate `ldd` and build the discoverer.
    ///
    /// The `LDD_BINARY` environment variable overrides the PATH lookup.
    pub fn new() -> Result<Self> {
        Ok(Self {
            program: find_ldd_binary()?,
        })
    }
}

impl Ldd for SystemLdd {
    fn linked_libraries(&self, binary: &Path) -> Result<Vec<PathBuf>> {
        let output = Command::new(&self.program)
            .arg(binary)
            .output()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if !output.status.success() {
            bail!(
                "ldd failed for {}: {}",
                binary.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(parse_ldd_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Find the `ldd` binary: `LDD_BINARY` env var first, then PATH.
fn find_ldd_binary() -> Result<PathBuf> {
    if let Ok(path) = env::var("LDD_BINARY") {
        let path = PathBuf::from(&path);
        if path.exists() {
            return Ok(path);
        }
    }
    which::which("ldd").context("ldd not found in PATH")
}

/// Extract absolute library paths from `ldd` output.
///
/// Lines look like "libc.so.6 => /lib64/libc.so.6 (0x...)" or
/// "/lib64/ld-linux-x86-64.so.2 (0x...)". Entries without an absolute
/// path (linux-vdso, "=> not found", "statically linked") contribute
/// nothing.
pub fn parse_ldd_output(output: &str) -> Vec<PathBuf> {
    let mut libs = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if let Some(path_part) = line.split_once("=>").map(|(_, rest)| rest) {
            if let Some(path) = path_part.split_whitespace().next() {
                if path.starts_with('/') {
                    libs.push(PathBuf::from(path));
                }
            }
        } else if line.starts_with('/') {
            if let Some(path) = line.split_whitespace().next() {
                libs.push(PathBuf::from(path));
            }
        }
    }

    libs
}
