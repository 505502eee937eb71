//! Read-only filesystem view over a fetched snapshot.
//!
//! - `SnapshotFs`: stat / read_dir / open, all with `/`-rooted paths
//! - `MemFs`: in-memory implementation used to exercise the reader
//!
//! The git-backed implementation lives in `git::snapshot`.

mod memory;

pub use memory::MemFs;

use std::io::{self, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
    Submodule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub entry_type: EntryType,
    pub size: Option<u64>,
}

impl FileInfo {
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

pub trait SnapshotFs: Send {
    fn stat(&self, path: &str) -> io::Result<FileInfo>;

    /// Immediate children of `path`, in the order the filesystem stores them.
    fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>>;

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>>;

    /// The git repository backing this view, if there is one.
    fn repository(&self) -> Option<&git2::Repository> {
        None
    }
}

/// Turns a `/`-rooted path into its components. The root is an empty list.
pub(crate) fn components(path: &str) -> io::Result<Vec<&str>> {
    if path.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty path"));
    }
    let mut out = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "parent directory references are not allowed",
                ));
            }
            _ => out.push(part),
        }
    }
    Ok(out)
}

/// Last component of a path, `/` for the root.
pub(crate) fn base_name(path: &str) -> String {
    path.rsplit('/')
        .find(|part| !part.is_empty())
        .unwrap_or("/")
        .to_string()
}
