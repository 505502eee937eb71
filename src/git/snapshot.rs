use git2::{ObjectType, Oid, Repository};
use std::io::{self, Cursor, Read};
use std::path::Path;
use tempfile::TempDir;

use crate::fs::{base_name, components, EntryType, FileInfo, SnapshotFs};

/// A fetched revision: its filesystem plus the reference and commit it came from.
///
/// Owned by the read that requested it and dropped with it.
pub struct Snapshot {
    fs: Box<dyn SnapshotFs>,
    reference: String,
    commit: Option<String>,
}

impl Snapshot {
    pub fn new(fs: impl SnapshotFs + 'static, reference: impl Into<String>) -> Self {
        Self {
            fs: Box::new(fs),
            reference: reference.into(),
            commit: None,
        }
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn fs(&self) -> &dyn SnapshotFs {
        self.fs.as_ref()
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }

    /// Repository holding the fetched objects. `None` for snapshots that
    /// aren't backed by git.
    pub fn repository(&self) -> Option<&Repository> {
        self.fs.repository()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("reference", &self.reference)
            .field("commit", &self.commit)
            .finish_non_exhaustive()
    }
}

/// Read-only view of a commit tree inside a repository.
pub struct TreeFs {
    repo: Repository,
    tree: Oid,
    // Holds the fetched object database; removed on drop.
    _workdir: Option<TempDir>,
}

enum Target {
    Root,
    Entry { kind: Option<ObjectType>, id: Oid },
}

impl TreeFs {
    pub fn new(repo: Repository, tree: Oid) -> Self {
        Self {
            repo,
            tree,
            _workdir: None,
        }
    }

    pub(crate) fn with_workdir(mut self, workdir: TempDir) -> Self {
        self._workdir = Some(workdir);
        self
    }

    fn resolve(&self, path: &str) -> io::Result<Target> {
        let parts = components(path)?;
        if parts.is_empty() {
            return Ok(Target::Root);
        }

        let tree = self.repo.find_tree(self.tree).map_err(to_io)?;
        let entry = tree
            .get_path(Path::new(&parts.join("/")))
            .map_err(to_io)?;
        Ok(Target::Entry {
            kind: entry.kind(),
            id: entry.id(),
        })
    }
}

fn entry_type(kind: Option<ObjectType>) -> EntryType {
    match kind {
        Some(ObjectType::Tree) => EntryType::Directory,
        Some(ObjectType::Commit) => EntryType::Submodule,
        _ => EntryType::File,
    }
}

fn to_io(err: git2::Error) -> io::Error {
    let kind = match err.code() {
        git2::ErrorCode::NotFound => io::ErrorKind::NotFound,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, err.message().to_string())
}

impl SnapshotFs for TreeFs {
    fn stat(&self, path: &str) -> io::Result<FileInfo> {
        match self.resolve(path)? {
            Target::Root => Ok(FileInfo {
                name: base_name(path),
                entry_type: EntryType::Directory,
                size: None,
            }),
            Target::Entry { kind, id } => {
                let entry_type = entry_type(kind);
                let size = if entry_type == EntryType::File {
                    Some(self.repo.find_blob(id).map_err(to_io)?.size() as u64)
                } else {
                    None
                };
                Ok(FileInfo {
                    name: base_name(path),
                    entry_type,
                    size,
                })
            }
        }
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>> {
        let id = match self.resolve(path)? {
            Target::Root => self.tree,
            Target::Entry {
                kind: Some(ObjectType::Tree),
                id,
            } => id,
            Target::Entry { .. } => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", path),
                ));
            }
        };

        let tree = self.repo.find_tree(id).map_err(to_io)?;
        Ok(tree
            .iter()
            .map(|entry| FileInfo {
                name: String::from_utf8_lossy(entry.name_bytes()).into_owned(),
                entry_type: entry_type(entry.kind()),
                size: None,
            })
            .collect())
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        match self.resolve(path)? {
            Target::Entry {
                kind: Some(ObjectType::Blob),
                id,
            } => {
                let blob = self.repo.find_blob(id).map_err(to_io)?;
                Ok(Box::new(Cursor::new(blob.content().to_vec())))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is not a file", path),
            )),
        }
    }

    fn repository(&self) -> Option<&Repository> {
        Some(&self.repo)
    }
}
