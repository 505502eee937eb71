use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};

use super::{base_name, components, EntryType, FileInfo, SnapshotFs};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir(BTreeMap<String, Node>),
}

impl Node {
    fn info(&self, name: String) -> FileInfo {
        match self {
            Node::File(data) => FileInfo {
                name,
                entry_type: EntryType::File,
                size: Some(data.len() as u64),
            },
            Node::Dir(_) => FileInfo {
                name,
                entry_type: EntryType::Directory,
                size: None,
            },
        }
    }
}

/// In-memory filesystem. Directory listings come back sorted by name.
#[derive(Debug, Clone)]
pub struct MemFs {
    root: Node,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFs {
    pub fn new() -> Self {
        Self {
            root: Node::Dir(BTreeMap::new()),
        }
    }

    pub fn mkdir_all(&mut self, path: &str) -> io::Result<()> {
        self.dir_mut(&components(path)?).map(|_| ())
    }

    /// Writes a file, creating any missing parent directories.
    pub fn write_file(&mut self, path: &str, data: impl Into<Vec<u8>>) -> io::Result<()> {
        let parts = components(path)?;
        let (name, parents) = parts
            .split_last()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "can't write to /"))?;
        let dir = self.dir_mut(parents)?;
        if let Some(Node::Dir(_)) = dir.get(*name) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path),
            ));
        }
        dir.insert(name.to_string(), Node::File(data.into()));
        Ok(())
    }

    fn dir_mut(&mut self, parts: &[&str]) -> io::Result<&mut BTreeMap<String, Node>> {
        let mut node = &mut self.root;
        for part in parts {
            node = match node {
                Node::Dir(children) => children
                    .entry(part.to_string())
                    .or_insert_with(|| Node::Dir(BTreeMap::new())),
                Node::File(_) => return Err(not_a_directory(part)),
            };
        }
        match node {
            Node::Dir(children) => Ok(children),
            Node::File(_) => Err(not_a_directory(parts.last().copied().unwrap_or("/"))),
        }
    }

    fn lookup(&self, path: &str) -> io::Result<&Node> {
        let mut node = &self.root;
        for part in components(path)? {
            node = match node {
                Node::Dir(children) => children.get(part).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "file does not exist")
                })?,
                Node::File(_) => return Err(not_a_directory(part)),
            };
        }
        Ok(node)
    }
}

fn not_a_directory(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotADirectory,
        format!("{} is not a directory", name),
    )
}

impl SnapshotFs for MemFs {
    fn stat(&self, path: &str) -> io::Result<FileInfo> {
        Ok(self.lookup(path)?.info(base_name(path)))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>> {
        match self.lookup(path)? {
            Node::Dir(children) => Ok(children
                .iter()
                .map(|(name, node)| node.info(name.clone()))
                .collect()),
            Node::File(_) => Err(not_a_directory(path)),
        }
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        match self.lookup(path)? {
            Node::File(data) => Ok(Box::new(Cursor::new(data.as_slice()))),
            Node::Dir(_) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path),
            )),
        }
    }
}
