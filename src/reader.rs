//! Reads a path out of a snapshot.
//!
//! Directories come back as a compact JSON array of entry names tagged with
//! `DIRECTORY_MEDIA_TYPE`; files come back as raw bytes with no media type, so
//! the caller can infer one from the path's extension.

use std::io::Read;

use crate::error::{Result, SourceError};
use crate::fs::SnapshotFs;

pub const DIRECTORY_MEDIA_TYPE: &str = "application/array+json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    /// Only set for directory listings.
    pub media_type: Option<&'static str>,
    pub data: Vec<u8>,
}

pub fn read(fs: &dyn SnapshotFs, path: &str) -> Result<ReadResult> {
    let info = fs.stat(path).map_err(|source| SourceError::StatFailed {
        path: path.to_string(),
        source,
    })?;

    if info.is_dir() || path.ends_with('/') {
        return Ok(ReadResult {
            media_type: Some(DIRECTORY_MEDIA_TYPE),
            data: read_dir(fs, path)?,
        });
    }

    let mut file = fs.open(path).map_err(|source| SourceError::OpenFailed {
        path: path.to_string(),
        source,
    })?;

    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|source| SourceError::ReadFailed {
            path: path.to_string(),
            source,
        })?;

    Ok(ReadResult {
        media_type: None,
        data,
    })
}

fn read_dir(fs: &dyn SnapshotFs, path: &str) -> Result<Vec<u8>> {
    let entries = fs.read_dir(path).map_err(|source| SourceError::ReadDirFailed {
        path: path.to_string(),
        source,
    })?;
    let names: Vec<String> = entries.into_iter().map(|entry| entry.name).collect();

    serde_json::to_vec(&names).map_err(|source| SourceError::EncodeFailed {
        path: path.to_string(),
        source,
    })
}
