//! Git Source - read files and directory listings out of git repositories
//!
//! A composite locator such as
//! `git+https://github.com/org/repo//docs/readme.md#v1.2.3` names a
//! repository, a path inside it and a revision. `GitSource::read` fetches a
//! fresh snapshot of that revision and returns either the file's bytes or a
//! JSON array of the directory's entry names.

pub mod config;
pub mod error;
pub mod fs;
pub mod git;
pub mod locator;
pub mod reader;
pub mod routes;
pub mod source;

pub use config::SourceConfig;
pub use error::{Result, SourceError};
pub use git::Cancellation;
pub use reader::{ReadResult, DIRECTORY_MEDIA_TYPE};
pub use source::GitSource;
