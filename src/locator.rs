//! Composite locator parsing.
//!
//! A locator names a repository, an optional path inside it and an optional
//! revision:
//!
//! ```text
//! git+https://user@host/org/repo//docs/readme.md#v1.2.3
//! \______________________________/\_____________/ \____/
//!          repository base          in-repo path  revision
//! ```
//!
//! The revision stays attached to the repository base as its fragment; the
//! dispatcher consumes it when building the fetch request.

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{Result, SourceError};

/// Separates the repository path from the in-repo path.
pub const PATH_DELIMITER: &str = "//";

/// Marks a locator scheme as a git transport (`git+https`, `git+file`, ...).
pub const TRANSPORT_PREFIX: &str = "git+";

/// Conventional directory holding the repository database of a working copy.
pub const REPO_DIR_SUFFIX: &str = ".git";

/// Shallow fetches keep only the tip commit.
pub const SHALLOW_DEPTH: u32 = 1;

/// Depth 0 asks for full history.
pub const FULL_DEPTH: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    File,
    Http,
    Https,
    Ssh,
    /// The native git protocol, written without the transport prefix.
    Git,
}

impl Transport {
    pub fn from_scheme(scheme: &str) -> Result<Self> {
        match scheme {
            "git+file" => Ok(Transport::File),
            "git+http" => Ok(Transport::Http),
            "git+https" => Ok(Transport::Https),
            "git+ssh" => Ok(Transport::Ssh),
            "git" => Ok(Transport::Git),
            other => Err(SourceError::TransportUnsupported(other.to_string())),
        }
    }

    /// The scheme the fetch capability expects, with the transport prefix stripped.
    pub fn scheme(self) -> &'static str {
        match self {
            Transport::File => "file",
            Transport::Http => "http",
            Transport::Https => "https",
            Transport::Ssh => "ssh",
            Transport::Git => "git",
        }
    }

    /// Local fetches can't assume shallow support, so they always take full history.
    pub fn depth(self) -> u32 {
        match self {
            Transport::File => FULL_DEPTH,
            _ => SHALLOW_DEPTH,
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.scheme())
    }
}

/// A locator split into its repository base and in-repo path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLocator {
    /// Scheme, authority, repository path and revision fragment.
    pub repository: Url,
    /// Always starts with `/`.
    pub path: String,
}

pub fn parse_locator(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SourceError::LocatorMalformed(
            "no locator provided".to_string(),
        ));
    }
    Url::parse(raw).map_err(|e| SourceError::LocatorMalformed(format!("can't parse locator: {}", e)))
}

/// Splits the in-repo path out of a locator at the first `//` in its path.
///
/// Without a delimiter the whole locator is the repository and the in-repo
/// path is `/`.
pub fn split_repo_path(locator: Option<&Url>) -> Result<SplitLocator> {
    let locator = locator.ok_or_else(|| {
        SourceError::LocatorMalformed("no locator provided".to_string())
    })?;

    match locator.path().split_once(PATH_DELIMITER) {
        None => Ok(SplitLocator {
            repository: locator.clone(),
            path: "/".to_string(),
        }),
        Some((repo_path, inner)) => {
            let mut repository = locator.clone();
            repository.set_path(repo_path);
            let inner = percent_decode_str(inner).decode_utf8_lossy();
            Ok(SplitLocator {
                repository,
                path: format!("/{}", inner),
            })
        }
    }
}

/// The same locator with the repository directory appended to its path.
pub fn with_repo_dir_suffix(locator: &Url) -> Url {
    let mut out = locator.clone();
    let path = format!("{}/{}", locator.path().trim_end_matches('/'), REPO_DIR_SUFFIX);
    out.set_path(&path);
    out
}

/// Renders a locator for messages, hiding any password in the user-info.
pub fn redacted(locator: &Url) -> String {
    let mut out = locator.clone();
    if out.password().is_some() {
        let _ = out.set_password(Some("xxxxx"));
    }
    out.to_string()
}

/// `redacted` for a URL held as text. Unparseable input is returned as-is.
pub fn display_url(raw: &str) -> String {
    Url::parse(raw)
        .map(|url| redacted(&url))
        .unwrap_or_else(|_| raw.to_string())
}
