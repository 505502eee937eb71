use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BRANCH: &str = "master";

/// Settings shared by every read.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Local-transport repository paths are resolved beneath this directory.
    pub root: PathBuf,
    /// Branch fetched when a locator carries no revision.
    pub default_branch: String,
    /// Upper bound on a single fetch. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            default_branch: DEFAULT_BRANCH.to_string(),
            fetch_timeout: None,
        }
    }
}

impl SourceConfig {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }
}
