//! Locator string in, bytes out.

use url::Url;

use crate::config::SourceConfig;
use crate::error::Result;
use crate::git::{Cancellation, Dispatcher, EnvSecrets, Fetcher, Git2Fetcher, Secrets};
use crate::locator::{parse_locator, split_repo_path};
use crate::reader::{self, ReadResult};

/// Reads files and directory listings out of git repositories named by
/// composite locators. Every read fetches its own snapshot.
pub struct GitSource<F = Git2Fetcher, S = EnvSecrets> {
    dispatcher: Dispatcher<F, S>,
}

impl GitSource {
    pub fn from_env(config: SourceConfig) -> Self {
        Self {
            dispatcher: Dispatcher::from_env(config),
        }
    }
}

impl<F: Fetcher, S: Secrets> GitSource<F, S> {
    pub fn new(dispatcher: Dispatcher<F, S>) -> Self {
        Self { dispatcher }
    }

    pub fn config(&self) -> &SourceConfig {
        self.dispatcher.config()
    }

    pub fn dispatcher(&self) -> &Dispatcher<F, S> {
        &self.dispatcher
    }

    pub fn read(&self, locator: &str, cancel: &Cancellation) -> Result<ReadResult> {
        let url = parse_locator(locator)?;
        self.read_url(&url, cancel)
    }

    pub fn read_url(&self, locator: &Url, cancel: &Cancellation) -> Result<ReadResult> {
        let split = split_repo_path(Some(locator))?;
        let snapshot = self.dispatcher.dispatch(&split.repository, cancel)?;
        tracing::debug!(
            "Reading {} from {} ({})",
            split.path,
            snapshot.reference(),
            snapshot.commit().unwrap_or("unknown commit")
        );
        reader::read(snapshot.fs(), &split.path)
    }
}
