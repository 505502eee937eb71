//! The fetch capability: turns a resolved request into a snapshot.
//!
//! `Git2Fetcher` fetches a single reference into a throwaway bare repository
//! and serves the fetched commit's tree. Nothing is cached between requests.
//!
//! Cancellation is observed before the fetch and from every libgit2 callback
//! (credentials, certificate check, progress). While libgit2 is blocked on a
//! socket no callback runs, so a stalled server is only abandoned once the
//! timeouts set by `apply_server_timeouts` expire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use git2::{
    AutotagOption, CertificateCheckStatus, Cred, CredentialType, ErrorClass, ErrorCode,
    FetchOptions, RemoteCallbacks, Repository,
};
use thiserror::Error;
use url::Url;

use crate::git::auth::Credential;
use crate::git::snapshot::{Snapshot, TreeFs};
use crate::locator::{display_url, Transport};

/// Cancellation signal for an in-flight fetch: an explicit flag plus an
/// optional deadline. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub transport: Transport,
    /// Transport URL with the prefix tag and the revision fragment removed.
    pub url: String,
    /// Fully-qualified reference, never empty.
    pub reference: String,
    /// 0 fetches full history.
    pub depth: u32,
    pub credential: Credential,
}

impl FetchRequest {
    /// The transport URL with any password hidden.
    pub fn display_url(&self) -> String {
        display_url(&self.url)
    }
}

impl std::fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRequest")
            .field("transport", &self.transport)
            .field("url", &self.display_url())
            .field("reference", &self.reference)
            .field("depth", &self.depth)
            .field("credential", &self.credential)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("fetch cancelled")]
    Cancelled,

    #[error(transparent)]
    Git(git2::Error),

    #[error("can't prepare snapshot directory: {0}")]
    Workspace(#[from] std::io::Error),
}

impl FetchFailure {
    /// Separates "there is no repository here" from every other git error.
    pub fn from_git(err: git2::Error) -> Self {
        let missing_repository = err.class() == ErrorClass::Repository
            || (err.code() == ErrorCode::NotFound && err.class() != ErrorClass::Reference);
        if missing_repository {
            FetchFailure::RepositoryNotFound(err.message().to_string())
        } else {
            FetchFailure::Git(err)
        }
    }
}

/// Bounds how long libgit2 waits to connect to a server, and on each socket
/// read or write after that. The settings are process-wide.
pub fn apply_server_timeouts(timeout: Duration) -> Result<(), git2::Error> {
    let millis = timeout_millis(timeout);
    // SAFETY: both options only store an integer in libgit2's global settings.
    unsafe {
        git2::opts::set_server_connect_timeout_in_milliseconds(millis)?;
        git2::opts::set_server_timeout_in_milliseconds(millis)?;
    }
    Ok(())
}

// libgit2 treats 0 as "wait forever".
fn timeout_millis(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_millis())
        .unwrap_or(i32::MAX)
        .max(1)
}

/// libgit2's local transport reports a missing path as an OS error, so local
/// repositories are opened up front to tell "nothing here" apart.
fn ensure_local_repository(url: &str) -> Result<(), FetchFailure> {
    let Some(path) = Url::parse(url).ok().and_then(|u| u.to_file_path().ok()) else {
        return Ok(());
    };
    if !path.exists() {
        return Err(FetchFailure::RepositoryNotFound(format!(
            "{} does not exist",
            path.display()
        )));
    }
    Repository::open(&path)
        .map(drop)
        .map_err(FetchFailure::from_git)
}

fn check_cancelled(cancel: &Cancellation) -> Result<(), git2::Error> {
    if cancel.is_cancelled() {
        Err(git2::Error::from_str("fetch cancelled"))
    } else {
        Ok(())
    }
}

pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &FetchRequest, cancel: &Cancellation)
        -> Result<Snapshot, FetchFailure>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Fetcher;

impl Fetcher for Git2Fetcher {
    fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &Cancellation,
    ) -> Result<Snapshot, FetchFailure> {
        if cancel.is_cancelled() {
            return Err(FetchFailure::Cancelled);
        }
        if request.transport == Transport::File {
            ensure_local_repository(&request.url)?;
        }

        let workdir = tempfile::Builder::new().prefix("git-source-").tempdir()?;
        let repo = Repository::init_bare(workdir.path()).map_err(FetchFailure::from_git)?;

        let start = Instant::now();
        let (commit, tree) = {
            let mut remote = repo
                .remote_anonymous(&request.url)
                .map_err(FetchFailure::from_git)?;

            let token_header = match &request.credential {
                Credential::Token(token) => Some(format!("Authorization: Bearer {}", token)),
                _ => None,
            };

            let mut opts = FetchOptions::new();
            opts.remote_callbacks(callbacks(&request.credential, cancel));
            opts.download_tags(AutotagOption::None);
            if request.depth > 0 {
                opts.depth(request.depth as i32);
            }
            if let Some(header) = &token_header {
                opts.custom_headers(&[header.as_str()]);
            }

            let refspec = format!("+{0}:{0}", request.reference);
            remote
                .fetch(&[refspec.as_str()], Some(&mut opts), None)
                .map_err(|e| {
                    if cancel.is_cancelled() {
                        FetchFailure::Cancelled
                    } else {
                        FetchFailure::from_git(e)
                    }
                })?;

            let commit = repo
                .find_reference(&request.reference)
                .and_then(|r| r.peel_to_commit())
                .map_err(FetchFailure::Git)?;
            (commit.id(), commit.tree_id())
        };

        tracing::info!(
            "Fetched {} @ {} ({}) in {:?}",
            request.display_url(),
            request.reference,
            commit,
            start.elapsed()
        );

        let fs = TreeFs::new(repo, tree).with_workdir(workdir);
        Ok(Snapshot::new(fs, request.reference.clone()).with_commit(commit.to_string()))
    }
}

fn callbacks<'a>(credential: &'a Credential, cancel: &'a Cancellation) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();

    // libgit2 keeps asking while credentials are rejected; give up after one try.
    let mut attempts = 0;
    callbacks.credentials(move |_url, username_from_url, allowed| {
        check_cancelled(cancel)?;

        if allowed.contains(CredentialType::USERNAME) {
            let username = match credential {
                Credential::SshKey { username, .. } | Credential::SshAgent { username } => {
                    username.as_str()
                }
                _ => username_from_url.unwrap_or("git"),
            };
            return Cred::username(username);
        }

        attempts += 1;
        if attempts > 1 {
            return Err(git2::Error::from_str("credentials rejected"));
        }

        match credential {
            Credential::Basic { username, password } => Cred::userpass_plaintext(username, password),
            Credential::SshKey {
                username,
                private_key,
            } => Cred::ssh_key_from_memory(username, None, private_key, None),
            Credential::SshAgent { username } => Cred::ssh_key_from_agent(username),
            Credential::Token(_) | Credential::Anonymous => Err(git2::Error::from_str(
                "authentication required but no credentials are configured",
            )),
        }
    });

    callbacks.certificate_check(move |_cert, _host| {
        check_cancelled(cancel)?;
        Ok(CertificateCheckStatus::CertificatePassthrough)
    });
    callbacks.transfer_progress(move |_| !cancel.is_cancelled());
    callbacks.sideband_progress(move |_| !cancel.is_cancelled());
    callbacks
}
