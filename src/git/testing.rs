//! A scripted `Fetcher` for exercising dispatch without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::fs::MemFs;
use crate::git::fetch::{Cancellation, FetchFailure, FetchRequest, Fetcher};
use crate::git::snapshot::Snapshot;

/// Replays queued outcomes in order and records every request it sees.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    outcomes: Mutex<VecDeque<Result<MemFs, FetchFailure>>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn succeed(self) -> Self {
        self.serve(MemFs::new())
    }

    pub(crate) fn serve(self, fs: MemFs) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(fs));
        self
    }

    pub(crate) fn not_found(self) -> Self {
        self.fail(FetchFailure::RepositoryNotFound(
            "could not find repository".to_string(),
        ))
    }

    pub(crate) fn fail(self, failure: FetchFailure) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(failure));
        self
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(
        &self,
        request: &FetchRequest,
        _cancel: &Cancellation,
    ) -> Result<Snapshot, FetchFailure> {
        self.requests.lock().unwrap().push(request.clone());
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Ok(fs)) => Ok(Snapshot::new(fs, request.reference.clone())),
            Some(Err(failure)) => Err(failure),
            None => Err(FetchFailure::Git(git2::Error::from_str("unexpected fetch"))),
        }
    }
}
