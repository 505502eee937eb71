pub mod auth;
pub mod dispatch;
pub mod fetch;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{Credential, EnvSecrets, Secrets};
pub use dispatch::Dispatcher;
pub use fetch::{Cancellation, FetchFailure, FetchRequest, Fetcher, Git2Fetcher};
pub use snapshot::{Snapshot, TreeFs};
