//! API route handlers.
//!
//! - `read`: GET /api/v1/read?locator= returns the file bytes or directory
//!   listing a composite locator names

pub mod read;

use std::sync::Arc;

use axum::Router;

use crate::git::{Fetcher, Secrets};
use crate::source::GitSource;

pub fn create_router<F, S>(source: Arc<GitSource<F, S>>) -> Router
where
    F: Fetcher + 'static,
    S: Secrets + 'static,
{
    Router::new().merge(read::routes(source))
}
