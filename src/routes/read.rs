//! GET /api/v1/read?locator=
//!
//! Runs the fetch on a blocking task. Directory listings are served as
//! `application/array+json`; file content types are guessed from the in-repo
//! path's extension. Dropping the request cancels the fetch.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::{Result, SourceError};
use crate::git::{Cancellation, Fetcher, Secrets};
use crate::locator::{parse_locator, split_repo_path};
use crate::source::GitSource;

pub fn routes<F, S>(source: Arc<GitSource<F, S>>) -> Router
where
    F: Fetcher + 'static,
    S: Secrets + 'static,
{
    Router::new()
        .route("/api/v1/read", get(read_locator::<F, S>))
        .with_state(source)
}

#[derive(Debug, Deserialize)]
struct ReadQuery {
    locator: String,
}

struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

async fn read_locator<F, S>(
    State(source): State<Arc<GitSource<F, S>>>,
    Query(query): Query<ReadQuery>,
) -> Result<Response>
where
    F: Fetcher + 'static,
    S: Secrets + 'static,
{
    let cancel = match source.config().fetch_timeout {
        Some(timeout) => Cancellation::with_timeout(timeout),
        None => Cancellation::new(),
    };
    let _guard = CancelOnDrop(cancel.clone());

    let locator = query.locator.clone();
    let result = tokio::task::spawn_blocking(move || source.read(&locator, &cancel))
        .await
        .map_err(|e| SourceError::Internal(e.to_string()))??;

    let content_type = match result.media_type {
        Some(media_type) => media_type.to_string(),
        None => guess_content_type(&query.locator),
    };

    Ok(([(header::CONTENT_TYPE, content_type)], result.data).into_response())
}

fn guess_content_type(locator: &str) -> String {
    parse_locator(locator)
        .and_then(|url| split_repo_path(Some(&url)))
        .map(|split| {
            mime_guess::from_path(&split.path)
                .first_or_octet_stream()
                .to_string()
        })
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::fs::MemFs;
    use crate::git::testing::ScriptedFetcher;
    use crate::git::Dispatcher;
    use axum::http::StatusCode;
    use std::collections::HashMap;

    fn source(fetcher: ScriptedFetcher) -> Arc<GitSource<ScriptedFetcher, HashMap<String, String>>> {
        Arc::new(GitSource::new(Dispatcher::new(
            fetcher,
            HashMap::new(),
            SourceConfig::default(),
        )))
    }

    fn repo() -> MemFs {
        let mut fs = MemFs::new();
        fs.write_file("/config/app.json", r#"{"debug":true}"#).unwrap();
        fs
    }

    async fn body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn query(locator: &str) -> Query<ReadQuery> {
        Query(ReadQuery {
            locator: locator.to_string(),
        })
    }

    #[tokio::test]
    async fn serves_files_with_guessed_type() {
        let src = source(ScriptedFetcher::new().serve(repo()));
        let response = read_locator(State(src), query("git://host/repo//config/app.json"))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body(response).await, br#"{"debug":true}"#);
    }

    #[tokio::test]
    async fn serves_listings_as_json_arrays() {
        let src = source(ScriptedFetcher::new().serve(repo()));
        let response = read_locator(State(src), query("git://host/repo//config/"))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/array+json"
        );
        assert_eq!(body(response).await, br#"["app.json"]"#);
    }

    #[tokio::test]
    async fn missing_paths_are_404() {
        let src = source(ScriptedFetcher::new().serve(repo()));
        let response = read_locator(State(src), query("git://host/repo//bogus"))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8(body(response).await).unwrap();
        assert!(body.contains("can't stat /bogus"), "{}", body);
    }

    #[tokio::test]
    async fn unsupported_transport_is_400() {
        let src = source(ScriptedFetcher::new());
        let response = read_locator(State(src), query("ftp://host/repo"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn content_type_falls_back_to_octet_stream() {
        assert_eq!(
            guess_content_type("git://host/repo//bin/blob"),
            "application/octet-stream"
        );
        assert_eq!(guess_content_type(""), "application/octet-stream");
    }
}
