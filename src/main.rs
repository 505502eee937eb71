//! Git Source - read files out of git repositories by locator
//!
//! # Usage
//! ```bash
//! git-source read 'git+https://github.com/org/repo//README.md'   # Print a file
//! git-source read 'git+file:///srv/repo//docs/#main'              # List a directory
//! git-source serve --port 3001                                    # Serve GET /api/v1/read
//! ```
//!
//! Credentials come from `GIT_HTTP_PASSWORD`, `GIT_HTTP_TOKEN` and
//! `GIT_SSH_KEY` (or their `_FILE` variants).

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use git_source::{routes, Cancellation, GitSource, SourceConfig};

/// Git Source - read files and directory listings from git repositories
#[derive(Parser)]
#[command(name = "git-source")]
#[command(about = "Read files out of git repositories by locator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory local (git+file) repository paths are resolved under
    #[arg(long, default_value = "/", global = true)]
    root: PathBuf,

    /// Branch used when a locator has no #revision
    #[arg(long, default_value = git_source::config::DEFAULT_BRANCH, global = true)]
    default_branch: String,

    /// Abort fetches that take longer than this many seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the file or directory listing a locator names
    Read {
        /// Composite locator, e.g. git+https://host/org/repo//path#ref
        #[arg(value_name = "LOCATOR")]
        locator: String,
    },
    /// Serve reads over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to run the server on
        #[arg(short, long, default_value = "3001")]
        port: u16,
    },
}

impl Cli {
    fn config(&self) -> SourceConfig {
        let config = SourceConfig::default()
            .with_root(&self.root)
            .with_default_branch(&self.default_branch);
        match self.timeout {
            Some(secs) => config.with_fetch_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}

fn read(source: &GitSource, locator: &str) -> anyhow::Result<()> {
    let cancel = match source.config().fetch_timeout {
        Some(timeout) => Cancellation::with_timeout(timeout),
        None => Cancellation::new(),
    };
    let result = source.read(locator, &cancel)?;
    if let Some(media_type) = result.media_type {
        tracing::debug!("{} is a directory ({})", locator, media_type);
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&result.data)?;
    stdout.flush()?;
    Ok(())
}

async fn serve(source: GitSource, host: &str, port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .merge(routes::create_router(Arc::new(source)))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Serving git sources on http://{}", addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let source = GitSource::from_env(cli.config());

    match cli.command {
        Commands::Read { locator } => {
            tokio::task::spawn_blocking(move || read(&source, &locator)).await??;
        }
        Commands::Serve { host, port } => serve(source, &host, port).await?,
    }

    Ok(())
}
