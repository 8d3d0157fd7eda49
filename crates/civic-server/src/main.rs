//! civic-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, seeds roles if the store has none, and serves the
//! JSON API over HTTP.
//!
//! # Reconciliation
//!
//! To rebuild every cached counter from the ledger without serving:
//!
//! ```sh
//! cargo run -p civic-server -- --recount
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use civic_core::{entity::NewRole, store::CivicStore};
use civic_store_sqlite::SqliteStore;
use clap::Parser;
use settings::{ServerConfig, expand_tilde};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Civic engagement API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Recount all cached counters, print the report and exit.
  #[arg(long)]
  recount: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.recount {
    let report = store
      .recount_counters()
      .await
      .context("failed to recount counters")?;
    println!(
      "corrected {} upvote, {} comment and {} issue counters",
      report.upvote_counts, report.comment_counts, report.issue_counts
    );
    return Ok(());
  }

  seed_roles(&store, &server_cfg.seed_roles).await?;

  if server_cfg.recount_on_startup {
    store
      .recount_counters()
      .await
      .context("startup recount failed")?;
  }

  let app = civic_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Insert `roles` if the store has no roles yet.
async fn seed_roles(store: &SqliteStore, roles: &[NewRole]) -> anyhow::Result<()> {
  if roles.is_empty() {
    return Ok(());
  }
  let existing = store.list_roles().await.context("failed to list roles")?;
  if !existing.is_empty() {
    tracing::debug!(count = existing.len(), "roles already present; skipping seed");
    return Ok(());
  }

  for role in roles {
    let created = store
      .add_role(role.clone())
      .await
      .with_context(|| format!("failed to seed role {:?}", role.title))?;
    tracing::info!(role_id = %created.role_id, title = %created.title, "seeded role");
  }
  Ok(())
}
