//! lookout-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the record API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash` in config.toml:
//!
//! ```text
//! cargo run -p lookout-server -- --hash-password
//! ```
//!
//! # Seeding
//!
//! `--import visitors.json` loads a JSON array of visitor records into the
//! configured collection and exits.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use lookout_core::VisitorFields;
use lookout_server::{AppState, ServerConfig, auth::hash_password};
use lookout_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lookout admin console server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", env = "LOOKOUT_CONFIG")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Import visitor records from a JSON array file and exit.
  #[arg(long, value_name = "FILE")]
  import: Option<PathBuf>,
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

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    println!("{}", hash_password(&password)?);
    return Ok(());
  }

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "lookout.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LOOKOUT"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(path) = cli.import {
    let raw = tokio::fs::read_to_string(&path)
      .await
      .with_context(|| format!("failed to read {path:?}"))?;
    let batch = VisitorFields::parse_batch(&raw)
      .with_context(|| format!("{path:?} is not a JSON array of visitor records"))?;
    let records = store
      .insert_batch(&server_cfg.collection, batch)
      .await
      .context("import failed")?;
    tracing::info!(
      count = records.len(),
      collection = %server_cfg.collection,
      "imported visitor records"
    );
    return Ok(());
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = lookout_server::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
