//! `lookout`: terminal admin console for the Lookout visitor store.
//!
//! # Usage
//!
//! ```text
//! lookout --url http://localhost:8080 --email admin@example.com
//! lookout --config ~/.config/lookout/console.toml --log-file lookout.log
//! ```

mod app;
mod client;
mod ui;

use std::{io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lookout_core::Session;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lookout", about = "Terminal admin console for Lookout visitor records")]
struct Args {
  /// Path to a TOML config file (url, email, password, collection).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the lookout server (default: http://localhost:8080).
  #[arg(long, env = "LOOKOUT_URL")]
  url: Option<String>,

  /// Administrator email; with a password, signs in on start.
  #[arg(long, env = "LOOKOUT_EMAIL")]
  email: Option<String>,

  /// Administrator password (plaintext).
  #[arg(long, env = "LOOKOUT_PASSWORD")]
  password: Option<String>,

  /// Collection holding visitor records.
  #[arg(long)]
  collection: Option<String>,

  /// Write logs to this file; the terminal is taken by the UI.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:        String,
  #[serde(default)]
  email:      String,
  #[serde(default)]
  password:   String,
  #[serde(default)]
  collection: String,
}

/// `flag`, else the config file's value when set.
fn pick(flag: Option<String>, file: &str) -> Option<String> {
  flag.or_else(|| (!file.is_empty()).then(|| file.to_owned()))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log_file {
    let file = std::fs::File::create(path)
      .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::from_default_env())
      .with_ansi(false)
      .with_writer(Mutex::new(file))
      .init();
  }

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url =
    pick(args.url, &file_cfg.url).unwrap_or_else(|| "http://localhost:8080".to_string());
  let email = pick(args.email, &file_cfg.email);
  let password = pick(args.password, &file_cfg.password);
  let collection =
    pick(args.collection, &file_cfg.collection).unwrap_or_else(|| "Users".to_string());

  let client = ApiClient::new(ApiConfig { base_url })?;
  let mut app = App::new(client, Session::new(), collection);

  match (email, password) {
    (Some(email), Some(password)) => app.sign_in_with(email, password).await,
    (Some(email), None) => app.login.email = email,
    _ => {}
  }
  app.sync_auth().await;

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key).await?
    {
      break;
    }

    app.sync_auth().await;
  }

  Ok(())
}
