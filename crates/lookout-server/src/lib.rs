//! HTTP server for the Lookout admin console.
//!
//! Serves the record API from `lookout-api` behind bearer-token sessions.
//! Sign-in checks the configured administrator credentials.

pub mod auth;
pub mod error;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use lookout_core::RecordStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{LocalIdentity, SessionRegistry};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LOOKOUT_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Collection holding visitor records.
  #[serde(default = "default_collection")]
  pub collection:         String,
  pub auth_email:         String,
  pub auth_password_hash: String,
}

fn default_collection() -> String { "Users".to_string() }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub identity: Arc<LocalIdentity>,
  pub sessions: Arc<SessionRegistry>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      config:   Arc::clone(&self.config),
      identity: Arc::clone(&self.identity),
      sessions: Arc::clone(&self.sessions),
    }
  }
}

impl<S> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let identity = LocalIdentity {
      email:         config.auth_email.clone(),
      password_hash: config.auth_password_hash.clone(),
    };
    Self {
      store:    Arc::new(store),
      config:   Arc::new(config),
      identity: Arc::new(identity),
      sessions: Arc::new(SessionRegistry::default()),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's axum [`Router`].
///
/// `/api/session` is open; every other `/api` route needs a live bearer
/// token.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + 'static,
{
  let session_routes = Router::new()
    .route(
      "/session",
      get(session::current)
        .post(session::sign_in::<S>)
        .delete(session::sign_out::<S>),
    )
    .with_state(state.clone());

  let record_routes =
    lookout_api::api_router(Arc::clone(&state.store), state.config.collection.as_str())
      .route_layer(middleware::from_fn_with_state(
        Arc::clone(&state.sessions),
        auth::require_session,
      ));

  Router::new()
    .nest("/api", session_routes.merge(record_routes))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
