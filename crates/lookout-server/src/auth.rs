//! Password sign-in and bearer-token sessions.
//!
//! The server holds one administrator account from config. A successful
//! sign-in issues a random bearer token; only its SHA-256 digest is kept.

use std::{collections::HashMap, sync::Arc};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header::AUTHORIZATION, request::Parts},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lookout_core::{IdentityProvider, Principal};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::{AppState, error::Error};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct LocalIdentity {
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl LocalIdentity {
  fn verify(&self, email: &str, password: &str) -> Result<Principal, Error> {
    if !email.trim().eq_ignore_ascii_case(&self.email) {
      return Err(Error::InvalidCredentials);
    }

    let parsed_hash =
      PasswordHash::new(&self.password_hash).map_err(|e| Error::PasswordHash(e.to_string()))?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| Error::InvalidCredentials)?;

    Ok(Principal { email: self.email.clone() })
  }
}

impl IdentityProvider for LocalIdentity {
  type Error = Error;

  async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, Error> {
    self.verify(email, password)
  }

  // Tokens are revoked by the session registry; nothing to release here.
  async fn sign_out(&self) -> Result<(), Error> { Ok(()) }
}

/// Hash `password` into an argon2 PHC string for `auth_password_hash`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string(),
  )
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// Live bearer sessions keyed by token digest.
#[derive(Default)]
pub struct SessionRegistry {
  sessions: RwLock<HashMap<String, Principal>>,
}

impl SessionRegistry {
  /// Start a session for `principal` and return its bearer token.
  pub async fn issue(&self, principal: Principal) -> String {
    let token = generate_token();
    self.sessions.write().await.insert(hash_token(&token), principal);
    token
  }

  pub async fn resolve(&self, token: &str) -> Option<Principal> {
    self.sessions.read().await.get(&hash_token(token)).cloned()
  }

  /// End the session for `token`. Returns whether it was live.
  pub async fn revoke(&self, token: &str) -> bool {
    self.sessions.write().await.remove(&hash_token(token)).is_some()
  }

  pub async fn live_count(&self) -> usize { self.sessions.read().await.len() }
}

fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
  headers
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)
}

// ─── Extractor and middleware ────────────────────────────────────────────────

/// The caller's session: present in a handler means the bearer token is live.
pub struct CurrentSession {
  pub token:     String,
  pub principal: Principal,
}

impl<S> FromRequestParts<AppState<S>> for CurrentSession
where
  S: Send + Sync + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?.to_owned();
    let principal = state.sessions.resolve(&token).await.ok_or(Error::Unauthorized)?;
    Ok(CurrentSession { token, principal })
  }
}

/// Reject requests without a live bearer token. The principal is placed in
/// the request extensions for downstream handlers.
pub async fn require_session(
  State(sessions): State<Arc<SessionRegistry>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let token = bearer_token(req.headers())?;
  let principal = sessions.resolve(token).await.ok_or_else(|| {
    tracing::debug!(path = %req.uri().path(), "rejected request without live session");
    Error::Unauthorized
  })?;
  req.extensions_mut().insert(principal);
  Ok(next.run(req).await)
}
