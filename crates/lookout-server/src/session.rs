//! Handlers for `/session`.
//!
//! | Method   | Path       | Notes |
//! |----------|------------|-------|
//! | `POST`   | `/session` | Body: `{"email":..,"password":..}`; returns a bearer token |
//! | `GET`    | `/session` | The signed-in principal |
//! | `DELETE` | `/session` | Revokes the presented token |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use lookout_core::{IdentityProvider, Principal};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::CurrentSession, error::Error};

#[derive(Deserialize)]
pub struct SignInBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
  pub token: String,
  pub email: String,
}

/// `POST /session`
pub async fn sign_in<S: Send + Sync + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignInBody>,
) -> Result<Json<SignInResponse>, Error> {
  if body.email.trim().is_empty() || body.password.is_empty() {
    return Err(Error::BadRequest("email and password are required".into()));
  }

  let principal = match state.identity.sign_in(&body.email, &body.password).await {
    Ok(p) => p,
    Err(e) => {
      tracing::warn!(email = %body.email, "sign-in rejected");
      return Err(e);
    }
  };

  tracing::info!(email = %principal.email, "signed in");
  let email = principal.email.clone();
  let token = state.sessions.issue(principal).await;
  Ok(Json(SignInResponse { token, email }))
}

/// `GET /session`
pub async fn current(session: CurrentSession) -> Json<Principal> { Json(session.principal) }

/// `DELETE /session`
pub async fn sign_out<S: Send + Sync + 'static>(
  State(state): State<AppState<S>>,
  session: CurrentSession,
) -> Result<StatusCode, Error> {
  state.sessions.revoke(&session.token).await;
  state.identity.sign_out().await?;
  tracing::info!(email = %session.principal.email, "signed out");
  Ok(StatusCode::NO_CONTENT)
}
