//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("invalid email or password")]
  InvalidCredentials,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("password hash error: {0}")]
  PasswordHash(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Unauthorized | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"lookout\""),
      );
    }
    res
  }
}
