//! Async HTTP client wrapping the Lookout JSON API.
//!
//! [`ApiClient`] is both the console's [`RecordStore`] and its
//! [`IdentityProvider`]: sign-in stores the bearer token that every record
//! call then presents.

use std::time::Duration;

use anyhow::Context as _;
use lookout_core::{IdentityProvider, Principal, QueryField, RecordStore, VisitorRecord};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("not signed in")]
  NotSignedIn,

  #[error("{status}: {message}")]
  Status { status: StatusCode, message: String },
}

impl ClientError {
  /// The server no longer accepts our token (or never had one).
  pub fn is_unauthorized(&self) -> bool {
    match self {
      Self::NotSignedIn => true,
      Self::Status { status, .. } => *status == StatusCode::UNAUTHORIZED,
      Self::Http(_) => false,
    }
  }
}

/// Connection settings for the Lookout API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the Lookout JSON REST API.
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  token:  RwLock<Option<String>>,
}

#[derive(Serialize)]
struct SignInBody<'a> {
  email:    &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct SignInResponse {
  token: String,
  email: String,
}

#[derive(Serialize)]
struct QueryBody<'a> {
  field: QueryField,
  value: &'a str,
}

#[derive(Serialize)]
struct BatchDeleteBody<'a> {
  ids: &'a [Uuid],
}

#[derive(Deserialize)]
struct BatchDeleteResponse {
  deleted: usize,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config, token: RwLock::new(None) })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  async fn authed(&self, req: RequestBuilder) -> Result<RequestBuilder, ClientError> {
    let token = self.token.read().await.clone().ok_or(ClientError::NotSignedIn)?;
    Ok(req.bearer_auth(token))
  }

  async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = Self::check(resp).await?;
    Ok(resp.json().await?)
  }

  /// Turn a non-success response into [`ClientError::Status`], using the
  /// server's `{"error": ..}` message when present.
  async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    Err(ClientError::Status { status, message })
  }
}

// ─── IdentityProvider ─────────────────────────────────────────────────────────

impl IdentityProvider for ApiClient {
  type Error = ClientError;

  /// `POST /api/session`
  async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, ClientError> {
    let resp = self
      .client
      .post(self.url("/session"))
      .json(&SignInBody { email, password })
      .send()
      .await?;
    let body: SignInResponse = Self::json(resp).await?;
    *self.token.write().await = Some(body.token);
    Ok(Principal { email: body.email })
  }

  /// `DELETE /api/session`. The token is dropped locally even if the server
  /// call fails.
  async fn sign_out(&self) -> Result<(), ClientError> {
    let Some(token) = self.token.write().await.take() else {
      return Ok(());
    };
    let resp = self.client.delete(self.url("/session")).bearer_auth(token).send().await?;
    Self::check(resp).await?;
    Ok(())
  }
}

// ─── RecordStore ──────────────────────────────────────────────────────────────

// The server serves its one configured collection, so `collection` only
// matters to in-process stores and is not sent over the wire.
impl RecordStore for ApiClient {
  type Error = ClientError;

  /// `GET /api/records`
  async fn list_all(&self, _collection: &str) -> Result<Vec<VisitorRecord>, ClientError> {
    let resp = self.authed(self.client.get(self.url("/records"))).await?.send().await?;
    Self::json(resp).await
  }

  /// `GET /api/records/{id}`; 404 maps to `None`.
  async fn get_by_id(
    &self,
    _collection: &str,
    id: Uuid,
  ) -> Result<Option<VisitorRecord>, ClientError> {
    let resp = self
      .authed(self.client.get(self.url(&format!("/records/{id}"))))
      .await?
      .send()
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Self::json(resp).await.map(Some)
  }

  /// `POST /api/records/query`
  async fn query_by_equality(
    &self,
    _collection: &str,
    field: QueryField,
    value: &str,
  ) -> Result<Vec<VisitorRecord>, ClientError> {
    let resp = self
      .authed(self.client.post(self.url("/records/query")))
      .await?
      .json(&QueryBody { field, value })
      .send()
      .await?;
    Self::json(resp).await
  }

  /// `POST /api/records/batch-delete`
  async fn batch_delete(&self, _collection: &str, ids: &[Uuid]) -> Result<usize, ClientError> {
    let resp = self
      .authed(self.client.post(self.url("/records/batch-delete")))
      .await?
      .json(&BatchDeleteBody { ids })
      .send()
      .await?;
    let body: BatchDeleteResponse = Self::json(resp).await?;
    Ok(body.deleted)
  }
}
