//! Error types for `lookout-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("createdAt must be non-negative, got {0}")]
  NegativeTimestamp(i64),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
