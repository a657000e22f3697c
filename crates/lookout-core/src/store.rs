//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`lookout-store-sqlite`) and
//! by the console's HTTP client, which talks to a backend over the API.
//! Higher layers (`lookout-api`, `lookout-cli`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::VisitorRecord;

// ─── Query type ──────────────────────────────────────────────────────────────

/// Fields a store can match by equality.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueryField {
  VisitorId,
  Ip,
  Browser,
  Country,
  City,
}

impl QueryField {
  /// Path of the field inside a stored document.
  pub fn json_path(self) -> &'static str {
    match self {
      Self::VisitorId => "$.visitorId",
      Self::Ip => "$.location.ip",
      Self::Browser => "$.browser",
      Self::Country => "$.location.country",
      Self::City => "$.location.city",
    }
  }

  /// The field's value on `record`.
  pub fn value_of(self, record: &VisitorRecord) -> &str {
    match self {
      Self::VisitorId => record.visitor_id(),
      Self::Ip => record.ip(),
      Self::Browser => record.browser(),
      Self::Country => record.country(),
      Self::City => record.city(),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a document store holding visitor records.
///
/// Records are grouped into named collections. The console never creates
/// records; the only write is [`RecordStore::batch_delete`], which is atomic.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every record in `collection`, in store order.
  fn list_all<'a>(
    &'a self,
    collection: &'a str,
  ) -> impl Future<Output = Result<Vec<VisitorRecord>, Self::Error>> + Send + 'a;

  /// A single record. Returns `None` if not found.
  fn get_by_id<'a>(
    &'a self,
    collection: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<VisitorRecord>, Self::Error>> + Send + 'a;

  /// All records whose `field` equals `value` exactly.
  fn query_by_equality<'a>(
    &'a self,
    collection: &'a str,
    field: QueryField,
    value: &'a str,
  ) -> impl Future<Output = Result<Vec<VisitorRecord>, Self::Error>> + Send + 'a;

  /// Delete every listed record in one all-or-nothing operation and return
  /// how many existed. Ids that are not present are skipped.
  fn batch_delete<'a>(
    &'a self,
    collection: &'a str,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;
}
