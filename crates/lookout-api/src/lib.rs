//! JSON REST API for Lookout.
//!
//! Exposes an axum [`Router`] backed by any [`lookout_core::RecordStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lookout_api::api_router(store.clone(), "Users"))
//! ```

pub mod error;
pub mod records;
pub mod stats;
pub mod table;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use lookout_core::RecordStore;

pub use error::ApiError;

/// Shared handler state: the store and the collection every route reads.
pub struct ApiState<S> {
  pub store:      Arc<S>,
  pub collection: Arc<str>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), collection: Arc::clone(&self.collection) }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, collection: impl Into<Arc<str>>) -> Router<()>
where
  S: RecordStore + 'static,
{
  let state = ApiState { store, collection: collection.into() };
  Router::new()
    // Records
    .route("/records", get(records::list::<S>))
    .route("/records/table", get(table::handler::<S>))
    .route("/records/query", post(records::query::<S>))
    .route("/records/batch-delete", post(records::batch_delete::<S>))
    .route("/records/{id}", get(records::get_one::<S>))
    .route("/records/{id}/profile", get(records::profile::<S>))
    // Dashboard
    .route("/stats", get(stats::handler::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use lookout_core::{VisitorFields, record::{Location, Security}};
  use lookout_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const USERS: &str = "Users";

  fn visitor(visitor_id: &str, ip: &str, browser: &str, created_at: i64) -> VisitorFields {
    VisitorFields {
      visitor_id: visitor_id.into(),
      browser: browser.into(),
      location: Location { ip: ip.into(), country: "SA".into(), ..Default::default() },
      created_at,
      ..Default::default()
    }
  }

  async fn seeded() -> (Arc<SqliteStore>, Vec<Uuid>) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut ids = Vec::new();
    for (i, (v, ip, b)) in [
      ("charlie", "1.1.1.1", "Chrome"),
      ("alpha", "1.1.1.2", "Firefox"),
      ("bravo", "2.2.2.2", "Chrome"),
      ("alpha", "3.3.3.3", "Safari"),
    ]
    .into_iter()
    .enumerate()
    {
      let r = store.insert(USERS, visitor(v, ip, b, i as i64 * 1000)).await.unwrap();
      ids.push(r.id);
    }
    (Arc::new(store), ids)
  }

  async fn send(store: Arc<SqliteStore>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = api_router(store, USERS).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
  }

  fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap()
  }

  // ── Records ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_returns_every_record() {
    let (store, _) = seeded().await;
    let (status, body) = send(store, get_req("/records")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert_eq!(body[0]["visitorId"], "charlie");
    assert_eq!(body[0]["location"]["ip"], "1.1.1.1");
  }

  #[tokio::test]
  async fn get_one_missing_is_404() {
    let (store, _) = seeded().await;
    let (status, body) = send(store, get_req(&format!("/records/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
  }

  #[tokio::test]
  async fn query_matches_exactly() {
    let (store, _) = seeded().await;
    let (status, body) =
      send(store, post_json("/records/query", json!({ "field": "visitor_id", "value": "alpha" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn batch_delete_reports_count() {
    let (store, ids) = seeded().await;
    let (status, body) = send(
      store.clone(),
      post_json("/records/batch-delete", json!({ "ids": [ids[0], ids[2], Uuid::new_v4()] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 2 }));

    let left = store.list_all(USERS).await.unwrap();
    assert_eq!(left.len(), 2);
  }

  #[tokio::test]
  async fn profile_counts_visits_and_reports_no_data() {
    let (store, ids) = seeded().await;

    let (_, body) = send(store.clone(), get_req(&format!("/records/{}/profile", ids[1]))).await;
    assert_eq!(body["status"], "found");
    assert_eq!(body["visits"], 2);

    let (status, body) =
      send(store, get_req(&format!("/records/{}/profile", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "no_data" }));
  }

  // ── Table ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn table_sorts_filters_and_pages() {
    let (store, _) = seeded().await;

    let (_, body) = send(store.clone(), get_req("/records/table")).await;
    let ids: Vec<&str> = body["rows"]
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["visitorId"].as_str().unwrap())
      .collect();
    assert_eq!(ids, ["alpha", "alpha", "bravo", "charlie"]);
    assert_eq!(body["total"], 4);
    assert_eq!(body["last_page"], 0);

    let (_, body) =
      send(store.clone(), get_req("/records/table?sort=created_at&dir=desc&ip=1.1.1")).await;
    let ips: Vec<&str> = body["rows"]
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["location"]["ip"].as_str().unwrap())
      .collect();
    assert_eq!(ips, ["1.1.1.2", "1.1.1.1"]);
    assert_eq!(body["filtered_len"], 2);
  }

  #[tokio::test]
  async fn table_page_past_the_end_is_empty() {
    let (store, _) = seeded().await;
    let (status, body) = send(store, get_req("/records/table?page=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rows"].as_array().unwrap().is_empty());
    assert_eq!(body["page_index"], 3);
    assert_eq!(body["pad_rows"], 0);
    assert_eq!(body["last_page"], 0);
    assert_eq!(body["filtered_len"], 4);
  }

  #[tokio::test]
  async fn table_rejects_unknown_page_size() {
    let (store, _) = seeded().await;
    let (status, _) = send(store, get_req("/records/table?page_size=7")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Stats ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn stats_summarises_collection() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut vpn = visitor("a", "1.1.1.1", "Chrome", 0);
    vpn.security = Some(Security { vpn: true, ..Default::default() });
    store.insert(USERS, vpn).await.unwrap();
    store.insert(USERS, visitor("b", "2.2.2.2", "", 0)).await.unwrap();

    let (status, body) = send(Arc::new(store), get_req("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["vpn"], 1);
    assert_eq!(body["noVpn"], 1);
    assert_eq!(
      body["browsers"],
      json!([{ "label": "Chrome", "value": 1 }, { "label": "Unknown", "value": 1 }])
    );
  }
}
