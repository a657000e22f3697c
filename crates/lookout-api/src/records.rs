//! Handlers for `/records` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | Every record, store order |
//! | `POST` | `/records/query` | Body: `{"field":"ip","value":"1.1.1.1"}` |
//! | `POST` | `/records/batch-delete` | Body: `{"ids":[...]}` |
//! | `GET`  | `/records/{id}` | 404 if not found |
//! | `GET`  | `/records/{id}/profile` | `{"status":"no_data"}` if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use lookout_core::{QueryField, RecordStore, VisitorRecord, profile::{self, Profile}};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /records`
pub async fn list<S: RecordStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<VisitorRecord>>, ApiError> {
  let records = state
    .store
    .list_all(&state.collection)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Query ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryBody {
  pub field: QueryField,
  pub value: String,
}

/// `POST /records/query`
pub async fn query<S: RecordStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<QueryBody>,
) -> Result<Json<Vec<VisitorRecord>>, ApiError> {
  let records = state
    .store
    .query_by_equality(&state.collection, body.field, &body.value)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Batch delete ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDeleteBody {
  pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDeleteResponse {
  pub deleted: usize,
}

/// `POST /records/batch-delete`
pub async fn batch_delete<S: RecordStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<BatchDeleteBody>,
) -> Result<Json<BatchDeleteResponse>, ApiError> {
  if body.ids.is_empty() {
    return Ok(Json(BatchDeleteResponse { deleted: 0 }));
  }
  let deleted = state
    .store
    .batch_delete(&state.collection, &body.ids)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(requested = body.ids.len(), deleted, "batch delete");
  Ok(Json(BatchDeleteResponse { deleted }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /records/{id}`
pub async fn get_one<S: RecordStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<VisitorRecord>, ApiError> {
  let record = state
    .store
    .get_by_id(&state.collection, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("record {id} not found")))?;
  Ok(Json(record))
}

/// `GET /records/{id}/profile`
pub async fn profile<S: RecordStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
  let profile = profile::load(&*state.store, &state.collection, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}
