//! Handler for `GET /stats`.

use axum::{Json, extract::State};
use lookout_core::{
  RecordStore,
  aggregate::{Summary, summarize},
};

use crate::{ApiState, error::ApiError};

/// `GET /stats`: dashboard counts over the whole collection.
pub async fn handler<S: RecordStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Summary>, ApiError> {
  let records = state
    .store
    .list_all(&state.collection)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summarize(&records)))
}
