//! Handler for `GET /records/table`.
//!
//! Runs the console's filter, sort and paginate pipeline server-side so thin
//! clients can render one page without holding the whole snapshot.

use axum::{
  Json,
  extract::{Query, State},
};
use lookout_core::{
  RecordStore, VisitorRecord,
  table::{FilterField, PAGE_SIZE_OPTIONS, Predicate, SortDirection, SortKey, TableState},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct TableParams {
  pub sort:           Option<SortKey>,
  pub dir:            Option<SortDirection>,
  /// Substring filters; empty or absent means no restriction.
  pub ip:             Option<String>,
  pub visitor_id:     Option<String>,
  pub city:           Option<String>,
  pub country:        Option<String>,
  pub browser:        Option<String>,
  /// Inclusive `createdAt` bounds in Unix seconds.
  pub created_after:  Option<i64>,
  pub created_before: Option<i64>,
  pub page:           Option<usize>,
  pub page_size:      Option<usize>,
}

impl TableParams {
  fn predicate(&self) -> Predicate {
    let mut predicate = Predicate::ip_and_visitor(
      self.ip.as_deref().unwrap_or_default(),
      self.visitor_id.as_deref().unwrap_or_default(),
    );
    for (field, query) in [
      (FilterField::City, &self.city),
      (FilterField::Country, &self.country),
      (FilterField::Browser, &self.browser),
    ] {
      if let Some(q) = query {
        predicate.set(field, q.as_str());
      }
    }
    predicate.created_after = self.created_after;
    predicate.created_before = self.created_before;
    predicate
  }
}

/// One page of the record table.
#[derive(Debug, Serialize, Deserialize)]
pub struct TablePage {
  pub rows:         Vec<VisitorRecord>,
  pub total:        usize,
  pub filtered_len: usize,
  pub page_index:   usize,
  pub page_size:    usize,
  pub pad_rows:     usize,
  pub last_page:    usize,
}

/// `GET /records/table[?sort=..][&dir=..][&ip=..][&page=..][&page_size=..]`
///
/// A `page` past the last page yields no rows rather than the last page.
pub async fn handler<S: RecordStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<TableParams>,
) -> Result<Json<TablePage>, ApiError> {
  if let Some(size) = params.page_size.filter(|s| !PAGE_SIZE_OPTIONS.contains(s)) {
    return Err(ApiError::BadRequest(format!(
      "page_size must be one of {PAGE_SIZE_OPTIONS:?}, got {size}"
    )));
  }

  let records = state
    .store
    .list_all(&state.collection)
    .await
    .map_err(ApiError::store)?;
  let total = records.len();

  let mut table = TableState::new(records);
  table.set_sort(params.sort.unwrap_or_default(), params.dir.unwrap_or_default());
  table.set_predicate(params.predicate());
  if let Some(size) = params.page_size {
    table.set_page_size(size);
  }
  let page = params.page.unwrap_or(0);
  table.set_page(page);

  let view = table.view();
  let in_range = page <= view.last_page;
  Ok(Json(TablePage {
    rows: if in_range { view.rows.into_iter().cloned().collect() } else { Vec::new() },
    total,
    filtered_len: view.filtered_len,
    page_index: page,
    page_size: view.page_size,
    pad_rows: if in_range { view.pad_rows } else { 0 },
    last_page: view.last_page,
  }))
}
