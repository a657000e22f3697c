//! Table state for the record list: filter, sort, paginate and select over an
//! in-memory snapshot.
//!
//! The visible window is derived by one pure pipeline:
//!
//! ```text
//! snapshot --filter--> filtered --sort--> ordered --paginate--> window
//! ```
//!
//! Given the same snapshot, sort, predicate, page index and page size the
//! window is always identical.

use std::{cmp::Ordering, collections::HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{record::VisitorRecord, store::RecordStore};

/// Page sizes offered by the console.
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 25];

pub const DEFAULT_PAGE_SIZE: usize = 5;

// ─── Sort ────────────────────────────────────────────────────────────────────

/// Columns the table can be sorted by.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
  strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
  #[default]
  #[strum(to_string = "Visitor ID")]
  VisitorId,
  #[strum(to_string = "IP Address")]
  Ip,
  #[strum(to_string = "City")]
  City,
  #[strum(to_string = "Country")]
  Country,
  #[strum(to_string = "Browser")]
  Browser,
  #[strum(to_string = "Last Visit")]
  CreatedAt,
  #[strum(to_string = "Confidence")]
  Confidence,
}

impl SortKey {
  /// Ascending comparison of `a` and `b` on this column.
  pub fn compare(self, a: &VisitorRecord, b: &VisitorRecord) -> Ordering {
    match self {
      Self::VisitorId => a.visitor_id().cmp(b.visitor_id()),
      Self::Ip => a.ip().cmp(b.ip()),
      Self::City => a.city().cmp(b.city()),
      Self::Country => a.country().cmp(b.country()),
      Self::Browser => a.browser().cmp(b.browser()),
      Self::CreatedAt => a.created_at().cmp(&b.created_at()),
      // Records without a score sort before any scored record.
      Self::Confidence => {
        match (a.fields.confidence_score, b.fields.confidence_score) {
          (Some(x), Some(y)) => x.total_cmp(&y),
          (None, Some(_)) => Ordering::Less,
          (Some(_), None) => Ordering::Greater,
          (None, None) => Ordering::Equal,
        }
      }
    }
  }
}

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  #[default]
  #[serde(alias = "ascending")]
  Asc,
  #[serde(alias = "descending")]
  Desc,
}

impl SortDirection {
  pub fn flipped(self) -> Self {
    match self {
      Self::Asc => Self::Desc,
      Self::Desc => Self::Asc,
    }
  }
}

/// Stable sort of `records` by `key`.
///
/// Descending negates the comparator; it does not reverse the output. Equal
/// keys keep their input order in both directions.
pub fn sort<'r>(
  records: &[&'r VisitorRecord],
  key: SortKey,
  direction: SortDirection,
) -> Vec<&'r VisitorRecord> {
  let mut ordered = records.to_vec();
  // `sort_by` is stable: ties fall back to input position.
  ordered.sort_by(|a, b| {
    let ord = key.compare(a, b);
    match direction {
      SortDirection::Asc => ord,
      SortDirection::Desc => ord.reverse(),
    }
  });
  ordered
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Text fields a filter clause can match against.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
  #[strum(to_string = "IP Address")]
  Ip,
  #[strum(to_string = "Visitor ID")]
  VisitorId,
  #[strum(to_string = "City")]
  City,
  #[strum(to_string = "Country")]
  Country,
  #[strum(to_string = "Browser")]
  Browser,
}

impl FilterField {
  pub fn value_of(self, record: &VisitorRecord) -> &str {
    match self {
      Self::Ip => record.ip(),
      Self::VisitorId => record.visitor_id(),
      Self::City => record.city(),
      Self::Country => record.country(),
      Self::Browser => record.browser(),
    }
  }
}

/// A conjunction of case-sensitive substring clauses plus an optional
/// inclusive creation-time range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
  clauses:            Vec<(FilterField, String)>,
  pub created_after:  Option<i64>,
  pub created_before: Option<i64>,
}

impl Predicate {
  /// The console's stock predicate: IP and visitor id, both empty.
  pub fn ip_and_visitor(ip: &str, visitor_id: &str) -> Self {
    Self::default()
      .with(FilterField::Ip, ip)
      .with(FilterField::VisitorId, visitor_id)
  }

  /// Builder form of [`Predicate::set`].
  pub fn with(mut self, field: FilterField, query: impl Into<String>) -> Self {
    self.set(field, query);
    self
  }

  /// Set the query for `field`, replacing any earlier clause on it.
  pub fn set(&mut self, field: FilterField, query: impl Into<String>) {
    let query = query.into();
    match self.clauses.iter_mut().find(|(f, _)| *f == field) {
      Some((_, q)) => *q = query,
      None => self.clauses.push((field, query)),
    }
  }

  /// The query string for `field`, empty if no clause is set.
  pub fn query(&self, field: FilterField) -> &str {
    self
      .clauses
      .iter()
      .find(|(f, _)| *f == field)
      .map(|(_, q)| q.as_str())
      .unwrap_or_default()
  }

  pub fn clauses(&self) -> impl Iterator<Item = (FilterField, &str)> {
    self.clauses.iter().map(|(f, q)| (*f, q.as_str()))
  }

  /// True when no clause restricts anything.
  pub fn is_empty(&self) -> bool {
    self.clauses.iter().all(|(_, q)| q.is_empty())
      && self.created_after.is_none()
      && self.created_before.is_none()
  }

  pub fn matches(&self, record: &VisitorRecord) -> bool {
    let text = self
      .clauses
      .iter()
      .all(|(field, q)| q.is_empty() || field.value_of(record).contains(q.as_str()));
    let after = self.created_after.is_none_or(|t| record.created_at() >= t);
    let before = self.created_before.is_none_or(|t| record.created_at() <= t);
    text && after && before
  }
}

/// The records matching `predicate`, in input order.
pub fn filter<'r>(
  records: impl IntoIterator<Item = &'r VisitorRecord>,
  predicate: &Predicate,
) -> Vec<&'r VisitorRecord> {
  records.into_iter().filter(|r| predicate.matches(r)).collect()
}

// ─── Paginate ────────────────────────────────────────────────────────────────

/// The slice `[page_index * page_size, page_index * page_size + page_size)`,
/// clipped to `records`.
pub fn paginate<T>(records: &[T], page_index: usize, page_size: usize) -> &[T] {
  let start = page_index.saturating_mul(page_size).min(records.len());
  let end = start.saturating_add(page_size).min(records.len());
  &records[start..end]
}

/// Blank rows that keep the last page as tall as a full one. Always zero on
/// the first page.
pub fn pad_rows(filtered_len: usize, page_index: usize, page_size: usize) -> usize {
  if page_index == 0 {
    return 0;
  }
  (page_index + 1)
    .saturating_mul(page_size)
    .saturating_sub(filtered_len)
}

/// Index of the last page for `count` rows; zero when there are none.
pub fn last_page(count: usize, page_size: usize) -> usize {
  if page_size == 0 {
    return 0;
  }
  count.div_ceil(page_size).saturating_sub(1)
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// State of the "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
  Unchecked,
  Indeterminate,
  Checked,
}

// ─── TableState ──────────────────────────────────────────────────────────────

/// One rendered page of the table.
#[derive(Debug, Clone, Serialize)]
pub struct TableView<'r> {
  pub rows:         Vec<&'r VisitorRecord>,
  pub filtered_len: usize,
  pub page_index:   usize,
  pub page_size:    usize,
  pub pad_rows:     usize,
  pub last_page:    usize,
}

/// Everything the record list needs to render: the snapshot and the sort,
/// filter, page and selection applied to it.
#[derive(Debug, Clone)]
pub struct TableState {
  snapshot:       Vec<VisitorRecord>,
  sort_key:       SortKey,
  sort_direction: SortDirection,
  predicate:      Predicate,
  selected:       HashSet<Uuid>,
  page_index:     usize,
  page_size:      usize,
}

impl Default for TableState {
  fn default() -> Self {
    Self {
      snapshot:       Vec::new(),
      sort_key:       SortKey::default(),
      sort_direction: SortDirection::default(),
      predicate:      Predicate::ip_and_visitor("", ""),
      selected:       HashSet::new(),
      page_index:     0,
      page_size:      DEFAULT_PAGE_SIZE,
    }
  }
}

impl TableState {
  pub fn new(snapshot: Vec<VisitorRecord>) -> Self {
    Self { snapshot, ..Self::default() }
  }

  // ── Snapshot ──────────────────────────────────────────────────────────────

  pub fn snapshot(&self) -> &[VisitorRecord] { &self.snapshot }

  /// Replace the snapshot after a fetch. Selected ids no longer present are
  /// dropped so the selection stays a subset of known records.
  pub fn replace_snapshot(&mut self, snapshot: Vec<VisitorRecord>) {
    let known: HashSet<Uuid> = snapshot.iter().map(|r| r.id).collect();
    self.selected.retain(|id| known.contains(id));
    self.snapshot = snapshot;
    self.page_index = self.page_index.min(last_page(self.filtered_len(), self.page_size));
  }

  /// Fetch a fresh snapshot of `collection` from `store`.
  pub async fn refresh<S: RecordStore>(
    &mut self,
    store: &S,
    collection: &str,
  ) -> Result<(), S::Error> {
    let records = store.list_all(collection).await?;
    self.replace_snapshot(records);
    Ok(())
  }

  // ── Sort ──────────────────────────────────────────────────────────────────

  pub fn sort_key(&self) -> SortKey { self.sort_key }

  pub fn sort_direction(&self) -> SortDirection { self.sort_direction }

  pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
    self.sort_key = key;
    self.sort_direction = direction;
  }

  /// Header click: the active column flips from ascending to descending;
  /// anything else sorts ascending by `key`.
  pub fn request_sort(&mut self, key: SortKey) {
    let flip = self.sort_key == key && self.sort_direction == SortDirection::Asc;
    self.sort_direction = if flip { SortDirection::Desc } else { SortDirection::Asc };
    self.sort_key = key;
  }

  // ── Filter ────────────────────────────────────────────────────────────────

  pub fn predicate(&self) -> &Predicate { &self.predicate }

  /// Replace the predicate and return to the first page.
  pub fn set_predicate(&mut self, predicate: Predicate) {
    self.predicate = predicate;
    self.page_index = 0;
  }

  /// Set one clause and return to the first page.
  pub fn set_filter(&mut self, field: FilterField, query: impl Into<String>) {
    self.predicate.set(field, query);
    self.page_index = 0;
  }

  pub fn filtered(&self) -> Vec<&VisitorRecord> {
    filter(&self.snapshot, &self.predicate)
  }

  pub fn filtered_len(&self) -> usize {
    self.snapshot.iter().filter(|r| self.predicate.matches(r)).count()
  }

  /// Filtered records in display order, all pages.
  pub fn ordered(&self) -> Vec<&VisitorRecord> {
    sort(&self.filtered(), self.sort_key, self.sort_direction)
  }

  // ── Paginate ──────────────────────────────────────────────────────────────

  pub fn page_index(&self) -> usize { self.page_index }

  pub fn page_size(&self) -> usize { self.page_size }

  /// Change the page size and return to the first page. Zero is treated as
  /// one.
  pub fn set_page_size(&mut self, page_size: usize) {
    self.page_size = page_size.max(1);
    self.page_index = 0;
  }

  pub fn set_page(&mut self, page_index: usize) {
    self.page_index = page_index.min(self.last_page());
  }

  pub fn last_page(&self) -> usize { last_page(self.filtered_len(), self.page_size) }

  pub fn first_page(&mut self) { self.page_index = 0; }

  pub fn prev_page(&mut self) { self.page_index = self.page_index.saturating_sub(1); }

  pub fn next_page(&mut self) {
    if self.page_index < self.last_page() {
      self.page_index += 1;
    }
  }

  pub fn to_last_page(&mut self) { self.page_index = self.last_page(); }

  /// The visible window.
  pub fn view(&self) -> TableView<'_> {
    let ordered = self.ordered();
    let filtered_len = ordered.len();
    TableView {
      rows: paginate(&ordered, self.page_index, self.page_size).to_vec(),
      filtered_len,
      page_index: self.page_index,
      page_size: self.page_size,
      pad_rows: pad_rows(filtered_len, self.page_index, self.page_size),
      last_page: last_page(filtered_len, self.page_size),
    }
  }

  // ── Selection ─────────────────────────────────────────────────────────────

  pub fn selected(&self) -> &HashSet<Uuid> { &self.selected }

  pub fn is_selected(&self, id: Uuid) -> bool { self.selected.contains(&id) }

  /// Add `id` to the selection, or remove it if already selected. Ids not in
  /// the snapshot are ignored.
  pub fn toggle(&mut self, id: Uuid) {
    if !self.selected.remove(&id) && self.snapshot.iter().any(|r| r.id == id) {
      self.selected.insert(id);
    }
  }

  /// Select exactly the given ids that are present in the snapshot.
  pub fn select_all(&mut self, ids: impl IntoIterator<Item = Uuid>) {
    let known: HashSet<Uuid> = self.snapshot.iter().map(|r| r.id).collect();
    self.selected = ids.into_iter().filter(|id| known.contains(id)).collect();
  }

  /// Header checkbox: select every record in the snapshot, or clear.
  pub fn set_all_selected(&mut self, checked: bool) {
    if checked {
      self.selected = self.snapshot.iter().map(|r| r.id).collect();
    } else {
      self.selected.clear();
    }
  }

  pub fn check_state(&self) -> CheckState {
    let n = self.selected.len();
    if n == 0 {
      CheckState::Unchecked
    } else if n == self.snapshot.len() {
      CheckState::Checked
    } else {
      CheckState::Indeterminate
    }
  }

  // ── Delete ────────────────────────────────────────────────────────────────

  /// Delete the current selection with one batch request, then clear it and
  /// re-fetch. If the batch delete fails the selection and snapshot are left
  /// untouched.
  ///
  /// Once the store has committed, the call succeeds even if the re-fetch
  /// fails: the deleted ids are then dropped from the local snapshot and the
  /// reload error is carried in [`Deleted::reload`]. An empty selection is a
  /// no-op and does not hit the store.
  pub async fn delete_selected<S: RecordStore>(
    &mut self,
    store: &S,
    collection: &str,
  ) -> Result<Deleted<S::Error>, S::Error> {
    if self.selected.is_empty() {
      return Ok(Deleted { count: 0, reload: None });
    }
    let mut ids: Vec<Uuid> = self.selected.iter().copied().collect();
    ids.sort_unstable();

    let count = store.batch_delete(collection, &ids).await?;
    tracing::info!(requested = ids.len(), deleted = count, "batch delete committed");

    self.selected.clear();
    let reload = match self.refresh(store, collection).await {
      Ok(()) => None,
      Err(e) => {
        tracing::warn!(error = %e, "re-fetch after delete failed");
        let remaining =
          self.snapshot.iter().filter(|r| ids.binary_search(&r.id).is_err()).cloned().collect();
        self.replace_snapshot(remaining);
        Some(e)
      }
    };
    Ok(Deleted { count, reload })
  }
}

/// Result of a committed [`TableState::delete_selected`].
#[derive(Debug)]
pub struct Deleted<E> {
  /// Records the store removed.
  pub count:  usize,
  /// Set when the follow-up re-fetch failed; the snapshot was pruned locally.
  pub reload: Option<E>,
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use crate::record::{Location, VisitorFields};

  use super::*;

  fn rec(n: u128, visitor_id: &str, ip: &str) -> VisitorRecord {
    VisitorRecord::new(Uuid::from_u128(n), VisitorFields {
      visitor_id: visitor_id.into(),
      location: Location { ip: ip.into(), ..Default::default() },
      created_at: n as i64,
      ..Default::default()
    })
  }

  fn seven() -> Vec<VisitorRecord> {
    (1..=7).map(|n| rec(n, &format!("v{n}"), "10.0.0.1")).collect()
  }

  fn ids(rows: &[&VisitorRecord]) -> Vec<u128> {
    rows.iter().map(|r| r.id.as_u128()).collect()
  }

  // ── Sort ──────────────────────────────────────────────────────────────────

  #[test]
  fn sort_is_stable_on_ties() {
    let records = vec![rec(1, "b", ""), rec(2, "a", ""), rec(3, "a", "")];
    let refs: Vec<&VisitorRecord> = records.iter().collect();

    let asc = sort(&refs, SortKey::VisitorId, SortDirection::Asc);
    assert_eq!(ids(&asc), [2, 3, 1]);

    // Ties keep input order under descending too.
    let desc = sort(&refs, SortKey::VisitorId, SortDirection::Desc);
    assert_eq!(ids(&desc), [1, 2, 3]);
  }

  #[test]
  fn descending_is_exact_reverse_without_ties() {
    let records = vec![rec(1, "c", ""), rec(2, "a", ""), rec(3, "b", "")];
    let refs: Vec<&VisitorRecord> = records.iter().collect();

    let asc = sort(&refs, SortKey::VisitorId, SortDirection::Asc);
    let mut desc = sort(&refs, SortKey::VisitorId, SortDirection::Desc);
    desc.reverse();
    assert_eq!(ids(&asc), ids(&desc));
  }

  #[test]
  fn numeric_keys_compare_numerically() {
    let mut a = rec(1, "x", "");
    a.fields.created_at = 9;
    let mut b = rec(2, "x", "");
    b.fields.created_at = 10;
    let records = [a, b];
    let refs: Vec<&VisitorRecord> = records.iter().collect();

    let asc = sort(&refs, SortKey::CreatedAt, SortDirection::Asc);
    assert_eq!(ids(&asc), [1, 2]);
  }

  #[test]
  fn missing_confidence_sorts_first() {
    let mut a = rec(1, "x", "");
    a.fields.confidence_score = Some(0.9);
    let b = rec(2, "x", "");
    let records = [a, b];
    let refs: Vec<&VisitorRecord> = records.iter().collect();

    let asc = sort(&refs, SortKey::Confidence, SortDirection::Asc);
    assert_eq!(ids(&asc), [2, 1]);
  }

  #[test]
  fn request_sort_toggles_active_column() {
    let mut table = TableState::default();
    assert_eq!(table.sort_key(), SortKey::VisitorId);
    assert_eq!(table.sort_direction(), SortDirection::Asc);

    table.request_sort(SortKey::VisitorId);
    assert_eq!(table.sort_direction(), SortDirection::Desc);

    table.request_sort(SortKey::VisitorId);
    assert_eq!(table.sort_direction(), SortDirection::Asc);

    table.request_sort(SortKey::VisitorId);
    table.request_sort(SortKey::Browser);
    assert_eq!(table.sort_key(), SortKey::Browser);
    assert_eq!(table.sort_direction(), SortDirection::Asc);
  }

  // ── Filter ────────────────────────────────────────────────────────────────

  #[test]
  fn empty_predicate_returns_full_snapshot() {
    let records = seven();
    let out = filter(&records, &Predicate::ip_and_visitor("", ""));
    assert_eq!(out.len(), 7);
    assert!(Predicate::ip_and_visitor("", "").is_empty());
  }

  #[test]
  fn ip_substring_filter() {
    let records = vec![rec(1, "a", "38.132.118.72"), rec(2, "b", "20.178.152.1")];
    let out = filter(&records, &Predicate::ip_and_visitor("38.132", ""));
    assert_eq!(ids(&out), [1]);
  }

  #[test]
  fn clauses_are_conjunctive_and_case_sensitive() {
    let records = vec![
      rec(1, "abc", "1.1.1.1"),
      rec(2, "abd", "2.2.2.2"),
      rec(3, "ABC", "1.1.1.1"),
    ];
    let pred = Predicate::ip_and_visitor("1.1", "ab");
    assert_eq!(ids(&filter(&records, &pred)), [1]);
  }

  #[test]
  fn filtering_preserves_order_and_is_repeatable() {
    let records = vec![rec(3, "x1", ""), rec(1, "y", ""), rec(2, "x2", "")];
    let pred = Predicate::default().with(FilterField::VisitorId, "x");
    let first = filter(&records, &pred);
    let second = filter(&records, &pred);
    assert_eq!(ids(&first), [3, 2]);
    assert_eq!(ids(&first), ids(&second));
  }

  #[test]
  fn created_range_is_inclusive() {
    let records = seven();
    let pred = Predicate {
      created_after: Some(3),
      created_before: Some(5),
      ..Predicate::default()
    };
    assert_eq!(ids(&filter(&records, &pred)), [3, 4, 5]);
  }

  #[test]
  fn set_replaces_existing_clause() {
    let mut pred = Predicate::ip_and_visitor("1", "");
    pred.set(FilterField::Ip, "2");
    assert_eq!(pred.query(FilterField::Ip), "2");
    assert_eq!(pred.clauses().count(), 2);
  }

  // ── Paginate ──────────────────────────────────────────────────────────────

  #[test]
  fn paginate_length_law() {
    let records: Vec<u32> = (0..23).collect();
    for size in 1..8 {
      for page in 0..6 {
        let expected = size.min(records.len().saturating_sub(page * size));
        assert_eq!(paginate(&records, page, size).len(), expected);
      }
    }
  }

  #[test]
  fn seven_records_five_per_page() {
    let mut table = TableState::new(seven());

    let page0 = table.view();
    assert_eq!(ids(&page0.rows), [1, 2, 3, 4, 5]);
    assert_eq!(page0.pad_rows, 0);

    table.next_page();
    let page1 = table.view();
    assert_eq!(ids(&page1.rows), [6, 7]);
    assert_eq!(page1.pad_rows, 3);
    assert_eq!(page1.last_page, 1);
  }

  #[test]
  fn changing_page_size_resets_page_index() {
    let mut table = TableState::new(seven());
    table.next_page();
    assert_eq!(table.page_index(), 1);

    table.set_page_size(10);
    assert_eq!(table.page_index(), 0);
  }

  #[test]
  fn page_navigation_is_clamped() {
    let mut table = TableState::new(seven());
    table.prev_page();
    assert_eq!(table.page_index(), 0);
    table.to_last_page();
    assert_eq!(table.page_index(), 1);
    table.next_page();
    assert_eq!(table.page_index(), 1);
    table.set_page(99);
    assert_eq!(table.page_index(), 1);
    assert_eq!(last_page(0, 5), 0);
  }

  #[test]
  fn view_is_deterministic() {
    let mut table = TableState::new(seven());
    table.set_sort(SortKey::CreatedAt, SortDirection::Desc);
    table.set_filter(FilterField::Ip, "10.");
    let a = ids(&table.view().rows);
    let b = ids(&table.view().rows);
    assert_eq!(a, b);
    assert_eq!(a, [7, 6, 5, 4, 3]);
  }

  // ── Selection ─────────────────────────────────────────────────────────────

  #[test]
  fn selection_stays_within_snapshot() {
    let mut table = TableState::new(seven());
    table.toggle(Uuid::from_u128(99));
    assert!(table.selected().is_empty());

    table.select_all([Uuid::from_u128(1), Uuid::from_u128(99)]);
    assert_eq!(table.selected().len(), 1);

    table.toggle(Uuid::from_u128(1));
    assert!(!table.is_selected(Uuid::from_u128(1)));
  }

  #[test]
  fn select_all_on_empty_snapshot_is_empty() {
    let mut table = TableState::default();
    table.set_all_selected(true);
    assert!(table.selected().is_empty());
    assert_eq!(table.check_state(), CheckState::Unchecked);
  }

  #[test]
  fn check_state_tracks_selection() {
    let mut table = TableState::new(seven());
    table.toggle(Uuid::from_u128(2));
    assert_eq!(table.check_state(), CheckState::Indeterminate);
    table.set_all_selected(true);
    assert_eq!(table.check_state(), CheckState::Checked);
    table.set_all_selected(false);
    assert_eq!(table.check_state(), CheckState::Unchecked);
  }

  #[test]
  fn refresh_prunes_stale_selection() {
    let mut table = TableState::new(seven());
    table.set_all_selected(true);
    table.replace_snapshot(seven().into_iter().take(3).collect());
    assert_eq!(table.selected().len(), 3);
  }

  // ── Delete ────────────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("store unavailable")]
  struct Unavailable;

  /// Vec-backed store recording every batch delete it receives.
  #[derive(Default)]
  struct MemStore {
    records:   Mutex<Vec<VisitorRecord>>,
    batches:   Mutex<Vec<Vec<Uuid>>>,
    fail:      bool,
    /// `list_all` fails while `batch_delete` still succeeds.
    fail_list: bool,
  }

  impl RecordStore for MemStore {
    type Error = Unavailable;

    async fn list_all(&self, _: &str) -> Result<Vec<VisitorRecord>, Unavailable> {
      if self.fail_list {
        return Err(Unavailable);
      }
      Ok(self.records.lock().unwrap().clone())
    }

    async fn get_by_id(&self, _: &str, id: Uuid) -> Result<Option<VisitorRecord>, Unavailable> {
      Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn query_by_equality(
      &self,
      _: &str,
      field: crate::store::QueryField,
      value: &str,
    ) -> Result<Vec<VisitorRecord>, Unavailable> {
      Ok(
        self
          .records
          .lock()
          .unwrap()
          .iter()
          .filter(|r| field.value_of(r) == value)
          .cloned()
          .collect(),
      )
    }

    async fn batch_delete(&self, _: &str, ids: &[Uuid]) -> Result<usize, Unavailable> {
      if self.fail {
        return Err(Unavailable);
      }
      self.batches.lock().unwrap().push(ids.to_vec());
      let mut records = self.records.lock().unwrap();
      let before = records.len();
      records.retain(|r| !ids.contains(&r.id));
      Ok(before - records.len())
    }
  }

  #[tokio::test]
  async fn delete_selected_sends_one_batch_and_refetches() {
    let store = MemStore { records: Mutex::new(seven()), ..Default::default() };
    let mut table = TableState::new(seven());
    table.set_all_selected(true);

    let deleted = table.delete_selected(&store, "Users").await.unwrap();

    assert_eq!(deleted.count, 7);
    assert!(deleted.reload.is_none());
    let batches = store.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let mut sent: Vec<u128> = batches[0].iter().map(|id| id.as_u128()).collect();
    sent.sort_unstable();
    assert_eq!(sent, (1..=7).collect::<Vec<u128>>());
    assert!(table.selected().is_empty());
    assert!(table.snapshot().is_empty());
  }

  #[tokio::test]
  async fn failed_delete_keeps_selection() {
    let store = MemStore { records: Mutex::new(seven()), fail: true, ..Default::default() };
    let mut table = TableState::new(seven());
    table.toggle(Uuid::from_u128(4));

    assert!(table.delete_selected(&store, "Users").await.is_err());
    assert!(table.is_selected(Uuid::from_u128(4)));
    assert_eq!(table.snapshot().len(), 7);
  }

  #[tokio::test]
  async fn failed_reload_after_delete_still_reports_count() {
    let store =
      MemStore { records: Mutex::new(seven()), fail_list: true, ..Default::default() };
    let mut table = TableState::new(seven());
    table.toggle(Uuid::from_u128(4));

    let deleted = table.delete_selected(&store, "Users").await.unwrap();

    assert_eq!(deleted.count, 1);
    assert!(deleted.reload.is_some());
    assert!(table.selected().is_empty());
    assert_eq!(store.records.lock().unwrap().len(), 6);
    assert_eq!(table.snapshot().len(), 6);
    assert!(table.snapshot().iter().all(|r| r.id != Uuid::from_u128(4)));
  }

  #[tokio::test]
  async fn empty_selection_does_not_touch_store() {
    let store = MemStore::default();
    let mut table = TableState::new(seven());
    assert_eq!(table.delete_selected(&store, "Users").await.unwrap().count, 0);
    assert!(store.batches.lock().unwrap().is_empty());
  }
}
