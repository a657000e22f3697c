//! Application state machine and event dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lookout_core::{
  AuthState, Session, VisitorRecord,
  aggregate::{Summary, summarize},
  profile::{self, Profile},
  route::Route,
  table::{CheckState, Deleted, FilterField, PAGE_SIZE_OPTIONS, Predicate, SortKey, TableState},
};
use strum::IntoEnumIterator;
use tokio::sync::watch;
use uuid::Uuid;

use crate::client::{ApiClient, ClientError};

// ─── Login form ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
  #[default]
  Email,
  Password,
}

#[derive(Debug, Default)]
pub struct LoginForm {
  pub email:    String,
  pub password: String,
  pub focus:    LoginField,
  /// Inline message from the last failed attempt.
  pub error:    Option<String>,
}

impl LoginForm {
  fn focused_mut(&mut self) -> &mut String {
    match self.focus {
      LoginField::Email => &mut self.email,
      LoginField::Password => &mut self.password,
    }
  }

  fn switch_focus(&mut self) {
    self.focus = match self.focus {
      LoginField::Email => LoginField::Password,
      LoginField::Password => LoginField::Email,
    };
  }
}

// ─── Modes ────────────────────────────────────────────────────────────────────

/// Keyboard mode on the record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  /// Typing into the filter for one field.
  Filter(FilterField),
  /// Waiting for y/n on a bulk delete.
  ConfirmDelete,
}

/// Outcome of the last fetch for the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
  Idle,
  Loaded,
  Failed(String),
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen, always the result of [`Route::guard`].
  pub route: Route,

  pub mode: Mode,

  /// Auth state; the only place sign-in status is tracked.
  pub session: Session,

  /// The session subscription, taken once at construction.
  auth_rx: watch::Receiver<AuthState>,

  /// Shared HTTP client; both record store and identity provider.
  pub client: Arc<ApiClient>,

  pub collection: String,

  /// Snapshot plus sort, filter, page and selection.
  pub table: TableState,

  /// Cursor row within the visible page.
  pub cursor: usize,

  pub login: LoginForm,

  /// Profile for the `Record` route.
  pub profile: Option<Profile>,

  /// Aggregates for the `Dashboard` route.
  pub summary: Option<Summary>,

  pub load: LoadState,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl App {
  pub fn new(client: ApiClient, session: Session, collection: String) -> Self {
    let auth_rx = session.subscribe();
    let route = Route::Records.guard(&session.current());
    Self {
      route,
      mode: Mode::Normal,
      session,
      auth_rx,
      client: Arc::new(client),
      collection,
      table: TableState::default(),
      cursor: 0,
      login: LoginForm::default(),
      profile: None,
      summary: None,
      load: LoadState::Idle,
      status_msg: String::new(),
    }
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// Prefill the login form and submit it, for credentials given on the
  /// command line.
  pub async fn sign_in_with(&mut self, email: String, password: String) {
    self.login.email = email;
    self.login.password = password;
    self.submit_login().await;
  }

  async fn submit_login(&mut self) {
    let result = self
      .session
      .sign_in(&*self.client, self.login.email.trim(), &self.login.password)
      .await;
    match result {
      Ok(_) => {
        self.login.password.clear();
        self.login.error = None;
      }
      Err(e) => {
        tracing::warn!(error = %e, "sign-in failed");
        self.login.error = Some(match &e {
          ClientError::Status { message, .. } => message.clone(),
          other => other.to_string(),
        });
      }
    }
  }

  async fn sign_out(&mut self) {
    if let Err(e) = self.session.sign_out(&*self.client).await {
      tracing::warn!(error = %e, "server sign-out failed; session dropped locally");
    }
  }

  /// React to auth changes since the last call: sign-in lands on the record
  /// list, sign-out drops cached data and returns to login.
  pub async fn sync_auth(&mut self) {
    if !self.auth_rx.has_changed().unwrap_or(false) {
      return;
    }
    let authenticated = self.auth_rx.borrow_and_update().is_authenticated();
    if authenticated {
      self.navigate(Route::Records).await;
    } else {
      self.table = TableState::default();
      self.profile = None;
      self.summary = None;
      self.cursor = 0;
      self.load = LoadState::Idle;
      self.navigate(Route::Login).await;
    }
  }

  // ── Navigation and loading ────────────────────────────────────────────────

  /// Move to `to` (after the auth guard) and load what the screen shows.
  pub async fn navigate(&mut self, to: Route) {
    self.route = to.guard(&self.session.current());
    self.mode = Mode::Normal;
    self.status_msg.clear();
    match self.route {
      Route::Login => {}
      Route::Records => self.refresh().await,
      Route::Record(id) => self.load_profile(id).await,
      Route::Dashboard => {
        self.refresh().await;
        self.summary = match self.load {
          LoadState::Loaded => Some(summarize(self.table.snapshot())),
          _ => None,
        };
      }
    }
  }

  /// Re-fetch the snapshot. Selection is pruned to records still present.
  async fn refresh(&mut self) {
    match self.table.refresh(&*self.client, &self.collection).await {
      Ok(()) => {
        self.load = LoadState::Loaded;
        self.clamp_cursor();
      }
      Err(e) => self.fail("fetch records", e).await,
    }
  }

  async fn load_profile(&mut self, id: Uuid) {
    match profile::load(&*self.client, &self.collection, id).await {
      Ok(p) => {
        self.profile = Some(p);
        self.load = LoadState::Loaded;
      }
      Err(e) => {
        self.profile = None;
        self.fail("load profile", e).await;
      }
    }
  }

  /// Log and surface a failed request. A rejected token ends the session.
  async fn fail(&mut self, action: &str, e: ClientError) {
    tracing::error!(error = %e, "failed to {action}");
    if e.is_unauthorized() {
      self.sign_out().await;
      self.login.error = Some("Session expired; sign in again.".into());
      return;
    }
    self.load = LoadState::Failed(e.to_string());
    self.status_msg = format!("Error: {e}");
  }

  async fn delete_selected(&mut self) {
    let count = self.table.selected().len();
    match self.table.delete_selected(&*self.client, &self.collection).await {
      Ok(deleted) => {
        self.clamp_cursor();
        self.status_msg = delete_status(count, &deleted);
        match deleted.reload {
          None => self.load = LoadState::Loaded,
          Some(e) if e.is_unauthorized() => self.fail("reload records", e).await,
          Some(_) => {}
        }
      }
      Err(e) => {
        self.fail("delete selected records", e).await;
        if !self.status_msg.is_empty() {
          self.status_msg.push_str("  (selection kept; x to retry)");
        }
      }
    }
  }

  // ── Page helpers ──────────────────────────────────────────────────────────

  /// The visible page of rows.
  pub fn page_rows(&self) -> Vec<&VisitorRecord> { self.table.view().rows }

  fn cursor_record_id(&self) -> Option<Uuid> {
    self.page_rows().get(self.cursor).map(|r| r.id)
  }

  fn clamp_cursor(&mut self) {
    let len = self.page_rows().len();
    self.cursor = self.cursor.min(len.saturating_sub(1));
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    let cont = match self.route {
      Route::Login => self.handle_login_key(key).await,
      Route::Records => match self.mode {
        Mode::Filter(field) => self.handle_filter_key(field, key),
        Mode::ConfirmDelete => self.handle_confirm_key(key).await,
        Mode::Normal => self.handle_list_key(key).await,
      },
      Route::Record(id) => self.handle_detail_key(id, key).await,
      Route::Dashboard => self.handle_dashboard_key(key).await,
    };

    self.sync_auth().await;
    Ok(cont)
  }

  async fn handle_login_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc => return false,
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.login.switch_focus();
      }
      KeyCode::Enter => match self.login.focus {
        LoginField::Email => self.login.focus = LoginField::Password,
        LoginField::Password => self.submit_login().await,
      },
      KeyCode::Backspace => {
        self.login.focused_mut().pop();
      }
      KeyCode::Char(c) => self.login.focused_mut().push(c),
      _ => {}
    }
    true
  }

  fn handle_filter_key(&mut self, field: FilterField, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Enter => self.mode = Mode::Normal,
      KeyCode::Esc => {
        self.table.set_filter(field, "");
        self.mode = Mode::Normal;
      }
      KeyCode::Tab => self.mode = Mode::Filter(next_filter_field(field)),
      KeyCode::Backspace => {
        let mut query = self.table.predicate().query(field).to_owned();
        query.pop();
        self.table.set_filter(field, query);
      }
      KeyCode::Char(c) => {
        let query = format!("{}{c}", self.table.predicate().query(field));
        self.table.set_filter(field, query);
      }
      _ => {}
    }
    self.cursor = 0;
    true
  }

  async fn handle_confirm_key(&mut self, key: KeyEvent) -> bool {
    self.mode = Mode::Normal;
    if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
      self.delete_selected().await;
    } else {
      self.status_msg = "Delete cancelled".into();
    }
    true
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      // Quit
      KeyCode::Char('q') => return false,

      // Cursor
      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.page_rows().len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),

      // Pages
      KeyCode::Right | KeyCode::Char('l') => {
        self.table.next_page();
        self.cursor = 0;
      }
      KeyCode::Left | KeyCode::Char('h') => {
        self.table.prev_page();
        self.cursor = 0;
      }
      KeyCode::Home | KeyCode::Char('g') => {
        self.table.first_page();
        self.cursor = 0;
      }
      KeyCode::End | KeyCode::Char('G') => {
        self.table.to_last_page();
        self.cursor = 0;
      }
      KeyCode::Char('p') => {
        self.table.set_page_size(next_page_size(self.table.page_size()));
        self.cursor = 0;
      }

      // Sort: number keys pick a column, repeating flips direction.
      KeyCode::Char(c @ '1'..='9') => {
        let index = c as usize - '1' as usize;
        if let Some(sort_key) = SortKey::iter().nth(index) {
          self.table.request_sort(sort_key);
        }
      }

      // Filter
      KeyCode::Char('/') => self.mode = Mode::Filter(FilterField::Ip),
      KeyCode::Char('c') => {
        self.table.set_predicate(Predicate::default());
        self.cursor = 0;
      }

      // Selection
      KeyCode::Char(' ') => {
        if let Some(id) = self.cursor_record_id() {
          self.table.toggle(id);
        }
      }
      KeyCode::Char('a') => {
        let checked = self.table.check_state() != CheckState::Checked;
        self.table.set_all_selected(checked);
      }
      KeyCode::Char('x') | KeyCode::Delete => {
        if self.table.selected().is_empty() {
          self.status_msg = "Nothing selected".into();
        } else {
          self.mode = Mode::ConfirmDelete;
        }
      }

      // Screens
      KeyCode::Enter => {
        if let Some(id) = self.cursor_record_id() {
          self.navigate(Route::Record(id)).await;
        }
      }
      KeyCode::Char('d') => self.navigate(Route::Dashboard).await,
      KeyCode::Char('r') => self.refresh().await,
      KeyCode::Char('L') => self.sign_out().await,

      _ => {}
    }
    true
  }

  async fn handle_detail_key(&mut self, id: Uuid, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') | KeyCode::Backspace => {
        self.profile = None;
        self.navigate(Route::Records).await;
      }
      KeyCode::Char('r') => self.load_profile(id).await,
      KeyCode::Char('L') => self.sign_out().await,
      _ => {}
    }
    true
  }

  async fn handle_dashboard_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Esc | KeyCode::Backspace => self.navigate(Route::Records).await,
      KeyCode::Char('r') => self.navigate(Route::Dashboard).await,
      KeyCode::Char('L') => self.sign_out().await,
      _ => {}
    }
    true
  }
}

/// Status line after a committed delete of `requested` selected records.
pub fn delete_status<E: std::fmt::Display>(requested: usize, deleted: &Deleted<E>) -> String {
  let done = format!("Deleted {} of {requested} selected records", deleted.count);
  match &deleted.reload {
    None => done,
    Some(e) => format!("{done}; reload failed: {e} (r to retry)"),
  }
}

/// The page size after `current` in the offered options, wrapping around.
pub fn next_page_size(current: usize) -> usize {
  let next = PAGE_SIZE_OPTIONS
    .iter()
    .position(|&s| s == current)
    .map_or(0, |i| (i + 1) % PAGE_SIZE_OPTIONS.len());
  PAGE_SIZE_OPTIONS[next]
}

/// The filter field after `current`, wrapping around.
pub fn next_filter_field(current: FilterField) -> FilterField {
  FilterField::iter()
    .cycle()
    .skip_while(|&f| f != current)
    .nth(1)
    .unwrap_or(current)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_size_cycles_through_options() {
    assert_eq!(next_page_size(5), 10);
    assert_eq!(next_page_size(10), 25);
    assert_eq!(next_page_size(25), 5);
    assert_eq!(next_page_size(7), 5);
  }

  #[test]
  fn filter_field_cycles() {
    assert_eq!(next_filter_field(FilterField::Ip), FilterField::VisitorId);
    assert_eq!(next_filter_field(FilterField::Browser), FilterField::Ip);
  }

  #[test]
  fn login_form_edits_focused_field() {
    let mut form = LoginForm::default();
    form.focused_mut().push_str("a@b.c");
    form.switch_focus();
    form.focused_mut().push_str("pw");
    assert_eq!(form.email, "a@b.c");
    assert_eq!(form.password, "pw");
    form.switch_focus();
    assert_eq!(form.focus, LoginField::Email);
  }

  #[test]
  fn delete_status_reports_count_even_when_reload_fails() {
    let ok: Deleted<ClientError> = Deleted { count: 3, reload: None };
    assert_eq!(delete_status(3, &ok), "Deleted 3 of 3 selected records");

    let stale = Deleted { count: 1, reload: Some(ClientError::NotSignedIn) };
    assert_eq!(
      delete_status(2, &stale),
      "Deleted 1 of 2 selected records; reload failed: not signed in (r to retry)"
    );
  }

  #[tokio::test]
  async fn starts_on_login_when_signed_out() {
    let client = ApiClient::new(crate::client::ApiConfig {
      base_url: "http://127.0.0.1:9".into(),
    })
    .unwrap();
    let app = App::new(client, Session::new(), "Users".into());
    assert_eq!(app.route, Route::Login);
  }
}
