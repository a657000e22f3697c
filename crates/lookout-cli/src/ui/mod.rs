//! TUI rendering: header, the current route's screen, status bar.

pub mod dashboard;
pub mod detail;
pub mod login;
pub mod records;

use chrono::Local;
use lookout_core::route::Route;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Mode};

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  match app.route {
    Route::Login => login::draw(f, rows[1], app),
    Route::Records => records::draw(f, rows[1], app),
    Route::Record(_) => detail::draw(f, rows[1], app),
    Route::Dashboard => dashboard::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let title = match app.route {
    Route::Login => "Sign in",
    Route::Records => "Users",
    Route::Record(_) => "User Profile",
    Route::Dashboard => "Dashboard",
  };
  let left = Span::styled(
    format!(" lookout  {title}"),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  let who = match app.session.current() {
    lookout_core::AuthState::Authenticated(p) => p.email,
    lookout_core::AuthState::Unauthenticated => String::new(),
  };
  let date = Local::now().format("%Y-%m-%d");
  let right = Span::styled(
    format!("{who}  {date} "),
    Style::default().fg(Color::Gray),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match (app.route, app.mode) {
    (Route::Login, _) => ("LOGIN", "Tab switch field  Enter submit  Esc quit"),
    (Route::Records, Mode::Filter(_)) => (
      "FILTER",
      "Type to filter  Tab next field  Enter done  Esc clear",
    ),
    (Route::Records, Mode::ConfirmDelete) => ("DELETE", "y confirm  any other key cancels"),
    (Route::Records, Mode::Normal) => (
      "LIST",
      "jk move  hl page  1-7 sort  / filter  space select  x delete  d dashboard  L sign out  q quit",
    ),
    (Route::Record(_), _) => ("DETAIL", "Esc back  r reload  L sign out  q quit"),
    (Route::Dashboard, _) => ("DASHBOARD", "Esc back  r refresh  L sign out  q quit"),
  };

  let status = if app.status_msg.is_empty() { hints } else { app.status_msg.as_str() };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}

/// A centred rect `width` x `height` inside `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}
