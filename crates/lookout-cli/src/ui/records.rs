//! Record list: the sortable, filterable, paginated table with checkboxes.

use lookout_core::{
  VisitorRecord,
  record::or_na,
  table::{CheckState, FilterField, SortDirection, SortKey},
};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState as WidgetState},
};
use strum::IntoEnumIterator;

use crate::app::{App, LoadState, Mode};

/// Columns in display order; the location column sorts on city.
const COLUMNS: [(&str, Option<SortKey>); 8] = [
  ("Visitor ID", Some(SortKey::VisitorId)),
  ("IP Address", Some(SortKey::Ip)),
  ("Location", Some(SortKey::City)),
  ("Browser", Some(SortKey::Browser)),
  ("Last Visit", Some(SortKey::CreatedAt)),
  ("Confidence", Some(SortKey::Confidence)),
  ("Audio", None),
  ("Video", None),
];

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let view = app.table.view();
  let total = app.table.snapshot().len();

  let title = if app.table.predicate().is_empty() {
    format!(" Users ({total}) ")
  } else {
    format!(" Users ({}/{total}) ", view.filtered_len)
  };
  let border = match app.load {
    LoadState::Failed(_) => Color::Red,
    _ => Color::DarkGray,
  };
  let block = Block::default()
    .title(title)
    .title_bottom(footer(app, view.page_index, view.last_page, view.page_size))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut inner = block.inner(area);
  f.render_widget(block, area);

  // Filter bar on the top line of the pane.
  if inner.height > 2 {
    let bar = Rect { height: 1, ..inner };
    inner.y += 1;
    inner.height -= 1;
    f.render_widget(Paragraph::new(filter_line(app)), bar);
  }

  let header = Row::new(
    std::iter::once(Cell::from(checkbox(app.table.check_state())))
      .chain(COLUMNS.iter().map(|(label, key)| Cell::from(header_label(app, label, *key)))),
  )
  .style(Style::default().add_modifier(Modifier::BOLD))
  .bottom_margin(1);

  let rows = view
    .rows
    .iter()
    .map(|r| record_row(app, r))
    .chain((0..view.pad_rows).map(|_| Row::new(vec![Cell::from("")])));

  let widths = [
    Constraint::Length(3),
    Constraint::Min(14),
    Constraint::Length(16),
    Constraint::Min(16),
    Constraint::Length(10),
    Constraint::Length(17),
    Constraint::Length(11),
    Constraint::Length(9),
    Constraint::Length(9),
  ];

  let mut state = WidgetState::default();
  state.select((!view.rows.is_empty()).then_some(app.cursor));

  f.render_stateful_widget(
    Table::new(rows, widths).header(header).row_highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}

fn record_row<'a>(app: &App, r: &'a VisitorRecord) -> Row<'a> {
  let (audio, video) = r.device_labels();
  let last_visit = r
    .created_at_local()
    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|| or_na("").to_owned());
  let confidence = r
    .fields
    .confidence_score
    .map(|s| format!("{s:.2}"))
    .unwrap_or_else(|| or_na("").to_owned());
  let selected = if app.table.is_selected(r.id) { "[x]" } else { "[ ]" };

  Row::new(vec![
    Cell::from(selected),
    Cell::from(or_na(r.visitor_id())),
    Cell::from(or_na(r.ip())),
    Cell::from(r.city_country()),
    Cell::from(or_na(r.browser())),
    Cell::from(last_visit),
    Cell::from(confidence),
    Cell::from(audio),
    Cell::from(video),
  ])
}

fn checkbox(state: CheckState) -> &'static str {
  match state {
    CheckState::Unchecked => "[ ]",
    CheckState::Indeterminate => "[-]",
    CheckState::Checked => "[x]",
  }
}

/// Column label with its sort hotkey and, for the active column, an arrow.
fn header_label(app: &App, label: &str, key: Option<SortKey>) -> String {
  let Some(key) = key else {
    return label.to_owned();
  };
  let hotkey = SortKey::iter().position(|k| k == key).map_or(0, |i| i + 1);
  if app.table.sort_key() != key {
    return format!("{hotkey}:{label}");
  }
  let arrow = match app.table.sort_direction() {
    SortDirection::Asc => '▲',
    SortDirection::Desc => '▼',
  };
  format!("{hotkey}:{label}{arrow}")
}

fn filter_line(app: &App) -> Line<'_> {
  let editing = match app.mode {
    Mode::Filter(field) => Some(field),
    _ => None,
  };
  let mut spans = vec![Span::styled("/ ", Style::default().fg(Color::Yellow))];
  for field in FilterField::iter() {
    let query = app.table.predicate().query(field);
    if editing != Some(field) && query.is_empty() {
      continue;
    }
    let style = if editing == Some(field) {
      Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Yellow)
    };
    let cursor = if editing == Some(field) { "_" } else { "" };
    spans.push(Span::styled(format!("{field}: {query}{cursor}  "), style));
  }
  if spans.len() == 1 {
    spans.push(Span::styled("no filters", Style::default().fg(Color::DarkGray)));
  }
  Line::from(spans)
}

fn footer(app: &App, page_index: usize, last_page: usize, page_size: usize) -> Line<'static> {
  let selected = app.table.selected().len();
  let mut text = format!(" page {}/{}  {page_size} per page ", page_index + 1, last_page + 1);
  if selected > 0 {
    text.push_str(&format!(" {selected} selected "));
  }
  if app.mode == Mode::ConfirmDelete {
    text.push_str(&format!(" delete {selected} records? (y/n) "));
  }
  Line::from(text)
}
