//! Sign-in form.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, LoginField};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let form = &app.login;
  let area = super::centered(area, 52, 9);

  let block = Block::default()
    .title(" Sign in ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1),
      Constraint::Length(1), // email
      Constraint::Length(1),
      Constraint::Length(1), // password
      Constraint::Length(1),
      Constraint::Min(0), // error
    ])
    .split(inner);

  let masked = "*".repeat(form.password.chars().count());
  f.render_widget(
    Paragraph::new(field_line("Email", &form.email, form.focus == LoginField::Email)),
    rows[1],
  );
  f.render_widget(
    Paragraph::new(field_line("Password", &masked, form.focus == LoginField::Password)),
    rows[3],
  );

  if let Some(err) = &form.error {
    f.render_widget(
      Paragraph::new(Span::styled(format!(" {err}"), Style::default().fg(Color::Red))),
      rows[5],
    );
  }
}

fn field_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
  let label_style = if focused {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::Gray)
  };
  let mut spans = vec![
    Span::styled(format!(" {label:<10}"), label_style),
    Span::raw(value),
  ];
  if focused {
    spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
  }
  Line::from(spans)
}
