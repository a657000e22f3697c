//! Visitor profile: one record's fields grouped into sections.

use lookout_core::profile::{self, Profile};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, LoadState};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  match (&app.profile, &app.load) {
    (Some(Profile::Found { record, visits }), _) => {
      draw_sections(f, area, &profile::sections(record, *visits));
    }
    (Some(Profile::NoData), _) => placeholder(f, area, "No Data", Color::DarkGray),
    (None, LoadState::Failed(msg)) => placeholder(f, area, msg, Color::Red),
    (None, _) => placeholder(f, area, "Loading...", Color::DarkGray),
  }
}

fn draw_sections(f: &mut Frame, area: Rect, sections: &[profile::Section]) {
  // Two columns of two sections each.
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(area);

  for (col, chunk) in cols.iter().zip(sections.chunks(2)) {
    let heights: Vec<Constraint> = chunk
      .iter()
      .map(|s| Constraint::Length(s.fields.len() as u16 + 2))
      .chain(std::iter::once(Constraint::Min(0)))
      .collect();
    let cells = Layout::default()
      .direction(Direction::Vertical)
      .constraints(heights)
      .split(*col);

    for (cell, section) in cells.iter().zip(chunk) {
      let label_width = section.fields.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
      let lines: Vec<Line> = section
        .fields
        .iter()
        .map(|(label, value)| {
          Line::from(vec![
            Span::styled(
              format!("{label:<label_width$}  "),
              Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            ),
            Span::raw(value.as_str()),
          ])
        })
        .collect();

      let block = Block::default()
        .title(format!(" {} ", section.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
      f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        *cell,
      );
    }
  }
}

fn placeholder(f: &mut Frame, area: Rect, text: &str, color: Color) {
  let block = Block::default()
    .title(" User Profile ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(Span::styled(text, Style::default().fg(color))),
    super::centered(inner, text.len() as u16, 1),
  );
}
