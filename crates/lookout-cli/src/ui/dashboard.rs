//! Dashboard: VPN and incognito splits plus browser, country and city
//! distributions over the current snapshot.

use lookout_core::aggregate::{Summary, Tally};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(summary) = &app.summary else {
    f.render_widget(
      Paragraph::new(Span::styled(" No data loaded.", Style::default().fg(Color::DarkGray)))
        .block(Block::default().title(" Dashboard ").borders(Borders::ALL)),
      area,
    );
    return;
  };

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(4), Constraint::Min(0)])
    .split(area);

  draw_splits(f, rows[0], summary);

  let charts = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage(34),
      Constraint::Percentage(33),
      Constraint::Percentage(33),
    ])
    .split(rows[1]);

  draw_tally(f, charts[0], "Browsers", &summary.browsers, Color::Cyan);
  draw_tally(f, charts[1], "Countries", &summary.countries, Color::Green);
  draw_tally(f, charts[2], "Cities", &summary.cities, Color::Magenta);
}

fn draw_splits(f: &mut Frame, area: Rect, s: &Summary) {
  let lines = vec![
    Line::from(format!(" Total visits: {}", s.total)),
    Line::from(vec![
      Span::styled(format!(" VPN: {}", s.vpn), Style::default().fg(Color::Yellow)),
      Span::raw(format!("   No VPN: {}", s.no_vpn)),
      Span::styled(
        format!("   Incognito: {}", s.incognito),
        Style::default().fg(Color::Yellow),
      ),
      Span::raw(format!("   Regular: {}", s.regular)),
    ]),
  ];
  f.render_widget(
    Paragraph::new(lines).block(Block::default().title(" Overview ").borders(Borders::ALL)),
    area,
  );
}

fn draw_tally(f: &mut Frame, area: Rect, title: &str, tally: &Tally, color: Color) {
  // Horizontal bars: one per bucket, labelled.
  let bars: Vec<Bar> = tally
    .entries()
    .iter()
    .map(|(bucket, count)| {
      Bar::default()
        .label(Line::from(bucket.to_string()))
        .value(*count as u64)
        .style(Style::default().fg(color))
    })
    .collect();

  f.render_widget(
    BarChart::default()
      .block(Block::default().title(format!(" {title} ")).borders(Borders::ALL))
      .direction(Direction::Horizontal)
      .bar_width(1)
      .bar_gap(0)
      .data(BarGroup::default().bars(&bars)),
    area,
  );
}
