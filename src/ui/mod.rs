mod header;
mod views;

use crate::app::{App, StatusKind};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  header::draw_header(frame, chunks[0], app);

  if let Some(picked) = app.current_pick() {
    views::random_pick::draw_random_pick(frame, chunks[1], picked, app.revealed());
  } else {
    views::sentence_list::draw_sentence_list(frame, chunks[1], app.vocab(), app.scroll());
  }

  draw_status_bar(frame, chunks[2], app);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.latest_status() {
    Some(msg) => {
      let color = match msg.kind {
        StatusKind::Info => Color::Cyan,
        StatusKind::Success => Color::Green,
        StatusKind::Error => Color::Red,
      };
      (format!(" {}", msg.text), Style::default().fg(color))
    }
    None => {
      let hint =
        " s:sync  r:random  Space:reveal  v:voice  x:clear audio  j/k:scroll  Esc:back  q:quit";
      (hint.to_string(), Style::default().fg(Color::DarkGray))
    }
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}
