use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{self, App};

/// Draw the header bar with title, counts, and sync state
pub fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
  let sync_label = if app.is_syncing() {
    "syncing...".to_string()
  } else {
    format!(
      "synced {}",
      format_last_synced(app.last_synced_at(), Utc::now())
    )
  };

  let header = Line::from(vec![
    Span::styled(
      format!(" {} ", app.title()),
      Style::default().fg(Color::Cyan).bold(),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} words ", app.vocab().len()),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} sentences ", app::sentence_count(app.vocab())),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", sync_label),
      Style::default().fg(Color::Yellow),
    ),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Human-readable account of when the last sync happened
fn format_last_synced(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
  let Some(at) = at else {
    return "never".to_string();
  };

  let minutes = (now - at).num_minutes();
  match minutes {
    m if m < 1 => "just now".to_string(),
    m if m < 60 => format!("{}m ago", m),
    m if m < 60 * 24 => format!("{}h ago", m / 60),
    m => format!("{}d ago", m / (60 * 24)),
  }
}
