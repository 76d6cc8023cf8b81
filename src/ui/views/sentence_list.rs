use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::wanikani::types::Subject;

/// Draw every context sentence of the loaded vocabulary as a scrollable list
pub fn draw_sentence_list(frame: &mut Frame, area: Rect, vocab: &[Subject], scroll: u16) {
  let block = Block::default()
    .borders(Borders::ALL)
    .title(" Sentences ");

  if vocab.is_empty() {
    let empty = Paragraph::new("No vocabulary loaded yet. Press s to sync with WaniKani.")
      .style(Style::default().fg(Color::DarkGray))
      .block(block);
    frame.render_widget(empty, area);
    return;
  }

  let mut lines: Vec<Line> = Vec::new();
  for subject in vocab {
    for sentence in &subject.context_sentences {
      lines.push(Line::from(Span::styled(
        sentence.ja.clone(),
        Style::default().fg(Color::White),
      )));
      lines.push(Line::from(Span::styled(
        sentence.en.clone(),
        Style::default().fg(Color::DarkGray),
      )));
      lines.push(Line::raw(""));
    }
  }

  let paragraph = Paragraph::new(lines)
    .block(block)
    .wrap(ratatui::widgets::Wrap { trim: false })
    .scroll((scroll, 0));

  frame.render_widget(paragraph, area);
}
