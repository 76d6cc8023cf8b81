use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::pick::{explain_link, SentencePick};

/// Draw the current random pick with stepwise spoiler reveal:
/// vocabulary first, then the sentence, then its translation.
pub fn draw_random_pick(frame: &mut Frame, area: Rect, picked: &SentencePick, revealed: usize) {
  let mut lines = vec![
    Line::raw(""),
    spoiler_line("vocabulary", &picked.slug, revealed >= 1, Color::Cyan),
    Line::raw(""),
    spoiler_line("sentence", &picked.ja, revealed >= 2, Color::White),
    Line::raw(""),
    spoiler_line("meaning", &picked.en, revealed >= 3, Color::Green),
  ];

  if revealed >= 2 {
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
      format!("  → ask duck.ai to explain: {}", explain_link(&picked.ja)),
      Style::default().fg(Color::DarkGray),
    )));
  }

  let paragraph = Paragraph::new(lines)
    .block(
      Block::default()
        .borders(Borders::ALL)
        .title(" Random sentence (Space to reveal) "),
    )
    .wrap(ratatui::widgets::Wrap { trim: false });

  frame.render_widget(paragraph, area);
}

fn spoiler_line(label: &str, text: &str, revealed: bool, color: Color) -> Line<'static> {
  let (value, style) = if revealed {
    (text.to_string(), Style::default().fg(color))
  } else {
    (mask(text), Style::default().fg(Color::DarkGray))
  };

  Line::from(vec![
    Span::styled(format!(" {:>10}  ", label), Style::default().fg(Color::DarkGray)),
    Span::styled(value, style),
  ])
}

/// Replace every character with a block so the hidden text keeps its length
fn mask(text: &str) -> String {
  text.chars().map(|_| '█').collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mask_preserves_char_count() {
    assert_eq!(mask("abc"), "███");
    assert_eq!(mask("犬が好き"), "████");
    assert_eq!(mask(""), "");
  }
}
