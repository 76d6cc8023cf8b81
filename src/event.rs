use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::wanikani::types::Subject;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh and status message expiry
  Tick,
  /// Completed background work
  App(AppEvent),
  /// Background task failure, surfaced as a status message
  Error(String),
}

/// Results of background tasks
#[derive(Debug)]
pub enum AppEvent {
  /// A sync finished; carries the new relevant vocabulary set
  VocabLoaded(Vec<Subject>),
  /// Synthesized audio was written to disk
  AudioReady(PathBuf),
  /// Audio cache sweep finished; carries the number of removed entries
  AudioCacheCleared(usize),
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
  tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn terminal event reader
    let input_tx = tx.clone();
    tokio::spawn(async move {
      loop {
        if event::poll(tick_rate).unwrap_or(false) {
          if let Ok(CrosstermEvent::Key(key)) = event::read() {
            if input_tx.send(Event::Key(key)).is_err() {
              break;
            }
          }
        } else {
          // Tick
          if input_tx.send(Event::Tick).is_err() {
            break;
          }
        }
      }
    });

    Self { rx, tx }
  }

  /// Sender for async tasks to report back through
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
