use crate::cache::{KvStore, MemoryStore, SqliteStore};
use crate::config::Config;
use crate::event::{AppEvent, Event, EventHandler};
use crate::pick::{self, SentencePick};
use crate::tts::{self, TtsService};
use crate::ui;
use crate::wanikani::client::WkClient;
use crate::wanikani::service::VocabService;
use crate::wanikani::sync;
use crate::wanikani::types::Subject;
use chrono::{DateTime, Utc};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How long a status message stays visible
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// How far the spoiler reveal goes: slug, then sentence, then translation
const REVEAL_STEPS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
  Info,
  Success,
  Error,
}

/// A transient status message, shown until it times out
#[derive(Debug)]
pub struct StatusMessage {
  pub text: String,
  pub kind: StatusKind,
  posted_at: Instant,
}

/// Main application state
pub struct App {
  /// Relevant vocabulary set from the last sync (or restored snapshot)
  vocab: Vec<Subject>,

  /// Currently drawn random sentence, if any
  current_pick: Option<SentencePick>,

  /// How many spoiler lines of the current pick are revealed
  revealed: usize,

  /// Scroll offset of the sentence list view
  scroll: u16,

  /// Transient status messages
  status_messages: Vec<StatusMessage>,

  /// Whether a sync is in flight (the sync key is ignored while set)
  syncing: bool,

  /// Whether a voice synthesis is in flight
  synthesizing: bool,

  last_synced_at: Option<DateTime<Utc>>,

  /// Level filter spec applied on every sync
  level_spec: String,

  title: String,

  /// Shared key/value store
  store: Arc<dyn KvStore>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    // The application still starts when the on-disk store is unavailable;
    // it just begins with an empty state that lives for the session.
    let store: Arc<dyn KvStore> = match SqliteStore::open() {
      Ok(store) => Arc::new(store),
      Err(e) => {
        warn!(error = %e, "local store unavailable, falling back to in-memory");
        Arc::new(MemoryStore::new())
      }
    };

    let (tx, _rx) = mpsc::unbounded_channel();

    Ok(Self {
      vocab: Vec::new(),
      current_pick: None,
      revealed: 0,
      scroll: 0,
      status_messages: Vec::new(),
      syncing: false,
      synthesizing: false,
      last_synced_at: None,
      level_spec: config.levels.unwrap_or_default(),
      title: config.title.unwrap_or_else(|| "reibun".to_string()),
      store,
      event_tx: tx,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    // Restore the last snapshot before any user interaction; never hits
    // the network
    self.bootstrap().await;

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  async fn bootstrap(&mut self) {
    self.vocab = sync::load_snapshot(self.store.as_ref()).await;
    self.last_synced_at = sync::last_synced_at(self.store.as_ref()).await;
    info!(words = self.vocab.len(), "restored snapshot");

    if !self.vocab.is_empty() {
      let text = format!(
        "Restored {} vocabulary words, {} context sentences.",
        self.vocab.len(),
        sentence_count(&self.vocab)
      );
      self.push_status(text, StatusKind::Info);
    }
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.expire_status_messages(),
      Event::App(app_event) => self.handle_app_event(app_event),
      Event::Error(msg) => {
        self.syncing = false;
        self.synthesizing = false;
        self.push_status(format!("Error: {}.", msg), StatusKind::Error);
      }
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      // Quit, or leave the random-pick view first
      KeyCode::Char('q') => {
        if self.current_pick.is_some() {
          self.current_pick = None;
        } else {
          self.should_quit = true;
        }
      }
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }
      KeyCode::Esc => {
        self.current_pick = None;
      }

      KeyCode::Char('s') => self.start_sync(),
      KeyCode::Char('r') => self.pick_random(),
      KeyCode::Char(' ') | KeyCode::Enter => self.reveal_next(),
      KeyCode::Char('v') => self.start_voice(),
      KeyCode::Char('x') => self.start_clear_audio(),

      // Sentence list scrolling
      KeyCode::Down | KeyCode::Char('j') => {
        self.scroll = self.scroll.saturating_add(2);
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.scroll = self.scroll.saturating_sub(2);
      }

      _ => {}
    }
  }

  fn start_sync(&mut self) {
    if self.syncing {
      return;
    }

    let token = match Config::wanikani_token() {
      Ok(token) => token,
      Err(e) => {
        self.push_status(e.to_string(), StatusKind::Error);
        return;
      }
    };

    self.syncing = true;
    self.push_status("Fetching WaniKani vocabulary...", StatusKind::Info);

    let service = VocabService::new(WkClient::new(token), Arc::clone(&self.store));
    let level_spec = self.level_spec.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      match service.sync(&level_spec).await {
        Ok(vocab) => {
          let _ = tx.send(Event::App(AppEvent::VocabLoaded(vocab)));
        }
        Err(e) => {
          let _ = tx.send(Event::Error(e.to_string()));
        }
      }
    });
  }

  fn pick_random(&mut self) {
    if self.vocab.is_empty() {
      self.push_status("Collect vocabulary data first!", StatusKind::Error);
      return;
    }

    let mut rng = rand::rng();
    match pick::random_sentence(&mut rng, &self.vocab) {
      Some(picked) => {
        self.current_pick = Some(picked);
        self.revealed = 0;
      }
      None => {
        self.push_status(
          "No context sentences in the current vocabulary set.",
          StatusKind::Error,
        );
      }
    }
  }

  fn reveal_next(&mut self) {
    if self.current_pick.is_some() && self.revealed < REVEAL_STEPS {
      self.revealed += 1;
    }
  }

  fn start_voice(&mut self) {
    if self.synthesizing {
      return;
    }
    let Some(picked) = &self.current_pick else {
      self.push_status("Pick a random sentence first.", StatusKind::Error);
      return;
    };
    let text = picked.ja.clone();

    self.synthesizing = true;
    self.push_status("Generating voice...", StatusKind::Info);

    let service = TtsService::new(Config::tts_token(), Arc::clone(&self.store));
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let result = async {
        let bytes = service.synthesize(&text).await?;
        tts::write_audio_file(&bytes).await
      }
      .await;

      match result {
        Ok(path) => {
          let _ = tx.send(Event::App(AppEvent::AudioReady(path)));
        }
        Err(e) => {
          let _ = tx.send(Event::Error(e.to_string()));
        }
      }
    });
  }

  fn start_clear_audio(&mut self) {
    let service = TtsService::new(None, Arc::clone(&self.store));
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      match service.clear_audio_cache().await {
        Ok(removed) => {
          let _ = tx.send(Event::App(AppEvent::AudioCacheCleared(removed)));
        }
        Err(e) => {
          let _ = tx.send(Event::Error(e.to_string()));
        }
      }
    });
  }

  fn handle_app_event(&mut self, event: AppEvent) {
    match event {
      AppEvent::VocabLoaded(vocab) => {
        self.syncing = false;
        self.last_synced_at = Some(Utc::now());
        let kind = if vocab.is_empty() {
          StatusKind::Error
        } else {
          StatusKind::Success
        };
        self.push_status(
          format!(
            "Loaded {} vocabulary words, {} context sentences.",
            vocab.len(),
            sentence_count(&vocab)
          ),
          kind,
        );
        self.vocab = vocab;
        self.scroll = 0;
      }
      AppEvent::AudioReady(path) => {
        self.synthesizing = false;
        self.push_status(
          format!("Audio written to {}.", path.display()),
          StatusKind::Success,
        );
      }
      AppEvent::AudioCacheCleared(removed) => {
        self.push_status(
          format!("Cleaned up {} audio entries.", removed),
          StatusKind::Success,
        );
      }
    }
  }

  fn push_status(&mut self, text: impl Into<String>, kind: StatusKind) {
    let text = text.into();
    info!(status = %text, "status message");
    self.status_messages.push(StatusMessage {
      text,
      kind,
      posted_at: Instant::now(),
    });
  }

  fn expire_status_messages(&mut self) {
    self
      .status_messages
      .retain(|msg| msg.posted_at.elapsed() < MESSAGE_TIMEOUT);
  }

  // Accessors for UI rendering
  pub fn vocab(&self) -> &[Subject] {
    &self.vocab
  }

  pub fn current_pick(&self) -> Option<&SentencePick> {
    self.current_pick.as_ref()
  }

  pub fn revealed(&self) -> usize {
    self.revealed
  }

  pub fn scroll(&self) -> u16 {
    self.scroll
  }

  pub fn is_syncing(&self) -> bool {
    self.syncing
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
    self.last_synced_at
  }

  pub fn latest_status(&self) -> Option<&StatusMessage> {
    self.status_messages.last()
  }
}

/// Total number of context sentences across the set
pub fn sentence_count(vocab: &[Subject]) -> usize {
  vocab.iter().map(|s| s.context_sentences.len()).sum()
}
