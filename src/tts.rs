//! Speech synthesis with local caching.
//!
//! One form-encoded POST per new sentence; the response bytes are cached
//! base64-encoded under a key derived from the text, so repeated requests for
//! the same sentence never touch the network again.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::{audio_key, KvStore, AUDIO_KEY_PREFIX};
use crate::wanikani::client::ApiError;

pub const TTS_API_BASE_URL: &str = "https://deprecatedapis.tts.quest/v2/voicevox/audio/";

/// Text-to-speech service backed by the shared key/value store.
pub struct TtsService {
  http: reqwest::Client,
  token: Option<String>,
  store: Arc<dyn KvStore>,
}

impl TtsService {
  pub fn new(token: Option<String>, store: Arc<dyn KvStore>) -> Self {
    Self {
      http: reqwest::Client::new(),
      token,
      store,
    }
  }

  /// Synthesized audio for the given text, served from cache when available.
  pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
    synthesize_with(self.store.as_ref(), text, || async move {
      let token = self
        .token
        .as_deref()
        .ok_or_else(|| eyre!("TTS API token not set. Export REIBUN_TTS_TOKEN."))?;

      let response = self
        .http
        .post(TTS_API_BASE_URL)
        .form(&[("text", text), ("key", token)])
        .send()
        .await
        .map_err(ApiError::from)?;

      let status = response.status();
      if !status.is_success() {
        return Err(
          ApiError::Request {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
          }
          .into(),
        );
      }

      Ok(response.bytes().await.map_err(ApiError::from)?.to_vec())
    })
    .await
  }

  /// Remove every cached audio entry; returns how many were deleted.
  pub async fn clear_audio_cache(&self) -> Result<usize> {
    let keys: Vec<String> = self
      .store
      .list_keys()
      .await?
      .into_iter()
      .filter(|key| key.starts_with(AUDIO_KEY_PREFIX))
      .collect();

    let removals = keys.iter().map(|key| async move {
      if let Err(e) = self.store.remove(key).await {
        warn!(key = %key, error = %e, "failed to remove audio entry");
      }
    });
    join_all(removals).await;

    Ok(keys.len())
  }
}

/// Cache-first synthesis over a fetch closure. A corrupt cache entry is
/// treated as a miss and refetched; a failed cache write is tolerated.
async fn synthesize_with<S, F, Fut>(store: &S, text: &str, fetch: F) -> Result<Vec<u8>>
where
  S: KvStore + ?Sized,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<Vec<u8>>>,
{
  let key = audio_key(text);

  match store.get(&key).await {
    Ok(Some(encoded)) => match BASE64.decode(encoded.as_bytes()) {
      Ok(bytes) => {
        debug!(key = %key, "audio cache hit");
        return Ok(bytes);
      }
      Err(e) => warn!(key = %key, error = %e, "corrupt audio entry, refetching"),
    },
    Ok(None) => {}
    Err(e) => warn!(key = %key, error = %e, "audio cache read failed"),
  }

  let bytes = fetch().await?;

  if let Err(e) = store.set(&key, &BASE64.encode(&bytes)).await {
    warn!(key = %key, error = %e, "audio cache write failed");
  }

  Ok(bytes)
}

/// Write synthesized audio next to the store so an external player can pick
/// it up; returns the file path.
pub async fn write_audio_file(bytes: &[u8]) -> Result<PathBuf> {
  let dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("reibun");

  tokio::fs::create_dir_all(&dir)
    .await
    .map_err(|e| eyre!("Failed to create data directory: {}", e))?;

  let path = dir.join("last_sentence.wav");
  tokio::fs::write(&path, bytes)
    .await
    .map_err(|e| eyre!("Failed to write audio file {}: {}", path.display(), e))?;

  Ok(path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use base64::Engine as _;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[tokio::test]
  async fn test_cache_hit_skips_fetch() {
    let store = MemoryStore::new();
    let text = "こんにちは。";
    store
      .set(&audio_key(text), &BASE64.encode(b"cached-audio"))
      .await
      .unwrap();

    let calls = AtomicUsize::new(0);
    let bytes = synthesize_with(&store, text, || {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Ok(Vec::new()) }
    })
    .await
    .unwrap();

    assert_eq!(bytes, b"cached-audio");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_miss_fetches_and_caches() {
    let store = MemoryStore::new();
    let text = "ありがとう。";

    let calls = AtomicUsize::new(0);
    let bytes = synthesize_with(&store, text, || {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Ok(b"fresh-audio".to_vec()) }
    })
    .await
    .unwrap();

    assert_eq!(bytes, b"fresh-audio");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stored = store.get(&audio_key(text)).await.unwrap().unwrap();
    assert_eq!(BASE64.decode(stored.as_bytes()).unwrap(), b"fresh-audio");
  }

  #[tokio::test]
  async fn test_corrupt_entry_is_refetched() {
    let store = MemoryStore::new();
    let text = "さようなら。";
    store
      .set(&audio_key(text), "%%% not base64 %%%")
      .await
      .unwrap();

    let calls = AtomicUsize::new(0);
    let bytes = synthesize_with(&store, text, || {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Ok(b"replacement".to_vec()) }
    })
    .await
    .unwrap();

    assert_eq!(bytes, b"replacement");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_clear_audio_cache_only_removes_audio_keys() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    store.set(&audio_key("一"), "YQ==").await.unwrap();
    store.set(&audio_key("二"), "Yg==").await.unwrap();
    store.set("subjectId_1", "{}").await.unwrap();
    store.set("LAST_VOCABULARY", "[]").await.unwrap();

    let tts = TtsService::new(None, Arc::clone(&store));
    let removed = tts.clear_audio_cache().await.unwrap();

    assert_eq!(removed, 2);
    assert_eq!(store.get(&audio_key("一")).await.unwrap(), None);
    assert!(store.get("subjectId_1").await.unwrap().is_some());
    assert!(store.get("LAST_VOCABULARY").await.unwrap().is_some());
  }
}
