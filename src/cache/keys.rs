//! Store key derivations.

use sha2::{Digest, Sha256};

/// Fixed key holding the last persisted vocabulary snapshot.
pub const SNAPSHOT_KEY: &str = "LAST_VOCABULARY";

/// Fixed key holding the RFC 3339 time of the last successful sync.
pub const LAST_SYNCED_AT_KEY: &str = "LAST_SYNCED_AT";

/// Prefix for cached synthesized audio entries.
pub const AUDIO_KEY_PREFIX: &str = "ttsAudio_";

/// Cache key for a subject record.
pub fn subject_key(id: u64) -> String {
  format!("subjectId_{}", id)
}

/// Cache key for synthesized audio. The sentence text is hashed so keys stay
/// fixed-length regardless of sentence length.
pub fn audio_key(text: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(text.as_bytes());
  format!("{}{}", AUDIO_KEY_PREFIX, hex::encode(hasher.finalize()))
}
