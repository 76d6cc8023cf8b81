//! Local persistence: an opaque string key/value store plus the key
//! derivations the application uses.
//!
//! Subjects are cached forever under `subjectId_{id}`; there is no expiry or
//! invalidation policy. The snapshot key holds the last synced, filtered
//! vocabulary set as one JSON array.

mod keys;
mod store;

pub use keys::{audio_key, subject_key, AUDIO_KEY_PREFIX, LAST_SYNCED_AT_KEY, SNAPSHOT_KEY};
pub use store::{KvStore, MemoryStore, SqliteStore};
