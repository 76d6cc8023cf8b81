//! Cache reconciliation, level filtering, and snapshot persistence.
//!
//! The reconciler merges locally cached subjects with a single batched fetch
//! of whatever is missing. Subjects are cached forever; the snapshot is fully
//! replaced on every successful sync.

use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::{subject_key, KvStore, LAST_SYNCED_AT_KEY, SNAPSHOT_KEY};
use crate::wanikani::client::ApiError;
use crate::wanikani::types::Subject;

/// Merge cached subjects for `ids` with a batched fetch of the missing ones.
///
/// Cache reads run concurrently; an unreadable or malformed entry counts as
/// missing. `fetch_missing` is invoked at most once, with the missing ids:
/// one batched request chain instead of one request per id, which matters
/// against a rate-limited API. If it fails, the whole reconciliation fails
/// and nothing is written. Freshly fetched subjects are written back
/// per-key; a failed write is tolerated (that id will simply be fetched
/// again next sync).
///
/// The returned sequence holds cache hits first (in traversal order), then
/// the fresh records in server order.
pub async fn reconcile<S, F, Fut>(
  store: &S,
  ids: &[u64],
  fetch_missing: F,
) -> Result<Vec<Subject>, ApiError>
where
  S: KvStore + ?Sized,
  F: FnOnce(Vec<u64>) -> Fut,
  Fut: Future<Output = Result<Vec<Subject>, ApiError>>,
{
  let reads = ids.iter().map(|&id| async move {
    match store.get(&subject_key(id)).await {
      Ok(Some(raw)) => match serde_json::from_str::<Subject>(&raw) {
        Ok(subject) => (id, Some(subject)),
        Err(e) => {
          warn!(id, error = %e, "malformed cache entry, treating as miss");
          (id, None)
        }
      },
      Ok(None) => (id, None),
      Err(e) => {
        warn!(id, error = %e, "cache read failed, treating as miss");
        (id, None)
      }
    }
  });

  let mut cached = Vec::new();
  let mut missing = Vec::new();
  for (id, entry) in join_all(reads).await {
    match entry {
      Some(subject) => cached.push(subject),
      None => missing.push(id),
    }
  }
  debug!(found = cached.len(), missing = missing.len(), "cache partition");

  let mut fresh = Vec::new();
  if !missing.is_empty() {
    fresh = fetch_missing(missing).await?;
    debug!(received = fresh.len(), "received vocabulary");

    let writes = fresh.iter().map(|subject| async move {
      match serde_json::to_string(subject) {
        Ok(raw) => {
          if let Err(e) = store.set(&subject_key(subject.id), &raw).await {
            warn!(id = subject.id, error = %e, "cache write failed");
          }
        }
        Err(e) => warn!(id = subject.id, error = %e, "failed to serialize subject"),
      }
    });
    join_all(writes).await;
  }

  cached.extend(fresh);
  Ok(cached)
}

/// Parse a free-text comma-separated level list. Whitespace is trimmed, empty
/// and non-integer tokens are dropped.
pub fn parse_level_spec(spec: &str) -> Vec<u32> {
  spec
    .split(',')
    .map(str::trim)
    .filter(|token| !token.is_empty())
    .filter_map(|token| token.parse().ok())
    .collect()
}

/// Apply the level allow-list, preserving input order. An empty list applies
/// no filter at all: empty input means "all levels", not "no levels".
pub fn apply_level_filter(vocab: Vec<Subject>, levels: &[u32]) -> Vec<Subject> {
  if levels.is_empty() {
    return vocab;
  }
  vocab
    .into_iter()
    .filter(|subject| levels.contains(&subject.level))
    .collect()
}

/// Replace the persisted snapshot with the given set.
pub async fn persist_snapshot<S: KvStore + ?Sized>(
  store: &S,
  vocab: &[Subject],
) -> color_eyre::Result<()> {
  let raw = serde_json::to_string(vocab)?;
  store.set(SNAPSHOT_KEY, &raw).await
}

/// Restore the last persisted snapshot without touching the network. A
/// missing key, unreadable store, or malformed snapshot all yield an empty
/// set; startup never fails on cache state.
pub async fn load_snapshot<S: KvStore + ?Sized>(store: &S) -> Vec<Subject> {
  match store.get(SNAPSHOT_KEY).await {
    Ok(Some(raw)) => match serde_json::from_str(&raw) {
      Ok(vocab) => vocab,
      Err(e) => {
        warn!(error = %e, "malformed snapshot, starting empty");
        Vec::new()
      }
    },
    Ok(None) => Vec::new(),
    Err(e) => {
      warn!(error = %e, "snapshot read failed, starting empty");
      Vec::new()
    }
  }
}

/// Record the time of a successful sync.
pub async fn stamp_synced_at<S: KvStore + ?Sized>(store: &S, at: DateTime<Utc>) {
  if let Err(e) = store.set(LAST_SYNCED_AT_KEY, &at.to_rfc3339()).await {
    warn!(error = %e, "failed to record sync time");
  }
}

/// Time of the last successful sync, if recorded.
pub async fn last_synced_at<S: KvStore + ?Sized>(store: &S) -> Option<DateTime<Utc>> {
  let raw = store.get(LAST_SYNCED_AT_KEY).await.ok()??;
  DateTime::parse_from_rfc3339(&raw)
    .ok()
    .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use crate::wanikani::types::ContextSentence;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn subject(id: u64, level: u32) -> Subject {
    Subject {
      id,
      slug: format!("word-{}", id),
      level,
      context_sentences: vec![ContextSentence {
        ja: format!("例文{}。", id),
        en: format!("Example {}.", id),
      }],
    }
  }

  async fn seed(store: &MemoryStore, subjects: &[Subject]) {
    for s in subjects {
      store
        .set(&subject_key(s.id), &serde_json::to_string(s).unwrap())
        .await
        .unwrap();
    }
  }

  #[tokio::test]
  async fn test_reconcile_merges_cached_before_fresh() {
    let store = MemoryStore::new();
    seed(&store, &[subject(1, 1), subject(2, 1)]).await;

    let calls = AtomicUsize::new(0);
    let merged = reconcile(&store, &[1, 2, 3], |missing| {
      calls.fetch_add(1, Ordering::SeqCst);
      assert_eq!(missing, vec![3]);
      async move { Ok(vec![subject(3, 2)]) }
    })
    .await
    .unwrap();

    let ids: Vec<u64> = merged.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_reconcile_warm_cache_is_idempotent() {
    let store = MemoryStore::new();
    seed(&store, &[subject(1, 1), subject(2, 1), subject(3, 2)]).await;

    let calls = AtomicUsize::new(0);
    let first = reconcile(&store, &[1, 2, 3], |_| {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Ok(Vec::new()) }
    })
    .await
    .unwrap();
    let second = reconcile(&store, &[1, 2, 3], |_| {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Ok(Vec::new()) }
    })
    .await
    .unwrap();

    // A warm cache never reaches the network and yields a stable order
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
  }

  #[tokio::test]
  async fn test_reconcile_writes_every_fetched_subject() {
    let store = MemoryStore::new();

    reconcile(&store, &[1, 2], |missing| async move {
      Ok(missing.into_iter().map(|id| subject(id, 1)).collect())
    })
    .await
    .unwrap();

    for id in [1, 2] {
      assert!(store.get(&subject_key(id)).await.unwrap().is_some());
    }
  }

  #[tokio::test]
  async fn test_reconcile_failed_fetch_writes_nothing() {
    let store = MemoryStore::new();
    store.set(SNAPSHOT_KEY, "[]").await.unwrap();

    let result = reconcile(&store, &[9], |_| async {
      Err(ApiError::Request {
        status: 500,
        status_text: "Internal Server Error".to_string(),
      })
    })
    .await;

    assert!(result.is_err());
    assert_eq!(store.get(&subject_key(9)).await.unwrap(), None);
    // The previously persisted snapshot is untouched
    assert_eq!(store.get(SNAPSHOT_KEY).await.unwrap(), Some("[]".to_string()));
  }

  #[tokio::test]
  async fn test_reconcile_refetches_malformed_entry() {
    let store = MemoryStore::new();
    store.set(&subject_key(5), "not json").await.unwrap();

    let merged = reconcile(&store, &[5], |missing| {
      assert_eq!(missing, vec![5]);
      async move { Ok(vec![subject(5, 3)]) }
    })
    .await
    .unwrap();

    assert_eq!(merged.len(), 1);
    // The bad entry was replaced with a valid serialization
    let raw = store.get(&subject_key(5)).await.unwrap().unwrap();
    assert_eq!(serde_json::from_str::<Subject>(&raw).unwrap(), subject(5, 3));
  }

  #[test]
  fn test_parse_level_spec_plain() {
    assert_eq!(parse_level_spec("2,5"), vec![2, 5]);
  }

  #[test]
  fn test_parse_level_spec_tolerates_noise() {
    assert_eq!(parse_level_spec(" 1 , ,two, 3.5 ,4"), vec![1, 4]);
  }

  #[test]
  fn test_parse_level_spec_empty() {
    assert!(parse_level_spec("").is_empty());
    assert!(parse_level_spec(" , , ").is_empty());
  }

  #[test]
  fn test_empty_allow_list_applies_no_filter() {
    let vocab = vec![subject(1, 1), subject(2, 7)];
    assert_eq!(apply_level_filter(vocab.clone(), &[]), vocab);
  }

  #[test]
  fn test_level_filter_preserves_order() {
    let vocab = vec![subject(1, 2), subject(2, 3), subject(3, 5), subject(4, 2)];
    let filtered = apply_level_filter(vocab, &[2, 5]);
    let ids: Vec<u64> = filtered.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 3, 4]);
  }

  #[tokio::test]
  async fn test_load_snapshot_empty_store() {
    let store = MemoryStore::new();
    assert!(load_snapshot(&store).await.is_empty());
  }

  #[tokio::test]
  async fn test_load_snapshot_malformed_is_empty() {
    let store = MemoryStore::new();
    store.set(SNAPSHOT_KEY, "{broken").await.unwrap();
    assert!(load_snapshot(&store).await.is_empty());
  }

  #[tokio::test]
  async fn test_persist_snapshot_replaces_previous() {
    let store = MemoryStore::new();

    persist_snapshot(&store, &[subject(1, 1), subject(2, 1)])
      .await
      .unwrap();
    persist_snapshot(&store, &[subject(3, 4)]).await.unwrap();

    let restored = load_snapshot(&store).await;
    assert_eq!(restored, vec![subject(3, 4)]);
  }

  #[tokio::test]
  async fn test_last_synced_at_roundtrip() {
    let store = MemoryStore::new();
    assert_eq!(last_synced_at(&store).await, None);

    let at = Utc::now();
    stamp_synced_at(&store, at).await;
    assert_eq!(last_synced_at(&store).await, Some(at));
  }
}
