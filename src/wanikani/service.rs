//! High-level sync orchestration tying the API client to the local store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use color_eyre::Result;
use tracing::{debug, info};

use super::client::WkClient;
use super::sync;
use super::types::Subject;
use crate::cache::KvStore;

/// Vocabulary service: owns a WaniKani client and the local store, and runs
/// the sync pipeline. The UI never talks to the client or store directly.
pub struct VocabService {
  client: WkClient,
  store: Arc<dyn KvStore>,
}

impl VocabService {
  pub fn new(client: WkClient, store: Arc<dyn KvStore>) -> Self {
    Self { client, store }
  }

  /// Full sync: assignments → reconcile subjects against the cache → level
  /// filter → replace the snapshot. Any API failure aborts the whole run and
  /// leaves the previous snapshot untouched.
  pub async fn sync(&self, level_spec: &str) -> Result<Vec<Subject>> {
    let assignments = self.client.assignments().await?;
    let ids: Vec<u64> = assignments
      .iter()
      .filter(|a| a.is_started_vocabulary())
      .map(|a| a.subject_id)
      .collect();
    debug!(
      total = assignments.len(),
      vocabulary = ids.len(),
      "filtered assignments"
    );

    let merged = sync::reconcile(self.store.as_ref(), &ids, |missing| {
      let client = self.client.clone();
      async move { client.subjects_by_ids(&missing).await }
    })
    .await?;
    info!(total = merged.len(), "total vocabulary");

    let levels = sync::parse_level_spec(level_spec);
    let vocab = sync::apply_level_filter(merged, &levels);
    if !levels.is_empty() {
      debug!(?levels, remaining = vocab.len(), "level filter applied");
    }

    sync::persist_snapshot(self.store.as_ref(), &vocab).await?;
    sync::stamp_synced_at(self.store.as_ref(), Utc::now()).await;

    Ok(vocab)
  }

  /// Last persisted snapshot, without touching the network.
  pub async fn load_snapshot(&self) -> Vec<Subject> {
    sync::load_snapshot(self.store.as_ref()).await
  }

  /// Time of the last successful sync, if any.
  pub async fn last_synced_at(&self) -> Option<DateTime<Utc>> {
    sync::last_synced_at(self.store.as_ref()).await
  }
}

impl Clone for VocabService {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      store: Arc::clone(&self.store),
    }
  }
}
