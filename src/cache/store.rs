//! Key/value store trait and backends.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::Mutex;

/// Async key/value persistence.
///
/// Values are caller-serialized JSON strings; the store itself is opaque
/// string storage and never inspects them.
#[async_trait]
pub trait KvStore: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<String>>;

  async fn set(&self, key: &str, value: &str) -> Result<()>;

  async fn remove(&self, key: &str) -> Result<()>;

  async fn list_keys(&self) -> Result<Vec<String>>;
}

/// SQLite-based store implementation.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create data directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open store at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open an in-memory store. Used by tests.
  #[allow(dead_code)]
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory store: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("reibun").join("store.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run store migrations: {}", e))?;

    Ok(())
  }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[async_trait]
impl KvStore for SqliteStore {
  async fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT value FROM kv WHERE key = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let value: Option<String> = stmt.query_row(params![key], |row| row.get(0)).ok();

    Ok(value)
  }

  async fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv (key, value, cached_at) VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to store entry: {}", e))?;

    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM kv WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove entry: {}", e))?;

    Ok(())
  }

  async fn list_keys(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT key FROM kv")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let keys: Vec<String> = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list keys: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(keys)
  }
}

/// In-memory store. Used by tests and as a fallback when the on-disk store
/// cannot be opened, so the application still starts with an empty state.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KvStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<Option<String>> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.get(key).cloned())
  }

  async fn set(&self, key: &str, value: &str) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.remove(key);
    Ok(())
  }

  async fn list_keys(&self) -> Result<Vec<String>> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.keys().cloned().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_memory_store_roundtrip() {
    let store = MemoryStore::new();

    assert_eq!(store.get("a").await.unwrap(), None);

    store.set("a", "1").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));

    store.set("a", "2").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), Some("2".to_string()));

    store.remove("a").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_memory_store_list_keys() {
    let store = MemoryStore::new();
    store.set("a", "1").await.unwrap();
    store.set("b", "2").await.unwrap();

    let mut keys = store.list_keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
  }

  #[tokio::test]
  async fn test_sqlite_store_roundtrip() {
    let store = SqliteStore::open_in_memory().unwrap();

    assert_eq!(store.get("a").await.unwrap(), None);

    store.set("a", "1").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));

    // Overwrite replaces the previous value
    store.set("a", "2").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), Some("2".to_string()));

    store.remove("a").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_sqlite_store_list_keys() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set("subjectId_1", "{}").await.unwrap();
    store.set("subjectId_2", "{}").await.unwrap();
    store.set("other", "x").await.unwrap();

    let mut keys = store.list_keys().await.unwrap();
    keys.sort();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&"subjectId_1".to_string()));
  }

  #[tokio::test]
  async fn test_remove_missing_key_is_ok() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.remove("nope").await.unwrap();
  }
}
