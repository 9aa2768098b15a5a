//! Persisted cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{Result, SyncError};

/// A raw persisted entry: JSON payload plus the time it was fetched.
#[derive(Debug, Clone)]
pub struct PersistedEntry {
  pub payload: String,
  pub fetched_at: DateTime<Utc>,
}

/// Key/value store for JSON-serialized collections. Keys are namespaced by
/// entity id (e.g. `assignments_1234`); there is no schema versioning, so
/// readers must treat anything unreadable as a miss.
pub trait CacheStorage: Send + Sync {
  fn store(&self, key: &str, payload: &str, fetched_at: DateTime<Utc>) -> Result<()>;

  fn load(&self, key: &str) -> Result<Option<PersistedEntry>>;

  fn remove(&self, key: &str) -> Result<()>;
}

/// Storage that doesn't persist anything. Used when on-disk caching is
/// disabled; every read misses.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn store(&self, _key: &str, _payload: &str, _fetched_at: DateTime<Utc>) -> Result<()> {
    Ok(())
  }

  fn load(&self, _key: &str) -> Result<Option<PersistedEntry>> {
    Ok(None)
  }

  fn remove(&self, _key: &str) -> Result<()> {
    Ok(())
  }
}

/// SQLite-backed persisted cache.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the cache database at the default location, creating it if needed.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| SyncError::Config(format!("failed to create cache directory: {}", e)))?;
    }

    let conn = Connection::open(&path)?;
    Self::from_connection(conn)
  }

  /// In-memory database, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| SyncError::Config("could not determine data directory".into()))?;

    Ok(data_dir.join("cheatsheet").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    self.lock().execute_batch(
      "CREATE TABLE IF NOT EXISTS cache_entries (
          key        TEXT PRIMARY KEY,
          payload    TEXT NOT NULL,
          fetched_at TEXT NOT NULL
        );",
    )?;
    Ok(())
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
    self.conn.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl CacheStorage for SqliteStorage {
  fn store(&self, key: &str, payload: &str, fetched_at: DateTime<Utc>) -> Result<()> {
    self.lock().execute(
      "INSERT INTO cache_entries (key, payload, fetched_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET payload = ?2, fetched_at = ?3",
      params![key, payload, fetched_at.to_rfc3339()],
    )?;
    Ok(())
  }

  fn load(&self, key: &str) -> Result<Option<PersistedEntry>> {
    let row: Option<(String, String)> = self
      .lock()
      .query_row(
        "SELECT payload, fetched_at FROM cache_entries WHERE key = ?1",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    let Some((payload, fetched_at)) = row else {
      return Ok(None);
    };

    // An unparseable timestamp means the row predates us or was corrupted;
    // treat it as a miss rather than failing the read path.
    match DateTime::parse_from_rfc3339(&fetched_at) {
      Ok(ts) => Ok(Some(PersistedEntry {
        payload,
        fetched_at: ts.with_timezone(&Utc),
      })),
      Err(e) => {
        debug!(key, error = %e, "discarding cache row with malformed timestamp");
        Ok(None)
      }
    }
  }

  fn remove(&self, key: &str) -> Result<()> {
    self
      .lock()
      .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
    Ok(())
  }
}
