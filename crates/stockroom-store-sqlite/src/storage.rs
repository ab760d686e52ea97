//! [`SqliteStorage`]: the SQLite implementation of [`ClientStorage`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use stockroom_core::storage::ClientStorage;

use crate::{Error, Result, schema::SCHEMA};

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Client key/value storage backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStorage {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStorage {
  /// Open (or create) the storage file at `path`, creating parent
  /// directories as needed, and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(dir) = path.parent()
      && !dir.as_os_str().is_empty()
    {
      std::fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
      })?;
    }
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let storage = Self { conn };
    storage.init_schema().await?;
    tracing::debug!(path = %path.display(), "client storage opened");
    Ok(storage)
  }

  /// Open an in-memory storage: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let storage = Self { conn };
    storage.init_schema().await?;
    Ok(storage)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Every stored key, sorted.
  #[cfg(test)]
  pub async fn keys(&self) -> Result<Vec<String>> {
    let keys = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key FROM client_storage ORDER BY key")?;
        let keys = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
      })
      .await?;
    Ok(keys)
  }
}

// ─── ClientStorage impl ──────────────────────────────────────────────────────

impl ClientStorage for SqliteStorage {
  type Error = Error;

  async fn get_item(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();
    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM client_storage WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  async fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let key = key.to_owned();
    let value = value.to_owned();
    let at = Utc::now().to_rfc3339();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO client_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (key) DO UPDATE SET value = excluded.value,
                                           updated_at = excluded.updated_at",
          rusqlite::params![key, value, at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove_item(&self, key: &str) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM client_storage WHERE key = ?1",
          rusqlite::params![key],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
