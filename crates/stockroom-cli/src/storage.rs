//! Runtime choice between durable and ephemeral client storage.

use std::convert::Infallible;

use stockroom_core::storage::{ClientStorage, MemoryStorage};
use stockroom_store_sqlite::SqliteStorage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error(transparent)]
  Sqlite(#[from] stockroom_store_sqlite::Error),
}

impl From<Infallible> for StorageError {
  fn from(never: Infallible) -> Self { match never {} }
}

/// `SqliteStorage` normally, `MemoryStorage` under `--ephemeral`.
pub enum StorageBackend {
  Sqlite(SqliteStorage),
  Memory(MemoryStorage),
}

impl ClientStorage for StorageBackend {
  type Error = StorageError;

  async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
    match self {
      Self::Sqlite(s) => Ok(s.get_item(key).await?),
      Self::Memory(m) => Ok(m.get_item(key).await?),
    }
  }

  async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
    match self {
      Self::Sqlite(s) => Ok(s.set_item(key, value).await?),
      Self::Memory(m) => Ok(m.set_item(key, value).await?),
    }
  }

  async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
    match self {
      Self::Sqlite(s) => Ok(s.remove_item(key).await?),
      Self::Memory(m) => Ok(m.remove_item(key).await?),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn both_backends_behave_alike() {
    let backends = [
      StorageBackend::Memory(MemoryStorage::new()),
      StorageBackend::Sqlite(SqliteStorage::open_in_memory().await.unwrap()),
    ];
    for storage in backends {
      storage.set_item("session", "{}").await.unwrap();
      assert_eq!(storage.get_item("session").await.unwrap().as_deref(), Some("{}"));
      storage.remove_item("session").await.unwrap();
      assert_eq!(storage.get_item("session").await.unwrap(), None);
    }
  }
}
