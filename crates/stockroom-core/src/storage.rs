//! The `ClientStorage` trait: durable key/value storage on the client.
//!
//! Plays the role browser `localStorage` plays for a web client: a flat map of
//! string keys to string values that survives restarts. The session lives under
//! a single key (see [`crate::session::SESSION_STORAGE_KEY`]).

use std::{collections::HashMap, convert::Infallible, future::Future, sync::Mutex};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a client-side key/value store.
///
/// Implemented by `stockroom-store-sqlite` for durable storage and by
/// [`MemoryStorage`] for ephemeral runs and tests.
pub trait ClientStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the value stored under `key`. Returns `None` if the key is absent.
  fn get_item<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Store `value` under `key`, replacing any previous value.
  fn set_item<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove `key`. Removing an absent key is not an error.
  fn remove_item<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── In-memory implementation ────────────────────────────────────────────────

/// A non-persistent [`ClientStorage`]; everything is lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self { Self::default() }

  fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    // A poisoned map is still a valid map; keep serving it.
    self.items.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl ClientStorage for MemoryStorage {
  type Error = Infallible;

  async fn get_item(&self, key: &str) -> Result<Option<String>, Infallible> {
    Ok(self.items().get(key).cloned())
  }

  async fn set_item(&self, key: &str, value: &str) -> Result<(), Infallible> {
    self.items().insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  async fn remove_item(&self, key: &str) -> Result<(), Infallible> {
    self.items().remove(key);
    Ok(())
  }
}
