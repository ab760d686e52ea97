//! The normalised-by-request query cache and live queries.
//!
//! Every distinct request (operation, document, variables) owns one
//! `tokio::sync::watch` channel. Storing a result publishes it to every live
//! query subscribed to that request; a live query only ever sees the latest
//! value, never a backlog.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;
use sha2::{Digest, Sha256};
use stockroom_core::graphql::GraphqlRequest;
use tokio::sync::watch;

use crate::{Error, Result};

// ─── Key ─────────────────────────────────────────────────────────────────────

/// Identity of a cached result: SHA-256 over operation name, document and
/// serialised variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
  pub fn of(request: &GraphqlRequest) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(request.operation_name.as_bytes());
    hasher.update([0]);
    hasher.update(request.query.as_bytes());
    hasher.update([0]);
    hasher.update(request.variables.to_string().as_bytes());
    Self(hex::encode(hasher.finalize()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// Where the result a live query just delivered came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  Cache,
  Network,
}

/// The value held by a request's channel.
///
/// A failed fetch keeps the last good `data` and records `error`; the next
/// successful store clears it.
#[derive(Debug, Clone, Default)]
pub struct Entry {
  pub data:     Option<Arc<Value>>,
  pub error:    Option<String>,
  pub revision: u64,
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Counts [`QueryCache::clear`] calls. A fetch records the generation it
/// started in, and its result is only stored if no clear happened since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Default)]
struct Entries {
  generation: u64,
  channels:   HashMap<CacheKey, watch::Sender<Entry>>,
}

/// Shared query cache. Cloning shares the same entries.
#[derive(Clone, Default)]
pub struct QueryCache {
  entries: Arc<Mutex<Entries>>,
}

impl QueryCache {
  pub fn new() -> Self { Self::default() }

  fn entries(&self) -> MutexGuard<'_, Entries> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// The current generation, to pass to [`QueryCache::store`] and
  /// [`QueryCache::fail`] once a fetch completes.
  pub fn generation(&self) -> Generation { Generation(self.entries().generation) }

  /// Subscribe to `key`. If data is already cached the receiver is marked
  /// changed so its first read is the cached value, and the revision of that
  /// value is returned alongside.
  pub fn subscribe(&self, key: &CacheKey) -> (watch::Receiver<Entry>, Option<u64>) {
    let mut entries = self.entries();
    let sender = entries
      .channels
      .entry(key.clone())
      .or_insert_with(|| watch::channel(Entry::default()).0);

    let mut rx = sender.subscribe();
    let cached = {
      let entry = rx.borrow();
      entry.data.as_ref().map(|_| entry.revision)
    };
    if cached.is_some() {
      rx.mark_changed();
    }
    (rx, cached)
  }

  /// The cached data for `key`, if any.
  pub fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
    self
      .entries()
      .channels
      .get(key)
      .and_then(|s| s.borrow().data.clone())
  }

  /// Replace the data for `key` and notify every subscriber. Returns `false`
  /// and drops `data` when the cache was cleared after `since`.
  pub fn store(&self, key: &CacheKey, data: Value, since: Generation) -> bool {
    let data = Arc::new(data);
    let mut entries = self.entries();
    if entries.generation != since.0 {
      return false;
    }
    let sender = entries
      .channels
      .entry(key.clone())
      .or_insert_with(|| watch::channel(Entry::default()).0);
    sender.send_modify(|entry| {
      entry.data = Some(data);
      entry.error = None;
      entry.revision += 1;
    });
    true
  }

  /// Record a failed fetch for `key`, keeping whatever data is cached.
  /// Ignored when the cache was cleared after `since`.
  pub fn fail(&self, key: &CacheKey, error: String, since: Generation) {
    let entries = self.entries();
    if entries.generation != since.0 {
      return;
    }
    if let Some(sender) = entries.channels.get(key) {
      sender.send_modify(|entry| {
        entry.error = Some(error);
        entry.revision += 1;
      });
    }
  }

  /// Drop every cached result and start a new generation, so fetches already
  /// in flight cannot refill it. Live queries stay subscribed and see the
  /// next stored value.
  pub fn clear(&self) {
    let mut entries = self.entries();
    entries.generation += 1;
    for sender in entries.channels.values() {
      sender.send_modify(|entry| {
        entry.data = None;
        entry.error = None;
        entry.revision += 1;
      });
    }
  }

  /// Number of requests that currently hold data.
  pub fn len(&self) -> usize {
    self
      .entries()
      .channels
      .values()
      .filter(|s| s.borrow().data.is_some())
      .count()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Live query ──────────────────────────────────────────────────────────────

/// One delivered result of a live query.
#[derive(Debug, Clone, PartialEq)]
pub struct Update<R> {
  pub rows:   R,
  pub origin: Origin,
}

/// A subscription to one request's cache entry, decoding each value with a
/// fixed function.
///
/// Dropping it releases the subscription. A network fetch already in flight
/// still completes and fills the cache.
pub struct LiveQuery<R> {
  rx:              watch::Receiver<Entry>,
  cached_revision: Option<u64>,
  decode:          fn(&Value) -> Result<R>,
}

impl<R> LiveQuery<R> {
  pub(crate) fn new(
    rx: watch::Receiver<Entry>,
    cached_revision: Option<u64>,
    decode: fn(&Value) -> Result<R>,
  ) -> Self {
    Self { rx, cached_revision, decode }
  }

  /// Wait for the next delivered result.
  ///
  /// Skips cleared entries. A failed fetch is returned as
  /// [`Error::LiveQuery`]; the subscription stays usable afterwards.
  pub async fn next(&mut self) -> Result<Update<R>> {
    loop {
      self.rx.changed().await.map_err(|_| Error::LiveQueryClosed)?;
      if let Some(update) = self.take() {
        return update;
      }
    }
  }

  /// Non-blocking variant of [`LiveQuery::next`] for a UI tick: `None` when
  /// nothing new arrived.
  pub fn poll(&mut self) -> Option<Result<Update<R>>> {
    match self.rx.has_changed() {
      Ok(true) => self.take(),
      _ => None,
    }
  }

  /// The latest cached rows without marking anything seen.
  pub fn latest(&self) -> Option<Result<R>> {
    self.rx.borrow().data.as_deref().map(self.decode)
  }

  fn take(&mut self) -> Option<Result<Update<R>>> {
    let entry = self.rx.borrow_and_update().clone();
    if let Some(error) = entry.error {
      return Some(Err(Error::LiveQuery(error)));
    }
    let data = entry.data?;
    let origin = if self.cached_revision == Some(entry.revision) {
      Origin::Cache
    } else {
      Origin::Network
    };
    self.cached_revision = None;
    Some((self.decode)(&data).map(|rows| Update { rows, origin }))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn request(vars: Value) -> GraphqlRequest {
    GraphqlRequest::new("ProductsList", "query ProductsList { products { id } }")
      .with_variables(vars)
  }

  fn count(v: &Value) -> Result<usize> {
    Ok(v["products"].as_array().map(Vec::len).unwrap_or_default())
  }

  #[test]
  fn key_depends_on_variables() {
    let a = CacheKey::of(&request(json!({})));
    let b = CacheKey::of(&request(json!({ "active": true })));
    assert_ne!(a, b);
    assert_eq!(a, CacheKey::of(&request(json!({}))));
    assert_eq!(a.as_str().len(), 64);
  }

  #[tokio::test]
  async fn subscriber_sees_cached_value_first() {
    let cache = QueryCache::new();
    let key = CacheKey::of(&request(json!({})));
    cache.store(&key, json!({ "products": [{}, {}] }), cache.generation());

    let (rx, rev) = cache.subscribe(&key);
    let mut live = LiveQuery::new(rx, rev, count);
    let first = live.next().await.unwrap();
    assert_eq!(first, Update { rows: 2, origin: Origin::Cache });

    cache.store(&key, json!({ "products": [{}] }), cache.generation());
    let second = live.next().await.unwrap();
    assert_eq!(second, Update { rows: 1, origin: Origin::Network });
  }

  #[tokio::test]
  async fn empty_subscription_waits_for_store() {
    let cache = QueryCache::new();
    let key = CacheKey::of(&request(json!({})));
    let (rx, rev) = cache.subscribe(&key);
    let mut live = LiveQuery::new(rx, rev, count);
    assert!(live.poll().is_none());

    cache.store(&key, json!({ "products": [] }), cache.generation());
    let update = live.poll().unwrap().unwrap();
    assert_eq!(update.origin, Origin::Network);
    assert!(live.poll().is_none());
  }

  #[tokio::test]
  async fn failure_keeps_data_and_clear_empties() {
    let cache = QueryCache::new();
    let key = CacheKey::of(&request(json!({})));
    cache.store(&key, json!({ "products": [{}] }), cache.generation());
    let (rx, rev) = cache.subscribe(&key);
    let mut live = LiveQuery::new(rx, rev, count);
    live.next().await.unwrap();

    cache.fail(&key, "offline".into(), cache.generation());
    assert!(matches!(live.poll(), Some(Err(Error::LiveQuery(m))) if m == "offline"));
    assert!(cache.get(&key).is_some());

    cache.clear();
    assert!(cache.is_empty());
    assert!(live.poll().is_none());
    assert!(live.latest().is_none());
  }

  #[test]
  fn results_started_before_clear_are_dropped() {
    let cache = QueryCache::new();
    let key = CacheKey::of(&request(json!({})));
    let before = cache.generation();
    cache.clear();

    assert!(!cache.store(&key, json!({ "products": [{}] }), before));
    cache.fail(&key, "late".into(), before);
    assert!(cache.is_empty());

    assert!(cache.store(&key, json!({ "products": [{}] }), cache.generation()));
    assert_eq!(cache.len(), 1);
  }
}
