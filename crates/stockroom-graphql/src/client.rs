//! [`GraphqlClient`]: request execution, fetch policies and live queries
//! over a [`GraphqlTransport`].

use std::sync::Arc;

use serde::{Deserialize as _, de::DeserializeOwned};
use serde_json::Value;
use stockroom_core::graphql::{GraphqlRequest, GraphqlTransport, HasuraHeaders};
use uuid::Uuid;

use crate::{
  Error, Result,
  cache::{CacheKey, LiveQuery, QueryCache},
};

/// How a one-shot [`GraphqlClient::query`] uses the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
  /// Answer from the cache when possible, otherwise fetch and store.
  #[default]
  CacheFirst,
  /// Always fetch, then store.
  NetworkOnly,
  /// Always fetch and never touch the cache.
  NoCache,
}

/// GraphQL client with a shared query cache.
///
/// Cheap to clone: transport and cache are reference-counted, so every clone
/// sees the same cached results.
pub struct GraphqlClient<T> {
  transport: Arc<T>,
  cache:     QueryCache,
}

impl<T> Clone for GraphqlClient<T> {
  fn clone(&self) -> Self {
    Self {
      transport: Arc::clone(&self.transport),
      cache:     self.cache.clone(),
    }
  }
}

impl<T: GraphqlTransport> GraphqlClient<T> {
  pub fn new(transport: T) -> Self { Self::with_shared(Arc::new(transport)) }

  pub fn with_shared(transport: Arc<T>) -> Self {
    Self { transport, cache: QueryCache::new() }
  }

  pub fn transport(&self) -> &T { &self.transport }

  pub fn cache(&self) -> &QueryCache { &self.cache }

  /// Send `request` and return its `data`, turning GraphQL `errors` and a
  /// missing `data` into [`Error`]s.
  pub async fn execute(
    &self,
    request: &GraphqlRequest,
    headers: &HasuraHeaders,
  ) -> Result<Value> {
    tracing::debug!(
      operation = request.operation_name,
      role = headers.role.map(|r| r.as_str()),
      "graphql request"
    );
    let response = self
      .transport
      .execute(request, headers)
      .await
      .map_err(|e| Error::Transport(Box::new(e)))?;

    if !response.errors.is_empty() {
      return Err(Error::Graphql(response.errors));
    }
    response.data.ok_or(Error::NoData)
  }

  /// One-shot query under `policy`.
  pub async fn query(
    &self,
    request: &GraphqlRequest,
    headers: &HasuraHeaders,
    policy: FetchPolicy,
  ) -> Result<Value> {
    match policy {
      FetchPolicy::CacheFirst => {
        if let Some(data) = self.cache.get(&CacheKey::of(request)) {
          return Ok(Value::clone(&data));
        }
        self.refetch(request, headers).await
      }
      FetchPolicy::NetworkOnly => self.refetch(request, headers).await,
      FetchPolicy::NoCache => self.execute(request, headers).await,
    }
  }

  /// Run a mutation. Mutations never read or write the cache.
  pub async fn mutate(
    &self,
    request: &GraphqlRequest,
    headers: &HasuraHeaders,
  ) -> Result<Value> {
    self.execute(request, headers).await
  }

  /// Fetch `request` from the network and publish the result to the cache,
  /// and so to every live query on it. A failure is published too. Nothing
  /// is published if [`GraphqlClient::clear_store`] ran while the request
  /// was in flight.
  pub async fn refetch(
    &self,
    request: &GraphqlRequest,
    headers: &HasuraHeaders,
  ) -> Result<Value> {
    let key = CacheKey::of(request);
    let since = self.cache.generation();
    match self.execute(request, headers).await {
      Ok(data) => {
        if !self.cache.store(&key, data.clone(), since) {
          tracing::debug!(
            operation = request.operation_name,
            "cache cleared during fetch, result not stored"
          );
        }
        Ok(data)
      }
      Err(e) => {
        self.cache.fail(&key, e.to_string(), since);
        Err(e)
      }
    }
  }

  /// Start a cache-and-network live query: cached data (if any) is delivered
  /// first, and a network fetch is always spawned behind it.
  pub fn watch<R>(
    &self,
    request: GraphqlRequest,
    headers: HasuraHeaders,
    decode: fn(&Value) -> Result<R>,
  ) -> LiveQuery<R> {
    let (rx, cached) = self.cache.subscribe(&CacheKey::of(&request));

    let client = self.clone();
    tokio::spawn(async move {
      if let Err(e) = client.refetch(&request, &headers).await {
        tracing::warn!(
          operation = request.operation_name,
          error = %e,
          "live query fetch failed"
        );
      }
    });

    LiveQuery::new(rx, cached, decode)
  }

  /// Drop every cached result.
  pub fn clear_store(&self) {
    self.cache.clear();
    tracing::debug!("query cache cleared");
  }
}

// ─── Response helpers ────────────────────────────────────────────────────────

/// Decode `data[field]`.
pub(crate) fn field<R: DeserializeOwned>(data: &Value, name: &'static str) -> Result<R> {
  let value = data.get(name).ok_or(Error::MissingField(name))?;
  Ok(R::deserialize(value)?)
}

/// The row returned by a `*_one` / `*_by_pk` mutation. Hasura answers `null`
/// when the primary key matched nothing.
pub(crate) fn returned_row<'a>(data: &'a Value, name: &'static str) -> Result<&'a Value> {
  match data.get(name) {
    None => Err(Error::MissingField(name)),
    Some(Value::Null) => Err(Error::RowNotFound(name)),
    Some(row) => Ok(row),
  }
}

/// The `id` of the row returned by a mutation.
pub(crate) fn returned_id(data: &Value, name: &'static str) -> Result<Uuid> {
  let row = returned_row(data, name)?;
  let id = row.get("id").ok_or(Error::MissingField("id"))?;
  Ok(Uuid::deserialize(id)?)
}
