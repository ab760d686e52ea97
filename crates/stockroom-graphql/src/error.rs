//! Error type for `stockroom-graphql`.

use stockroom_core::graphql::GraphqlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("graphql error: {}", join_messages(.0))]
  Graphql(Vec<GraphqlError>),

  #[error("response carried no data")]
  NoData,

  #[error("response is missing field {0:?}")]
  MissingField(&'static str),

  /// A by-primary-key mutation matched no row (Hasura returns `null`).
  #[error("{0} matched no row")]
  RowNotFound(&'static str),

  #[error("live query failed: {0}")]
  LiveQuery(String),

  #[error("live query closed")]
  LiveQueryClosed,

  #[error("decode error: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("session error: {0}")]
  Session(#[from] stockroom_core::Error),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

fn join_messages(errors: &[GraphqlError]) -> String {
  errors
    .iter()
    .map(|e| e.message.as_str())
    .collect::<Vec<_>>()
    .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
