//! GraphQL wire types and the `GraphqlTransport` trait.
//!
//! The transport sends a single request to the Hasura endpoint and returns the
//! raw response envelope. Error interpretation (the `errors` array, missing
//! `data`) is left to the client layer.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::session::Role;

pub const ROLE_HEADER: &str = "x-hasura-role";
pub const USER_ID_HEADER: &str = "x-hasura-user-id";

// ─── Request ─────────────────────────────────────────────────────────────────

/// One GraphQL operation. Documents are fixed per adapter, hence `'static`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
  pub operation_name: &'static str,
  pub query:          &'static str,
  pub variables:      Value,
}

impl GraphqlRequest {
  pub fn new(operation_name: &'static str, query: &'static str) -> Self {
    Self {
      operation_name,
      query,
      variables: Value::Object(Default::default()),
    }
  }

  pub fn with_variables(mut self, variables: Value) -> Self {
    self.variables = variables;
    self
  }
}

/// Hasura session headers derived from the client session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HasuraHeaders {
  pub role:    Option<Role>,
  pub user_id: Option<Uuid>,
}

impl HasuraHeaders {
  /// Headers for the unauthenticated login lookup: role forced to `public`.
  pub fn public() -> Self {
    Self { role: Some(Role::Public), user_id: None }
  }

  /// Header name/value pairs to attach to the HTTP request.
  pub fn pairs(&self) -> Vec<(&'static str, String)> {
    let mut out = Vec::with_capacity(2);
    if let Some(role) = self.role {
      out.push((ROLE_HEADER, role.to_string()));
    }
    if let Some(id) = self.user_id {
      out.push((USER_ID_HEADER, id.to_string()));
    }
    out
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

/// A single entry of the GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
  pub message:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Value>,
}

impl GraphqlError {
  pub fn new(message: impl Into<String>) -> Self {
    Self { message: message.into(), extensions: None }
  }
}

/// The GraphQL response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
  #[serde(default)]
  pub data:   Option<Value>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors: Vec<GraphqlError>,
}

impl GraphqlResponse {
  pub fn data(data: Value) -> Self { Self { data: Some(data), errors: Vec::new() } }

  pub fn error(message: impl Into<String>) -> Self {
    Self { data: None, errors: vec![GraphqlError::new(message)] }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the GraphQL endpoint.
///
/// Implemented by the HTTP transport in `stockroom-graphql` and by its
/// in-memory test backend. The returned futures are `Send` so live-query
/// fetches can be spawned onto the runtime.
pub trait GraphqlTransport: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Execute `request` with `headers` and return the response envelope.
  ///
  /// Only transport-level failures are errors here; GraphQL `errors` come
  /// back inside an `Ok` envelope.
  fn execute<'a>(
    &'a self,
    request: &'a GraphqlRequest,
    headers: &'a HasuraHeaders,
  ) -> impl Future<Output = Result<GraphqlResponse, Self::Error>> + Send + 'a;
}
