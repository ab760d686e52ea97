//! [`HttpTransport`]: the `reqwest` implementation of [`GraphqlTransport`].

use std::time::Duration;

use reqwest::{Client, StatusCode};
use stockroom_core::graphql::{
  GraphqlRequest, GraphqlResponse, GraphqlTransport, HasuraHeaders,
};
use thiserror::Error;

pub const ADMIN_SECRET_HEADER: &str = "x-hasura-admin-secret";

/// Connection settings for the GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct HttpConfig {
  pub endpoint:     String,
  pub admin_secret: Option<String>,
  pub timeout:      Duration,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      endpoint:     "http://localhost:8081/v1/graphql".to_string(),
      admin_secret: None,
      timeout:      Duration::from_secs(30),
    }
  }
}

#[derive(Debug, Error)]
pub enum HttpError {
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("endpoint answered {0}: {1}")]
  Status(StatusCode, String),
}

/// POSTs GraphQL operations to a single Hasura endpoint.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpTransport {
  client: Client,
  config: HttpConfig,
}

impl HttpTransport {
  pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  pub fn endpoint(&self) -> &str { &self.config.endpoint }
}

impl GraphqlTransport for HttpTransport {
  type Error = HttpError;

  async fn execute(
    &self,
    request: &GraphqlRequest,
    headers: &HasuraHeaders,
  ) -> Result<GraphqlResponse, HttpError> {
    let mut req = self.client.post(&self.config.endpoint).json(request);
    for (name, value) in headers.pairs() {
      req = req.header(name, value);
    }
    if let Some(secret) = &self.config.admin_secret {
      req = req.header(ADMIN_SECRET_HEADER, secret);
    }

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(HttpError::Status(status, body));
    }
    Ok(resp.json().await?)
  }
}
