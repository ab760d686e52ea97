//! GraphQL data access for Stockroom.
//!
//! Talks to a Hasura endpoint through any [`GraphqlTransport`]. Provides the
//! query cache and live queries ([`cache`]), one adapter per entity, and the
//! login/logout flow ([`auth`]).
//!
//! # Wiring
//!
//! ```rust,ignore
//! let client  = GraphqlClient::new(HttpTransport::new(http_config)?);
//! let backend = Backend::new(client.clone());
//! let auth    = AuthService::new(client, SessionStore::new(storage), policy);
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod http;
pub mod inventory;
pub mod movements;
pub mod password;
pub mod products;
pub mod users;
pub mod warehouses;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use auth::{AuthService, LoginError};
pub use cache::{LiveQuery, Origin, Update};
pub use client::{FetchPolicy, GraphqlClient};
pub use error::{Error, Result};
pub use http::{HttpConfig, HttpTransport};
use stockroom_core::graphql::GraphqlTransport;

/// Every entity adapter over one shared client (and therefore one cache).
pub struct Backend<T> {
  pub client:     GraphqlClient<T>,
  pub products:   products::ProductsAdapter<T>,
  pub warehouses: warehouses::WarehousesAdapter<T>,
  pub inventory:  inventory::InventoryAdapter<T>,
  pub movements:  movements::MovementsAdapter<T>,
  pub users:      users::UsersAdapter<T>,
}

impl<T: GraphqlTransport> Backend<T> {
  pub fn new(client: GraphqlClient<T>) -> Self {
    Self {
      products:   products::ProductsAdapter::new(client.clone()),
      warehouses: warehouses::WarehousesAdapter::new(client.clone()),
      inventory:  inventory::InventoryAdapter::new(client.clone()),
      movements:  movements::MovementsAdapter::new(client.clone()),
      users:      users::UsersAdapter::new(client.clone()),
      client,
    }
  }
}
