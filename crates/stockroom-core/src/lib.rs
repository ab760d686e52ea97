//! Core types and trait definitions for the Stockroom inventory client.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! GraphQL transport and the client storage are expressed as traits here and
//! implemented by `stockroom-graphql` and `stockroom-store-sqlite`.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod graphql;
pub mod inventory;
pub mod movement;
pub mod product;
pub mod route;
pub mod session;
pub mod storage;
pub mod user;
pub mod warehouse;

mod numeric;

pub use error::{Error, Result};
