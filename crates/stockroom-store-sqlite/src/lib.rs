//! SQLite backend for Stockroom client storage.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod schema;
mod storage;

pub mod error;

pub use error::{Error, Result};
pub use storage::SqliteStorage;

#[cfg(test)]
mod tests;
