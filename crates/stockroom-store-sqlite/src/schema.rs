//! SQL schema for the Stockroom client storage file.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Flat key/value map, the equivalent of browser localStorage.
CREATE TABLE IF NOT EXISTS client_storage (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL   -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";
