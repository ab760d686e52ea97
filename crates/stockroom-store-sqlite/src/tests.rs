//! Integration tests for `SqliteStorage` against in-memory and on-disk
//! databases.

use stockroom_core::{
  session::{Role, SESSION_STORAGE_KEY, SessionStore, SessionUser},
  storage::ClientStorage,
};

use uuid::Uuid;

use crate::SqliteStorage;

async fn storage() -> SqliteStorage {
  SqliteStorage::open_in_memory()
    .await
    .expect("in-memory storage")
}

fn temp_db_path(name: &str) -> std::path::PathBuf {
  std::env::temp_dir()
    .join(format!("stockroom-test-{}-{name}", std::process::id()))
    .join("client.db")
}

// ─── Key/value ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_key_returns_none() {
  let s = storage().await;
  assert_eq!(s.get_item("absent").await.unwrap(), None);
}

#[tokio::test]
async fn set_overwrites_previous_value() {
  let s = storage().await;
  s.set_item("k", "first").await.unwrap();
  s.set_item("k", "second").await.unwrap();

  assert_eq!(s.get_item("k").await.unwrap().as_deref(), Some("second"));
  assert_eq!(s.keys().await.unwrap(), vec!["k".to_string()]);
}

#[tokio::test]
async fn remove_is_idempotent() {
  let s = storage().await;
  s.set_item("k", "v").await.unwrap();
  s.remove_item("k").await.unwrap();
  s.remove_item("k").await.unwrap();
  assert_eq!(s.get_item("k").await.unwrap(), None);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn values_survive_reopen() {
  let path = temp_db_path("reopen");
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStorage::open(&path).await.unwrap();
    s.set_item("k", "kept").await.unwrap();
  }

  let s = SqliteStorage::open(&path).await.unwrap();
  assert_eq!(s.get_item("k").await.unwrap().as_deref(), Some("kept"));

  if let Some(dir) = path.parent() {
    let _ = std::fs::remove_dir_all(dir);
  }
}

// ─── Session round-trip ──────────────────────────────────────────────────────

#[tokio::test]
async fn session_store_over_sqlite() {
  let store = SessionStore::new(storage().await);
  let user = SessionUser {
    id:    Uuid::new_v4(),
    email: "ops@example.com".into(),
    role:  Role::Operator,
  };

  store.persist(&user).await.unwrap();
  let restored = store.restore().await;
  assert_eq!(restored.user(), Some(&user));

  store
    .storage()
    .set_item(SESSION_STORAGE_KEY, "][")
    .await
    .unwrap();
  let restored = store.restore().await;
  assert!(!restored.is_logged_in());
  assert_eq!(store.storage().get_item(SESSION_STORAGE_KEY).await.unwrap(), None);
}
