//! Admin-managed user accounts.
//!
//! The credential hash lives server-side. The list query never selects it;
//! only the login lookup ([`UserCredentials`]) reads it back.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:     Uuid,
  pub email:  String,
  pub name:   Option<String>,
  pub role:   Role,
  pub active: bool,
}

/// Denormalised user columns joined onto movement rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
  pub id:    Uuid,
  pub name:  Option<String>,
  pub email: String,
}

/// The row returned by the login lookup. `role` is kept raw so the caller can
/// normalise it.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
  pub id:            Uuid,
  pub email:         String,
  pub password_hash: String,
  pub role:          Option<String>,
  pub active:        bool,
}

/// Input to `insert_users_one`. `password_hash` must already be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
  pub email:         String,
  pub name:          Option<String>,
  pub role:          Role,
  pub active:        bool,
  pub password_hash: String,
}

/// Partial update (`_set`) for a user. A `None` password hash leaves the
/// stored credential unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:          Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role:          Option<Role>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub active:        Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password_hash: Option<String>,
}
