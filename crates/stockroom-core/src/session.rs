//! Session, roles and the authorization predicate.
//!
//! A [`Session`] is a plain value owned by the application and passed by
//! reference to every authorization check and data-access call. It is never
//! stored in a global. [`SessionStore`] persists the identity inside it to
//! client storage and restores it at startup.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{Error, Result, graphql::HasuraHeaders, storage::ClientStorage};

/// The single storage key holding the serialised [`SessionUser`].
pub const SESSION_STORAGE_KEY: &str = "session";

// ─── Role ────────────────────────────────────────────────────────────────────

/// A Hasura role. Parsing is case-insensitive; the canonical form is
/// lower-case.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  Public,
  Operator,
  Admin,
}

impl Role {
  pub const ALL: [Role; 3] = [Role::Public, Role::Operator, Role::Admin];

  /// Normalise a role string coming from the server (e.g. `"ADMIN"`).
  pub fn parse(raw: &str) -> Result<Self> {
    Role::from_str(raw.trim()).map_err(|_| Error::UnknownRole(raw.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

impl<'de> Deserialize<'de> for Role {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Role::parse(&raw).map_err(serde::de::Error::custom)
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The authenticated identity kept in client storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
  pub id:    Uuid,
  pub email: String,
  pub role:  Role,
}

/// The current session: at most one authenticated identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
  user: Option<SessionUser>,
}

impl Session {
  /// The unauthenticated session.
  pub fn anonymous() -> Self { Self::default() }

  pub fn authenticated(user: SessionUser) -> Self { Self { user: Some(user) } }

  pub fn user(&self) -> Option<&SessionUser> { self.user.as_ref() }

  pub fn role(&self) -> Option<Role> { self.user.as_ref().map(|u| u.role) }

  pub fn is_logged_in(&self) -> bool { self.user.is_some() }

  pub fn is_admin(&self) -> bool { self.role() == Some(Role::Admin) }

  /// Headers propagated to the GraphQL endpoint for requests made on behalf
  /// of this session.
  pub fn headers(&self) -> HasuraHeaders {
    match &self.user {
      Some(u) => HasuraHeaders { role: Some(u.role), user_id: Some(u.id) },
      None => HasuraHeaders::default(),
    }
  }

  /// Shorthand for [`authorize`]`(self, required)`.
  pub fn authorize(&self, required: &[Role]) -> Access { authorize(self, required) }

  /// Shorthand for `self.authorize(required).is_allowed()`.
  pub fn can(&self, required: &[Role]) -> bool { self.authorize(required).is_allowed() }
}

// ─── Authorization ───────────────────────────────────────────────────────────

/// Why an [`authorize`] check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
  Unauthenticated,
  MissingRole,
}

/// The outcome of an [`authorize`] check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Allow,
  Deny(Denial),
}

impl Access {
  pub fn is_allowed(self) -> bool { matches!(self, Access::Allow) }
}

/// Advisory UI gating: deny if unauthenticated; deny if `required` is
/// non-empty and the session role is not in it; otherwise allow.
///
/// Has no bearing on server-side authorization.
pub fn authorize(session: &Session, required: &[Role]) -> Access {
  let Some(role) = session.role() else {
    return Access::Deny(Denial::Unauthenticated);
  };
  if !required.is_empty() && !required.contains(&role) {
    return Access::Deny(Denial::MissingRole);
  }
  Access::Allow
}

// ─── Persistence ─────────────────────────────────────────────────────────────

/// Persists the session identity under [`SESSION_STORAGE_KEY`].
pub struct SessionStore<S> {
  storage: S,
}

impl<S: ClientStorage> SessionStore<S> {
  pub fn new(storage: S) -> Self { Self { storage } }

  pub fn storage(&self) -> &S { &self.storage }

  /// Read the persisted identity.
  ///
  /// Never fails: an unreadable store or a value that does not parse yields
  /// the anonymous session, and an unparseable value is removed.
  pub async fn restore(&self) -> Session {
    let raw = match self.storage.get_item(SESSION_STORAGE_KEY).await {
      Ok(Some(raw)) => raw,
      Ok(None) => return Session::anonymous(),
      Err(e) => {
        tracing::warn!(error = %e, "could not read stored session");
        return Session::anonymous();
      }
    };

    match serde_json::from_str::<SessionUser>(&raw) {
      Ok(user) => {
        tracing::debug!(email = %user.email, role = %user.role, "session restored");
        Session::authenticated(user)
      }
      Err(e) => {
        tracing::warn!(error = %e, "discarding unparseable stored session");
        if let Err(e) = self.storage.remove_item(SESSION_STORAGE_KEY).await {
          tracing::warn!(error = %e, "could not remove stored session");
        }
        Session::anonymous()
      }
    }
  }

  /// Write `user` to storage, replacing any previous identity.
  pub async fn persist(&self, user: &SessionUser) -> Result<()> {
    let raw = serde_json::to_string(user)?;
    self
      .storage
      .set_item(SESSION_STORAGE_KEY, &raw)
      .await
      .map_err(|e| Error::Storage(Box::new(e)))
  }

  /// Remove the stored identity.
  pub async fn clear(&self) -> Result<()> {
    self
      .storage
      .remove_item(SESSION_STORAGE_KEY)
      .await
      .map_err(|e| Error::Storage(Box::new(e)))
  }
}
