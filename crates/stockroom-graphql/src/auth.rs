//! Login, logout and session restore.

use serde_json::json;
use stockroom_core::{
  graphql::{GraphqlRequest, GraphqlTransport, HasuraHeaders},
  session::{Role, Session, SessionStore, SessionUser},
  storage::ClientStorage,
  user::UserCredentials,
};
use thiserror::Error;

use crate::{
  client::{FetchPolicy, GraphqlClient, field},
  password::PasswordPolicy,
};

const GET_USER_BY_EMAIL: &str = "query GetUserByEmail($email: String!) {
  users(where: { email: { _eq: $email } }) {
    id email password_hash role active
  }
}";

/// Why a login attempt failed. The `Display` text is shown on the login
/// screen as-is.
#[derive(Debug, Error)]
pub enum LoginError {
  #[error("Usuario no encontrado.")]
  NotFound,

  #[error("Usuario inactivo.")]
  Inactive,

  #[error("Credenciales inválidas.")]
  InvalidCredentials,

  #[error("Rol desconocido: {0}")]
  UnknownRole(String),

  #[error(transparent)]
  Request(#[from] crate::Error),
}

/// The session lifecycle over a [`GraphqlClient`] and a [`SessionStore`].
pub struct AuthService<T, S> {
  client: GraphqlClient<T>,
  store:  SessionStore<S>,
  policy: PasswordPolicy,
}

impl<T: GraphqlTransport, S: ClientStorage> AuthService<T, S> {
  pub fn new(client: GraphqlClient<T>, store: SessionStore<S>, policy: PasswordPolicy) -> Self {
    Self { client, store, policy }
  }

  pub fn store(&self) -> &SessionStore<S> { &self.store }

  /// The persisted session, or the anonymous one. Never fails.
  pub async fn restore(&self) -> Session { self.store.restore().await }

  /// Check `email`/`password` against the account table and persist the
  /// resulting identity.
  ///
  /// The lookup bypasses the cache and is sent as role `public`.
  pub async fn login(&self, email: &str, password: &str) -> Result<Session, LoginError> {
    let req = GraphqlRequest::new("GetUserByEmail", GET_USER_BY_EMAIL)
      .with_variables(json!({ "email": email }));
    let data = self
      .client
      .query(&req, &HasuraHeaders::public(), FetchPolicy::NoCache)
      .await?;

    let account = field::<Vec<UserCredentials>>(&data, "users")?
      .into_iter()
      .next()
      .ok_or(LoginError::NotFound)?;
    if !account.active {
      return Err(LoginError::Inactive);
    }
    if !self.policy.verify(password, &account.password_hash) {
      tracing::info!(email, "login rejected");
      return Err(LoginError::InvalidCredentials);
    }

    let raw_role = account.role.unwrap_or_default();
    let role = Role::parse(&raw_role).map_err(|_| LoginError::UnknownRole(raw_role))?;

    let user = SessionUser { id: account.id, email: account.email, role };
    self.store.persist(&user).await.map_err(crate::Error::from)?;
    tracing::info!(email = %user.email, %role, "logged in");
    Ok(Session::authenticated(user))
  }

  /// Forget the identity in `session` and in storage, and empty the query
  /// cache. Storage failures are logged; the in-memory session is cleared
  /// regardless.
  pub async fn logout(&self, session: &mut Session) {
    if let Some(user) = session.user() {
      tracing::info!(email = %user.email, "logged out");
    }
    *session = Session::anonymous();
    if let Err(e) = self.store.clear().await {
      tracing::warn!(error = %e, "could not clear stored session");
    }
    self.client.clear_store();
  }
}
