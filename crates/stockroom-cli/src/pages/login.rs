//! `/login`.

use crossterm::event::KeyEvent;
use stockroom_core::{graphql::GraphqlTransport, session::Session, storage::ClientStorage};
use stockroom_graphql::AuthService;

use crate::form::{Field, Form, FormEvent, is_valid_email};

const MIN_PASSWORD: usize = 4;

pub struct LoginPage {
  pub form:    Form,
  /// A request is waiting to run or running.
  pub loading: bool,
  pub error:   Option<String>,
}

impl Default for LoginPage {
  fn default() -> Self { Self::new() }
}

impl LoginPage {
  pub fn new() -> Self {
    Self {
      form:    Form::new("Iniciar sesión", vec![
        Field::text("email", "Correo", ""),
        Field::password("password", "Contraseña"),
      ]),
      loading: false,
      error:   None,
    }
  }

  pub fn validate(&self) -> Result<(), &'static str> {
    let email = self.form.text("email");
    let password = self.form.text("password");
    if email.is_empty() {
      return Err("El correo es obligatorio.");
    }
    if !is_valid_email(email) {
      return Err("Ingresa un correo válido.");
    }
    if password.is_empty() {
      return Err("La contraseña es obligatoria.");
    }
    if password.chars().count() < MIN_PASSWORD {
      return Err("La contraseña debe tener al menos 4 caracteres.");
    }
    Ok(())
  }

  /// Edit the form. Returns `true` once a valid submit is requested; the
  /// page is then in the loading state until [`LoginPage::submit`] runs.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if self.loading {
      return false;
    }
    match self.form.handle_key(key) {
      FormEvent::Submit => {
        self.error = None;
        match self.validate() {
          Ok(()) => {
            self.loading = true;
            true
          }
          Err(message) => {
            self.error = Some(message.into());
            false
          }
        }
      }
      FormEvent::Cancel => {
        self.error = None;
        false
      }
      FormEvent::Edited => false,
    }
  }

  /// Run the login request. On failure the message is kept for display and
  /// `None` is returned.
  pub async fn submit<T: GraphqlTransport, S: ClientStorage>(
    &mut self,
    auth: &AuthService<T, S>,
  ) -> Option<Session> {
    let email = self.form.text("email").to_string();
    let password = self.form.text("password").to_string();
    let result = auth.login(&email, &password).await;
    self.loading = false;
    match result {
      Ok(session) => {
        self.form.set_text("password", "");
        Some(session)
      }
      Err(e) => {
        tracing::warn!(%email, error = %e, "login failed");
        self.error = Some(e.to_string());
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use crossterm::event::KeyCode;
  use stockroom_core::{
    session::{Role, SessionStore},
    storage::MemoryStorage,
  };
  use stockroom_graphql::{
    Backend,
    password::{PasswordPolicy, hash_password},
    testing::FakeHasura,
  };

  use super::*;
  use crate::pages::test_support::{backend, key};

  fn auth(backend: &Backend<FakeHasura>) -> AuthService<FakeHasura, MemoryStorage> {
    AuthService::new(
      backend.client.clone(),
      SessionStore::new(MemoryStorage::new()),
      PasswordPolicy::strict(),
    )
  }

  fn filled(email: &str, password: &str) -> LoginPage {
    let mut page = LoginPage::new();
    page.form.set_text("email", email);
    page.form.set_text("password", password);
    page
  }

  #[test]
  fn validation_messages() {
    assert_eq!(filled("", "").validate(), Err("El correo es obligatorio."));
    assert_eq!(filled("ana", "1234").validate(), Err("Ingresa un correo válido."));
    assert_eq!(
      filled("ana@example.com", "123").validate(),
      Err("La contraseña debe tener al menos 4 caracteres.")
    );
    assert_eq!(filled("ana@example.com", "1234").validate(), Ok(()));
  }

  #[test]
  fn invalid_submit_does_not_start_loading() {
    let mut page = filled("ana", "1234");
    assert!(!page.handle_key(key(KeyCode::Enter)));
    assert!(!page.loading);
    assert_eq!(page.error.as_deref(), Some("Ingresa un correo válido."));
  }

  #[tokio::test]
  async fn successful_login_returns_session() {
    let (hasura, backend) = backend();
    hasura.seed_user("ana@example.com", &hash_password("s3creta").unwrap(), "ADMIN", true);
    let auth = auth(&backend);

    let mut page = filled("ana@example.com", "s3creta");
    assert!(page.handle_key(key(KeyCode::Enter)));
    assert!(page.loading);
    assert!(!page.handle_key(key(KeyCode::Char('x'))));

    let session = page.submit(&auth).await.unwrap();
    assert_eq!(session.role(), Some(Role::Admin));
    assert!(!page.loading);
    assert_eq!(page.form.text("password"), "");
  }

  #[tokio::test]
  async fn failed_login_shows_message() {
    let (hasura, backend) = backend();
    hasura.seed_user("ana@example.com", &hash_password("s3creta").unwrap(), "operator", false);
    let auth = auth(&backend);

    let mut page = filled("ana@example.com", "s3creta");
    page.handle_key(key(KeyCode::Enter));
    assert!(page.submit(&auth).await.is_none());
    assert_eq!(page.error.as_deref(), Some("Usuario inactivo."));
    assert!(!page.loading);
  }
}
