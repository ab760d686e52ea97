//! `/app/usuarios`: account administration (admin only).

use crossterm::event::{KeyCode, KeyEvent};
use stockroom_core::{
  graphql::GraphqlTransport,
  session::{Role, Session},
  user::{NewUser, User, UserPatch},
};
use stockroom_graphql::{Backend, LiveQuery, password::hash_password};
use uuid::Uuid;

use super::{Outcome, RowAction, RowMenu, answer, drive_menu, pull, step, toggle_row_menu};
use crate::{
  confirm::ConfirmPrompt,
  form::{Choice, Field, Form, FormEvent, is_valid_email},
};

const ADMIN: &[Role] = &[Role::Admin];
const MIN_PASSWORD: usize = 4;
const MIN_NAME: usize = 2;

pub fn role_label(role: Role) -> &'static str {
  match role {
    Role::Public => "Público",
    Role::Operator => "Operador",
    Role::Admin => "Administrador",
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserVm {
  pub id:     Uuid,
  pub name:   String,
  pub email:  String,
  pub role:   &'static str,
  pub active: bool,
}

fn user_vm(u: &User) -> UserVm {
  UserVm {
    id:     u.id,
    name:   u.name.clone().unwrap_or_default(),
    email:  u.email.clone(),
    role:   role_label(u.role),
    active: u.active,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
  Activate(Uuid),
  Deactivate(Uuid),
  Delete(Uuid),
}

pub struct UserForm {
  pub form: Form,
  editing:  Option<Uuid>,
}

pub struct UsersPage {
  pub rows:    Vec<UserVm>,
  pub cursor:  usize,
  pub menu:    Option<RowMenu>,
  pub form:    Option<UserForm>,
  pub confirm: ConfirmPrompt<UserAction>,

  user_rows:  Vec<User>,
  users_live: Option<LiveQuery<Vec<User>>>,
}

impl UsersPage {
  pub fn open<T: GraphqlTransport>(backend: &Backend<T>, session: &Session) -> Self {
    Self {
      rows: Vec::new(),
      cursor: 0,
      menu: None,
      form: None,
      confirm: ConfirmPrompt::new(),
      user_rows: Vec::new(),
      users_live: session
        .can(ADMIN)
        .then(|| backend.users.watch_list(session)),
    }
  }

  pub fn refresh(&mut self) -> Result<(), stockroom_graphql::Error> {
    let users = match &mut self.users_live {
      Some(live) => pull(live, &mut self.user_rows),
      None => Ok(false),
    };
    self.rows = self.user_rows.iter().map(user_vm).collect();
    self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    users.map(|_| ())
  }

  pub fn total(&self) -> usize { self.rows.len() }

  /// Menu entries for `row`: activate or deactivate depending on its state.
  pub fn row_actions(&self, row: usize) -> Vec<RowAction> {
    let toggle = match self.rows.get(row) {
      Some(u) if u.active => RowAction::Deactivate,
      Some(_) => RowAction::Activate,
      None => return Vec::new(),
    };
    vec![RowAction::Edit, toggle, RowAction::Delete]
  }

  pub async fn handle_key<T: GraphqlTransport>(
    &mut self,
    key: KeyEvent,
    backend: &Backend<T>,
    session: &Session,
  ) -> anyhow::Result<Outcome> {
    if !session.can(ADMIN) {
      return Ok(Outcome::Stay);
    }

    if self.confirm.is_open() {
      return match answer(&mut self.confirm, key.code) {
        Some(action) => self.run(action, backend, session).await,
        None => Ok(Outcome::Stay),
      };
    }

    if let Some(open) = &mut self.form {
      return match open.form.handle_key(key) {
        FormEvent::Edited => Ok(Outcome::Stay),
        FormEvent::Cancel => {
          self.form = None;
          Ok(Outcome::Stay)
        }
        FormEvent::Submit => self.submit(backend, session).await,
      };
    }

    if let Some(menu) = self.menu {
      let actions = self.row_actions(menu.row);
      if let Some((row, action)) = drive_menu(&mut self.menu, &actions, key.code) {
        self.row_action(row, action);
      }
      return Ok(Outcome::Stay);
    }

    match key.code {
      KeyCode::Up | KeyCode::Char('k') => step(&mut self.cursor, self.rows.len(), false),
      KeyCode::Down | KeyCode::Char('j') => step(&mut self.cursor, self.rows.len(), true),
      KeyCode::Enter | KeyCode::Char('m') => {
        if self.cursor < self.rows.len() {
          toggle_row_menu(&mut self.menu, self.cursor);
        }
      }
      KeyCode::Char('n') | KeyCode::Char('+') => self.open_form(None),
      KeyCode::Char('r') => {
        if self.users_live.is_some() {
          backend.users.refetch_list(session).await?;
        }
        return Ok(Outcome::Notice("Usuarios actualizados.".into()));
      }
      _ => {}
    }
    Ok(Outcome::Stay)
  }

  fn row_action(&mut self, row: usize, action: RowAction) {
    self.menu = None;
    let Some((id, email)) = self.rows.get(row).map(|u| (u.id, u.email.clone())) else {
      return;
    };
    match action {
      RowAction::Edit => self.open_form(Some(id)),
      RowAction::Deactivate => self.confirm.open(
        "Desactivar usuario",
        format!("El usuario {email} pasará a inactivo."),
        UserAction::Deactivate(id),
      ),
      RowAction::Activate => self.confirm.open(
        "Activar usuario",
        format!("El usuario {email} pasará a activo."),
        UserAction::Activate(id),
      ),
      RowAction::Delete => self.confirm.open(
        "Eliminar usuario",
        format!("Se eliminará {email}."),
        UserAction::Delete(id),
      ),
    }
  }

  fn open_form(&mut self, id: Option<Uuid>) {
    self.menu = None;
    let existing = id.and_then(|id| self.user_rows.iter().find(|u| u.id == id));
    let roles: Vec<Choice> = Role::ALL
      .into_iter()
      .map(|r| Choice::new(role_label(r), r.as_str()))
      .collect();
    let mut form = Form::new(
      if existing.is_some() { "Editar usuario" } else { "Nuevo usuario" },
      vec![
        Field::text("name", "Nombre", existing.and_then(|u| u.name.as_deref()).unwrap_or_default()),
        Field::text("email", "Correo", existing.map(|u| u.email.as_str()).unwrap_or_default()),
        Field::password(
          "password",
          if existing.is_some() { "Contraseña (vacío = no cambiar)" } else { "Contraseña" },
        ),
        Field::select("role", "Rol", roles),
        Field::toggle("active", "Activo", existing.is_none_or(|u| u.active)),
      ],
    );
    form.select("role", Some(existing.map_or(Role::Public, |u| u.role).as_str()));
    self.form = Some(UserForm { form, editing: existing.map(|u| u.id) });
  }

  async fn submit<T: GraphqlTransport>(
    &mut self,
    backend: &Backend<T>,
    session: &Session,
  ) -> anyhow::Result<Outcome> {
    let Some(open) = &mut self.form else {
      return Ok(Outcome::Stay);
    };
    let form = &mut open.form;

    let name = form.text("name").to_string();
    let email = form.text("email").to_string();
    let password = form.text("password").to_string();
    let active = form.toggled("active");
    let role = form.selected("role").and_then(|r| Role::parse(r).ok());

    let problem = if name.chars().count() < MIN_NAME {
      Some("El nombre debe tener al menos 2 caracteres.")
    } else if !is_valid_email(&email) {
      Some("Ingresa un correo válido.")
    } else if role.is_none() {
      Some("Selecciona un rol.")
    } else if open.editing.is_none() && password.chars().count() < MIN_PASSWORD {
      Some("La contraseña es obligatoria (mínimo 4 caracteres) para crear usuario.")
    } else if !password.is_empty() && password.chars().count() < MIN_PASSWORD {
      Some("La contraseña debe tener al menos 4 caracteres.")
    } else {
      None
    };
    if let Some(message) = problem {
      form.error = Some(message.into());
      return Ok(Outcome::Stay);
    }
    let Some(role) = role else {
      return Ok(Outcome::Stay);
    };

    let notice = match open.editing {
      Some(id) => {
        let password_hash = if password.is_empty() { None } else { Some(hash_password(&password)?) };
        let patch = UserPatch {
          email: Some(email),
          name: Some(Some(name)),
          role: Some(role),
          active: Some(active),
          password_hash,
        };
        backend.users.update(session, id, &patch).await?;
        "Usuario actualizado."
      }
      None => {
        let user = NewUser {
          email,
          name: Some(name),
          role,
          active,
          password_hash: hash_password(&password)?,
        };
        backend.users.insert(session, &user).await?;
        "Usuario creado."
      }
    };

    self.form = None;
    backend.users.refetch_list(session).await?;
    Ok(Outcome::Notice(notice.into()))
  }

  async fn run<T: GraphqlTransport>(
    &mut self,
    action: UserAction,
    backend: &Backend<T>,
    session: &Session,
  ) -> anyhow::Result<Outcome> {
    let notice = match action {
      UserAction::Activate(id) => {
        backend.users.activate(session, id).await?;
        "Usuario activado."
      }
      UserAction::Deactivate(id) => {
        backend.users.deactivate(session, id).await?;
        "Usuario desactivado."
      }
      UserAction::Delete(id) => {
        backend.users.delete(session, id).await?;
        "Usuario eliminado."
      }
    };
    backend.users.refetch_list(session).await?;
    Ok(Outcome::Notice(notice.into()))
  }
}

#[cfg(test)]
mod tests {
  use stockroom_graphql::{password::PasswordPolicy, testing::FakeHasura};

  use super::*;
  use crate::pages::test_support::{backend, key, session, settle};

  async fn opened(backend: &Backend<FakeHasura>, session: &Session) -> UsersPage {
    let mut page = UsersPage::open(backend, session);
    settle().await;
    page.refresh().unwrap();
    page
  }

  #[tokio::test]
  async fn create_requires_password_and_hashes_it() {
    let (hasura, backend) = backend();
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &admin).await;
    hasura.clear_log();

    page.handle_key(key(KeyCode::Char('n')), &backend, &admin).await.unwrap();
    let form = &mut page.form.as_mut().unwrap().form;
    form.set_text("name", "Ana");
    form.set_text("email", "ana@example.com");
    form.select("role", Some("operator"));
    page.handle_key(key(KeyCode::Enter), &backend, &admin).await.unwrap();
    assert_eq!(
      page.form.as_ref().unwrap().form.error.as_deref(),
      Some("La contraseña es obligatoria (mínimo 4 caracteres) para crear usuario.")
    );
    assert!(hasura.requests().is_empty());

    page.form.as_mut().unwrap().form.set_text("password", "s3creta");
    let outcome = page.handle_key(key(KeyCode::Enter), &backend, &admin).await.unwrap();
    assert_eq!(outcome, Outcome::Notice("Usuario creado.".into()));

    let insert = hasura
      .requests()
      .into_iter()
      .find(|r| r.operation == "InsertUser")
      .unwrap();
    let stored = insert.variables["obj"]["password_hash"].as_str().unwrap().to_string();
    assert!(stored.starts_with("$argon2"));
    assert!(PasswordPolicy::strict().verify("s3creta", &stored));
    assert_eq!(insert.variables["obj"]["role"], "operator");

    page.refresh().unwrap();
    assert_eq!(page.total(), 1);
    assert_eq!(page.rows[0].role, "Operador");
  }

  #[tokio::test]
  async fn blank_password_on_edit_keeps_credential() {
    let (hasura, backend) = backend();
    let id = hasura.seed_user("ana@example.com", "$argon2id$old", "operator", true);
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &admin).await;

    page.row_action(0, RowAction::Edit);
    let form = &mut page.form.as_mut().unwrap().form;
    assert_eq!(form.selected("role"), Some("operator"));
    form.set_text("name", "Ana María");
    page.handle_key(key(KeyCode::Enter), &backend, &admin).await.unwrap();

    let update = hasura
      .requests()
      .into_iter()
      .find(|r| r.operation == "UpdateUser")
      .unwrap();
    assert!(update.variables["set"].get("password_hash").is_none());
    assert_eq!(hasura.user_row(id).unwrap()["password_hash"], "$argon2id$old");
    assert_eq!(hasura.user_row(id).unwrap()["name"], "Ana María");
  }

  #[tokio::test]
  async fn toggling_active_goes_through_prompt() {
    let (hasura, backend) = backend();
    hasura.seed_user("ana@example.com", "x", "operator", true);
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &admin).await;

    assert_eq!(page.row_actions(0), vec![
      RowAction::Edit,
      RowAction::Deactivate,
      RowAction::Delete
    ]);
    page.row_action(0, RowAction::Deactivate);
    assert_eq!(page.confirm.pending().unwrap().title, "Desactivar usuario");
    page.handle_key(key(KeyCode::Char('y')), &backend, &admin).await.unwrap();
    page.refresh().unwrap();
    assert!(!page.rows[0].active);
    assert_eq!(page.row_actions(0)[1], RowAction::Activate);
  }

  #[tokio::test]
  async fn non_admin_subscribes_to_nothing() {
    let (hasura, backend) = backend();
    let operator = session(Role::Operator);
    let mut page = opened(&backend, &operator).await;
    page.handle_key(key(KeyCode::Char('n')), &backend, &operator).await.unwrap();
    assert!(page.form.is_none());
    assert!(hasura.requests().is_empty());
  }
}
