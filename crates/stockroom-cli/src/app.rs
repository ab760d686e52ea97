//! Application state machine and event dispatcher.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use stockroom_core::{
  graphql::GraphqlTransport, route::Route, session::Session, storage::ClientStorage,
};
use stockroom_graphql::{AuthService, Backend};

use crate::pages::{
  Outcome, dashboard::DashboardPage, login::LoginPage, movements::MovementsPage,
  new_entry::NewEntryPage, stock::StockPage, users::UsersPage,
};

// ─── Page ─────────────────────────────────────────────────────────────────────

/// The controller of the current route. Replacing it drops the previous
/// page's live-query subscriptions.
pub enum Page {
  Login(LoginPage),
  Dashboard(DashboardPage),
  Stock(StockPage),
  Movements(MovementsPage),
  NewEntry(NewEntryPage),
  Users(UsersPage),
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<T, S> {
  /// Entity adapters over the shared GraphQL client.
  pub backend: Backend<T>,

  /// Login, logout and session persistence.
  pub auth: AuthService<T, S>,

  /// The current session, passed by reference to every check and request.
  pub session: Session,

  /// Route the current page was opened for (after guards).
  pub route: Route,

  pub page: Page,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Path being typed after `g`; `None` while the prompt is closed.
  pub goto: Option<String>,
}

impl<T: GraphqlTransport, S: ClientStorage> App<T, S> {
  pub fn new(backend: Backend<T>, auth: AuthService<T, S>) -> Self {
    Self {
      backend,
      auth,
      session: Session::anonymous(),
      route: Route::Login,
      page: Page::Login(LoginPage::new()),
      status_msg: String::new(),
      goto: None,
    }
  }

  // ── Navigation ────────────────────────────────────────────────────────────

  /// Restore the stored session and open `path`.
  pub async fn start(&mut self, path: &str) {
    self.session = self.auth.restore().await;
    self.navigate(path);
  }

  /// Open `path` through the route guards.
  pub fn navigate(&mut self, path: &str) { self.open(Route::resolve(path, &self.session)); }

  fn open(&mut self, route: Route) {
    let route = route.guard(&self.session);
    let session = &self.session;
    let backend = &self.backend;
    self.page = match route {
      Route::Login => Page::Login(LoginPage::new()),
      Route::Dashboard => Page::Dashboard(DashboardPage::default()),
      Route::Stock => Page::Stock(StockPage::open(backend, session)),
      Route::Movements => Page::Movements(MovementsPage::open(backend, session)),
      Route::NewEntry => Page::NewEntry(NewEntryPage::open(backend, session)),
      Route::Users => Page::Users(UsersPage::open(backend, session)),
    };
    self.route = route;
    tracing::debug!(path = route.path(), "page opened");
  }

  pub async fn logout(&mut self) {
    self.auth.logout(&mut self.session).await;
    self.open(Route::Login);
    self.status_msg = "Sesión cerrada.".into();
  }

  // ── Ticks ─────────────────────────────────────────────────────────────────

  /// Pull live-query results into the current page.
  pub fn tick(&mut self) {
    let result = match &mut self.page {
      Page::Stock(p) => p.refresh(),
      Page::Movements(p) => p.refresh(),
      Page::NewEntry(p) => p.refresh(),
      Page::Users(p) => p.refresh(),
      Page::Login(_) | Page::Dashboard(_) => Ok(()),
    };
    if let Err(e) = result {
      tracing::error!(error = %e, path = self.route.path(), "live query failed");
      self.status_msg = format!("Error: {e}");
    }
  }

  /// Whether work is waiting for [`App::run_pending`]. The loop draws once
  /// before running it so the loading state is visible.
  pub fn has_pending(&self) -> bool { matches!(&self.page, Page::Login(p) if p.loading) }

  pub async fn run_pending(&mut self) {
    let Page::Login(page) = &mut self.page else {
      return;
    };
    if !page.loading {
      return;
    }
    match page.submit(&self.auth).await {
      Some(session) => {
        self.session = session;
        self.status_msg = match self.session.user() {
          Some(user) => format!("Sesión iniciada como {} ({}).", user.email, user.role),
          None => String::new(),
        };
        self.open(Route::Dashboard);
      }
      // The login form shows the reason itself.
      None => self.status_msg.clear(),
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Whether the current page wants plain keys for text entry.
  pub fn captures_input(&self) -> bool {
    match &self.page {
      Page::Login(_) | Page::NewEntry(_) => true,
      Page::Dashboard(_) => false,
      Page::Stock(p) => p.form.is_some() || p.confirm.is_open(),
      Page::Movements(p) => p.form.is_some() || p.confirm.is_open(),
      Page::Users(p) => p.form.is_some() || p.confirm.is_open(),
    }
  }

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) {
      match key.code {
        KeyCode::Char('c') => return Ok(false),
        KeyCode::Char('x') if self.session.is_logged_in() => {
          self.logout().await;
          return Ok(true);
        }
        KeyCode::Char('g') => {
          self.goto = Some("/app/".into());
          return Ok(true);
        }
        _ => {}
      }
    }

    if self.goto.is_some() {
      self.handle_goto_key(key);
      return Ok(true);
    }

    if !self.captures_input() {
      match key.code {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Char('x') if self.session.is_logged_in() => {
          self.logout().await;
          return Ok(true);
        }
        KeyCode::Char('g') => {
          self.goto = Some("/app/".into());
          return Ok(true);
        }
        KeyCode::Char(d @ '1'..='9') => {
          let index = d as usize - '1' as usize;
          if let Some(route) = Route::menu(&self.session).get(index) {
            self.open(*route);
          }
          return Ok(true);
        }
        _ => {}
      }
    }

    let result = self.dispatch(key).await;
    match result {
      Ok(Outcome::Stay) => {}
      Ok(Outcome::Goto(route)) => self.open(route),
      Ok(Outcome::Notice(message)) => {
        tracing::info!(path = self.route.path(), %message);
        self.status_msg = message;
      }
      Err(e) => {
        tracing::error!(error = %e, path = self.route.path(), "action failed");
        self.status_msg = format!("Error: {e}");
      }
    }
    Ok(true)
  }

  async fn dispatch(&mut self, key: KeyEvent) -> anyhow::Result<Outcome> {
    let (backend, session) = (&self.backend, &self.session);
    match &mut self.page {
      Page::Login(p) => {
        if p.handle_key(key) {
          self.status_msg = "Ingresando…".into();
        }
        Ok(Outcome::Stay)
      }
      Page::Dashboard(p) => Ok(p.handle_key(key, session)),
      Page::Stock(p) => p.handle_key(key, backend, session).await,
      Page::Movements(p) => p.handle_key(key, backend, session).await,
      Page::NewEntry(p) => p.handle_key(key, backend, session).await,
      Page::Users(p) => p.handle_key(key, backend, session).await,
    }
  }

  fn handle_goto_key(&mut self, key: KeyEvent) {
    let Some(path) = &mut self.goto else {
      return;
    };
    match key.code {
      KeyCode::Esc => self.goto = None,
      KeyCode::Enter => {
        let path = std::mem::take(path);
        self.goto = None;
        self.navigate(&path);
      }
      KeyCode::Backspace => {
        path.pop();
      }
      KeyCode::Char(c) => path.push(c),
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use stockroom_core::{
    session::{Role, SESSION_STORAGE_KEY, SessionStore, SessionUser},
    storage::MemoryStorage,
  };
  use stockroom_graphql::{
    GraphqlClient,
    password::{PasswordPolicy, hash_password},
    testing::FakeHasura,
  };
  use uuid::Uuid;

  use super::*;
  use crate::pages::test_support::{key, settle};

  type TestApp = App<FakeHasura, MemoryStorage>;

  fn app() -> (Arc<FakeHasura>, TestApp) {
    let hasura = Arc::new(FakeHasura::new());
    let client = GraphqlClient::with_shared(Arc::clone(&hasura));
    let auth = AuthService::new(
      client.clone(),
      SessionStore::new(MemoryStorage::new()),
      PasswordPolicy::strict(),
    );
    (hasura, App::new(Backend::new(client), auth))
  }

  async fn store_session(app: &TestApp, role: Role) {
    let user = SessionUser { id: Uuid::new_v4(), email: "ana@example.com".into(), role };
    app.auth.store().persist(&user).await.unwrap();
  }

  fn ctrl(c: char) -> KeyEvent { KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL) }

  #[tokio::test]
  async fn anonymous_start_lands_on_login() {
    let (_hasura, mut app) = app();
    app.start("/app/usuarios").await;
    assert_eq!(app.route, Route::Login);
    assert!(matches!(app.page, Page::Login(_)));
  }

  #[tokio::test]
  async fn restored_operator_is_kept_out_of_users() {
    let (_hasura, mut app) = app();
    store_session(&app, Role::Operator).await;
    app.start("/app/usuarios").await;
    assert_eq!(app.route, Route::Dashboard);

    app.navigate("/app/movimientos");
    assert_eq!(app.route, Route::Movements);
    app.navigate("/app");
    assert_eq!(app.route, Route::Dashboard);
  }

  #[tokio::test]
  async fn login_then_logout() {
    let (hasura, mut app) = app();
    hasura.seed_user("ana@example.com", &hash_password("s3creta").unwrap(), "Operator", true);
    app.start("/login").await;

    let Page::Login(page) = &mut app.page else { panic!("expected login page") };
    page.form.set_text("email", "ana@example.com");
    page.form.set_text("password", "s3creta");
    assert!(app.handle_key(key(KeyCode::Enter)).await.unwrap());
    assert!(app.has_pending());

    app.run_pending().await;
    assert_eq!(app.route, Route::Dashboard);
    assert_eq!(app.session.role(), Some(Role::Operator));
    assert!(app.status_msg.contains("ana@example.com"));

    app.navigate("/app/bodegas-productos");
    settle().await;
    app.tick();
    assert!(!app.backend.client.cache().is_empty());

    app.handle_key(ctrl('x')).await.unwrap();
    assert_eq!(app.route, Route::Login);
    assert!(!app.session.is_logged_in());
    assert!(app.backend.client.cache().is_empty());
    assert_eq!(
      app.auth.store().storage().get_item(SESSION_STORAGE_KEY).await.unwrap(),
      None
    );
  }

  #[tokio::test]
  async fn failed_login_does_not_leave_loading_status() {
    let (hasura, mut app) = app();
    hasura.seed_user("ana@example.com", &hash_password("s3creta").unwrap(), "operator", true);
    app.start("/login").await;

    let Page::Login(page) = &mut app.page else { panic!("expected login page") };
    page.form.set_text("email", "ana@example.com");
    page.form.set_text("password", "equivocada");
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert_eq!(app.status_msg, "Ingresando…");

    app.run_pending().await;
    assert!(!app.has_pending());
    assert_eq!(app.route, Route::Login);
    assert!(app.status_msg.is_empty());
    let Page::Login(page) = &app.page else { panic!("expected login page") };
    assert!(page.error.is_some());
  }

  #[tokio::test]
  async fn digits_and_goto_follow_the_menu() {
    let (_hasura, mut app) = app();
    store_session(&app, Role::Public).await;
    app.start("/app").await;

    app.handle_key(key(KeyCode::Char('2'))).await.unwrap();
    assert_eq!(app.route, Route::Stock);
    app.handle_key(key(KeyCode::Char('5'))).await.unwrap();
    assert_eq!(app.route, Route::Stock);

    app.handle_key(key(KeyCode::Char('g'))).await.unwrap();
    for c in "movimientos".chars() {
      app.handle_key(key(KeyCode::Char(c))).await.unwrap();
    }
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert_eq!(app.goto, None);
    assert_eq!(app.route, Route::Dashboard);
  }

  #[tokio::test]
  async fn failed_action_lands_in_status_bar() {
    let (hasura, mut app) = app();
    store_session(&app, Role::Admin).await;
    app.start("/app/bodegas-productos").await;
    settle().await;
    app.tick();

    hasura.fail_next("permission denied");
    let cont = app.handle_key(key(KeyCode::Char('r'))).await.unwrap();
    assert!(cont);
    assert!(app.status_msg.starts_with("Error:"));
    assert!(app.status_msg.contains("permission denied"));
  }

  #[tokio::test]
  async fn q_quits_unless_typing() {
    let (_hasura, mut app) = app();
    app.start("/login").await;
    assert!(app.handle_key(key(KeyCode::Char('q'))).await.unwrap());

    store_session(&app, Role::Admin).await;
    app.start("/app").await;
    assert!(!app.handle_key(key(KeyCode::Char('q'))).await.unwrap());
    assert!(!app.handle_key(ctrl('c')).await.unwrap());
  }
}
