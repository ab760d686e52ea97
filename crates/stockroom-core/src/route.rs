//! The routing surface and its guards.
//!
//! | Path | Required roles |
//! |------|----------------|
//! | `/login` | none (public route) |
//! | `/app/dashboard` | any authenticated role |
//! | `/app/bodegas-productos` | any authenticated role |
//! | `/app/movimientos` | operator, admin |
//! | `/app/nuevo-ingreso` | operator, admin |
//! | `/app/usuarios` | admin |

use crate::session::{Access, Denial, Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
  Login,
  Dashboard,
  Stock,
  Movements,
  NewEntry,
  Users,
}

const ANY_ROLE: &[Role] = &[];
const OPERATOR_OR_ADMIN: &[Role] = &[Role::Operator, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Route {
  /// Routes that live under `/app`, in menu order.
  pub const APP: [Route; 5] = [
    Route::Dashboard,
    Route::Stock,
    Route::Movements,
    Route::NewEntry,
    Route::Users,
  ];

  pub fn path(self) -> &'static str {
    match self {
      Self::Login => "/login",
      Self::Dashboard => "/app/dashboard",
      Self::Stock => "/app/bodegas-productos",
      Self::Movements => "/app/movimientos",
      Self::NewEntry => "/app/nuevo-ingreso",
      Self::Users => "/app/usuarios",
    }
  }

  /// Menu label.
  pub fn title(self) -> &'static str {
    match self {
      Self::Login => "Iniciar sesión",
      Self::Dashboard => "Dashboard",
      Self::Stock => "Bodegas y productos",
      Self::Movements => "Movimientos",
      Self::NewEntry => "Nuevo ingreso",
      Self::Users => "Usuarios",
    }
  }

  /// `None` for public routes; otherwise the role set passed to
  /// [`crate::session::authorize`] (empty means any authenticated role).
  pub fn required_roles(self) -> Option<&'static [Role]> {
    match self {
      Self::Login => None,
      Self::Dashboard | Self::Stock => Some(ANY_ROLE),
      Self::Movements | Self::NewEntry => Some(OPERATOR_OR_ADMIN),
      Self::Users => Some(ADMIN_ONLY),
    }
  }

  /// Map a path to a route. `/app` goes to the dashboard; `/` and anything
  /// unknown go to the login page.
  pub fn parse(path: &str) -> Route {
    let path = path.trim();
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
    match path {
      "/app" => Self::Dashboard,
      p => Self::APP
        .into_iter()
        .chain([Self::Login])
        .find(|r| r.path() == p)
        .unwrap_or(Self::Login),
    }
  }

  /// Apply the route guard: unauthenticated sessions land on `/login`, and
  /// sessions lacking the required role land on the dashboard.
  pub fn guard(self, session: &Session) -> Route {
    let Some(required) = self.required_roles() else {
      return self;
    };
    match session.authorize(required) {
      Access::Allow => self,
      Access::Deny(Denial::Unauthenticated) => Self::Login,
      Access::Deny(Denial::MissingRole) => Self::Dashboard,
    }
  }

  /// Navigate to `path` on behalf of `session`.
  pub fn resolve(path: &str, session: &Session) -> Route { Self::parse(path).guard(session) }

  /// The `/app` routes the session may open.
  pub fn menu(session: &Session) -> Vec<Route> {
    Self::APP
      .into_iter()
      .filter(|r| r.guard(session) == *r)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::session::SessionUser;

  fn session(role: Role) -> Session {
    Session::authenticated(SessionUser {
      id: Uuid::new_v4(),
      email: "x@example.com".into(),
      role,
    })
  }

  #[test]
  fn parse_known_and_unknown_paths() {
    assert_eq!(Route::parse("/app/movimientos"), Route::Movements);
    assert_eq!(Route::parse("/app/usuarios/"), Route::Users);
    assert_eq!(Route::parse("/app"), Route::Dashboard);
    assert_eq!(Route::parse("/"), Route::Login);
    assert_eq!(Route::parse(""), Route::Login);
    assert_eq!(Route::parse("/nope"), Route::Login);
    assert_eq!(Route::parse("/app/nope"), Route::Login);
  }

  #[test]
  fn anonymous_is_sent_to_login() {
    let s = Session::anonymous();
    for r in Route::APP {
      assert_eq!(r.guard(&s), Route::Login);
    }
    assert_eq!(Route::Login.guard(&s), Route::Login);
  }

  #[test]
  fn missing_role_is_sent_to_dashboard() {
    let public = session(Role::Public);
    assert_eq!(Route::resolve("/app/movimientos", &public), Route::Dashboard);
    assert_eq!(Route::resolve("/app/bodegas-productos", &public), Route::Stock);

    let operator = session(Role::Operator);
    assert_eq!(Route::resolve("/app/nuevo-ingreso", &operator), Route::NewEntry);
    assert_eq!(Route::resolve("/app/usuarios", &operator), Route::Dashboard);
  }

  #[test]
  fn menu_lists_only_allowed_routes() {
    assert_eq!(
      Route::menu(&session(Role::Public)),
      vec![Route::Dashboard, Route::Stock]
    );
    assert_eq!(Route::menu(&session(Role::Admin)), Route::APP.to_vec());
    assert!(Route::menu(&Session::anonymous()).is_empty());
  }
}
