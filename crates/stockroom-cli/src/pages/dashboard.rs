//! `/app/dashboard`: welcome panel and the routes the session may open.

use crossterm::event::{KeyCode, KeyEvent};
use stockroom_core::{route::Route, session::Session};

use super::{Outcome, step};

#[derive(Debug, Default)]
pub struct DashboardPage {
  pub cursor: usize,
}

impl DashboardPage {
  /// Menu entries other than the dashboard itself.
  pub fn entries(session: &Session) -> Vec<Route> {
    Route::menu(session)
      .into_iter()
      .filter(|r| *r != Route::Dashboard)
      .collect()
  }

  pub fn greeting(session: &Session) -> String {
    match session.user() {
      Some(user) => format!("Bienvenido, {}", user.email),
      None => "Bienvenido".to_string(),
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent, session: &Session) -> Outcome {
    let entries = Self::entries(session);
    match key.code {
      KeyCode::Up | KeyCode::Char('k') => step(&mut self.cursor, entries.len(), false),
      KeyCode::Down | KeyCode::Char('j') => step(&mut self.cursor, entries.len(), true),
      KeyCode::Enter => {
        if let Some(route) = entries.get(self.cursor) {
          return Outcome::Goto(*route);
        }
      }
      _ => {}
    }
    Outcome::Stay
  }
}

#[cfg(test)]
mod tests {
  use stockroom_core::session::Role;

  use super::*;
  use crate::pages::test_support::{key, session};

  #[test]
  fn public_sees_only_stock() {
    let public = session(Role::Public);
    assert_eq!(DashboardPage::entries(&public), vec![Route::Stock]);

    let mut page = DashboardPage::default();
    page.handle_key(key(KeyCode::Down), &public);
    assert_eq!(page.handle_key(key(KeyCode::Enter), &public), Outcome::Goto(Route::Stock));
  }

  #[test]
  fn admin_walks_the_whole_menu() {
    let admin = session(Role::Admin);
    let mut page = DashboardPage::default();
    for _ in 0..10 {
      page.handle_key(key(KeyCode::Down), &admin);
    }
    assert_eq!(page.handle_key(key(KeyCode::Enter), &admin), Outcome::Goto(Route::Users));
    assert!(DashboardPage::greeting(&admin).starts_with("Bienvenido, admin@"));
  }
}
