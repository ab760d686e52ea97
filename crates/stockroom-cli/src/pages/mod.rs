//! Page controllers: one per route.
//!
//! A controller subscribes to the live queries it needs, rebuilds a
//! display-shaped view model on [`refresh`](stock::StockPage::refresh), turns
//! keys into adapter calls gated by `authorize`, and routes destructive
//! actions through a [`ConfirmPrompt`](crate::confirm::ConfirmPrompt).

pub mod dashboard;
pub mod login;
pub mod movements;
pub mod new_entry;
pub mod stock;
pub mod users;

use crossterm::event::KeyCode;
use stockroom_core::{movement::MovementType, route::Route};
use stockroom_graphql::LiveQuery;

use crate::confirm::ConfirmPrompt;

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a handled key asks of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Stay,
  Goto(Route),
  /// A one-line confirmation for the status bar.
  Notice(String),
}

// ─── Lists ───────────────────────────────────────────────────────────────────

/// The open "⋯" menu of one table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMenu {
  pub row:    usize,
  pub cursor: usize,
}

/// An entry of a row menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
  Edit,
  Activate,
  Deactivate,
  Delete,
}

impl RowAction {
  pub fn label(self) -> &'static str {
    match self {
      Self::Edit => "Editar",
      Self::Activate => "Activar",
      Self::Deactivate => "Desactivar",
      Self::Delete => "Eliminar",
    }
  }
}

/// Open the menu of `row`, or close it if it is the one already open.
pub fn toggle_row_menu(menu: &mut Option<RowMenu>, row: usize) {
  *menu = match menu {
    Some(m) if m.row == row => None,
    _ => Some(RowMenu { row, cursor: 0 }),
  };
}

/// Move `cursor` by one within `len` rows.
pub fn step(cursor: &mut usize, len: usize, down: bool) {
  if down {
    if *cursor + 1 < len {
      *cursor += 1;
    }
  } else {
    *cursor = cursor.saturating_sub(1);
  }
}

/// Keys while a row menu is open. Returns the row and the chosen action once
/// one is picked; the menu closes on pick and on `Esc`.
pub(crate) fn drive_menu(
  menu: &mut Option<RowMenu>,
  actions: &[RowAction],
  code: KeyCode,
) -> Option<(usize, RowAction)> {
  let open = menu.as_mut()?;
  match code {
    KeyCode::Up | KeyCode::Char('k') => step(&mut open.cursor, actions.len(), false),
    KeyCode::Down | KeyCode::Char('j') => step(&mut open.cursor, actions.len(), true),
    KeyCode::Enter => {
      let chosen = actions.get(open.cursor).map(|a| (open.row, *a));
      *menu = None;
      return chosen;
    }
    KeyCode::Esc | KeyCode::Char('m') => *menu = None,
    _ => {}
  }
  None
}

/// Keys while a confirmation prompt is open: `y`/`Enter` hands back the
/// action, `n`/`Esc` drops it.
pub(crate) fn answer<A>(prompt: &mut ConfirmPrompt<A>, code: KeyCode) -> Option<A> {
  match code {
    KeyCode::Char('y') | KeyCode::Char('s') | KeyCode::Enter => prompt.confirm(),
    KeyCode::Char('n') | KeyCode::Esc => {
      prompt.cancel();
      None
    }
    _ => None,
  }
}

/// Take the newest result of `live`, if any, into `rows`.
pub(crate) fn pull<R>(
  live: &mut LiveQuery<R>,
  rows: &mut R,
) -> Result<bool, stockroom_graphql::Error> {
  match live.poll() {
    None => Ok(false),
    Some(Ok(update)) => {
      *rows = update.rows;
      Ok(true)
    }
    Some(Err(e)) => Err(e),
  }
}

// ─── Display helpers ─────────────────────────────────────────────────────────

/// Colombian-peso amount without decimals, e.g. `$ 12.500`.
pub fn format_cop(amount: f64) -> String {
  let rounded = amount.round();
  let digits = format!("{:.0}", rounded.abs());
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push('.');
    }
    grouped.push(ch);
  }
  if rounded < 0.0 { format!("-$ {grouped}") } else { format!("$ {grouped}") }
}

pub fn movement_label(kind: MovementType) -> &'static str {
  match kind {
    MovementType::Inbound => "Entrada",
    MovementType::Outbound => "Salida",
    MovementType::Transfer => "Transferencia",
    MovementType::Adjustment => "Ajuste",
  }
}

/// Quantities are numeric server-side; show integers without a fraction.
pub fn format_quantity(q: f64) -> String {
  if q.fract() == 0.0 { format!("{q:.0}") } else { format!("{q}") }
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::sync::Arc;

  use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
  use stockroom_core::session::{Role, Session, SessionUser};
  use stockroom_graphql::{Backend, GraphqlClient, testing::FakeHasura};
  use uuid::Uuid;

  pub fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  pub fn backend() -> (Arc<FakeHasura>, Backend<FakeHasura>) {
    let hasura = Arc::new(FakeHasura::new());
    let backend = Backend::new(GraphqlClient::with_shared(Arc::clone(&hasura)));
    (hasura, backend)
  }

  pub fn session(role: Role) -> Session {
    Session::authenticated(SessionUser {
      id: Uuid::new_v4(),
      email: format!("{role}@example.com"),
      role,
    })
  }

  /// Let spawned live-query fetches run to completion.
  pub async fn settle() {
    for _ in 0..8 {
      tokio::task::yield_now().await;
    }
  }
}
