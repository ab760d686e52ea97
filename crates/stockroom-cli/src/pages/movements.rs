//! `/app/movimientos`: the movement ledger.
//!
//! Recording a movement never touches inventory quantities.

use crossterm::event::{KeyCode, KeyEvent};
use stockroom_core::{
  graphql::GraphqlTransport,
  movement::{Movement, MovementPatch, MovementType, NewMovement},
  product::Product,
  route::Route,
  session::{Role, Session},
  warehouse::Warehouse,
};
use stockroom_graphql::{Backend, LiveQuery};
use uuid::Uuid;

use super::{
  Outcome, RowAction, RowMenu, answer, drive_menu, format_quantity, movement_label, pull, step,
  toggle_row_menu,
};
use crate::{
  confirm::ConfirmPrompt,
  form::{Choice, Field, Form, FormEvent, parse_number},
};

const ADMIN: &[Role] = &[Role::Admin];
const RECORDERS: &[Role] = &[Role::Operator, Role::Admin];

// ─── Validation ──────────────────────────────────────────────────────────────

/// A movement as typed into a form, before it is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementDraft {
  pub kind:         MovementType,
  pub product_id:   Option<Uuid>,
  pub warehouse_id: Option<Uuid>,
  pub quantity:     Option<f64>,
  pub reason:       String,
}

impl MovementDraft {
  /// Whether this movement type needs a warehouse.
  pub fn needs_warehouse(kind: MovementType) -> bool {
    matches!(
      kind,
      MovementType::Inbound | MovementType::Outbound | MovementType::Adjustment
    )
  }

  /// The message to show, or `Ok` if the draft may be sent.
  pub fn validate(&self) -> Result<(), &'static str> {
    if self.product_id.is_none() {
      return Err("Selecciona un producto.");
    }
    if !self.quantity.is_some_and(|q| q >= 1.0) {
      return Err("La cantidad debe ser mayor o igual a 1.");
    }
    if Self::needs_warehouse(self.kind) && self.warehouse_id.is_none() {
      return Err("La bodega es obligatoria para este tipo de movimiento.");
    }
    if self.kind == MovementType::Adjustment && self.reason.trim().is_empty() {
      return Err("La razón es obligatoria para los Ajustes.");
    }
    Ok(())
  }

  fn reason(&self) -> Option<String> {
    Some(self.reason.trim().to_string()).filter(|r| !r.is_empty())
  }
}

// ─── View model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct MovementVm {
  pub id:         Uuid,
  pub created_at: String,
  pub kind:       MovementType,
  pub label:      &'static str,
  pub product:    String,
  pub sku:        String,
  pub warehouse:  String,
  pub quantity:   String,
  pub reason:     String,
  pub user:       String,
  pub active:     bool,
}

fn movement_vm(m: &Movement) -> MovementVm {
  MovementVm {
    id:         m.id,
    created_at: m.created_at.format("%Y-%m-%d %H:%M").to_string(),
    kind:       m.kind,
    label:      movement_label(m.kind),
    product:    m.product.as_ref().map_or_else(|| "—".into(), |p| p.name.clone()),
    sku:        m.product.as_ref().map(|p| p.sku.clone()).unwrap_or_default(),
    warehouse:  m.warehouse.as_ref().map_or_else(|| "—".into(), |w| w.name.clone()),
    quantity:   format_quantity(m.quantity),
    reason:     m.reason.clone().unwrap_or_default(),
    user:       m
      .user
      .as_ref()
      .map(|u| u.name.clone().unwrap_or_else(|| u.email.clone()))
      .unwrap_or_default(),
    active:     m.active,
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Kpis {
  pub total:    usize,
  pub inbound:  usize,
  pub outbound: usize,
  pub transfer: usize,
}

impl Kpis {
  fn of(rows: &[Movement]) -> Self {
    let count = |kind: MovementType| rows.iter().filter(|m| m.kind == kind).count();
    Self {
      total:    rows.len(),
      inbound:  count(MovementType::Inbound),
      outbound: count(MovementType::Outbound),
      transfer: count(MovementType::Transfer),
    }
  }
}

// ─── Page ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementAction {
  Deactivate(Uuid),
  Delete(Uuid),
}

pub struct MovementForm {
  pub form: Form,
  /// `None` when creating.
  editing:  Option<Uuid>,
}

pub struct MovementsPage {
  pub rows:    Vec<MovementVm>,
  pub kpis:    Kpis,
  pub cursor:  usize,
  pub menu:    Option<RowMenu>,
  pub form:    Option<MovementForm>,
  pub confirm: ConfirmPrompt<MovementAction>,

  movement_rows:   Vec<Movement>,
  product_rows:    Vec<Product>,
  warehouse_rows:  Vec<Warehouse>,
  movements_live:  LiveQuery<Vec<Movement>>,
  products_live:   LiveQuery<Vec<Product>>,
  warehouses_live: LiveQuery<Vec<Warehouse>>,
}

pub(crate) fn type_choices() -> Vec<Choice> {
  MovementType::ALL
    .into_iter()
    .map(|t| Choice::new(movement_label(t), t.to_string()))
    .collect()
}

pub(crate) fn warehouse_choices(rows: &[Warehouse], optional: bool) -> Vec<Choice> {
  let none = optional.then(|| Choice::new("— Sin bodega —", ""));
  none
    .into_iter()
    .chain(
      rows
        .iter()
        .filter(|w| w.active)
        .map(|w| Choice::new(format!("{} ({})", w.name, w.code), w.id.to_string())),
    )
    .collect()
}

/// Active products, plus `keep` even when inactive so an edited movement
/// still shows the product it was recorded against.
fn product_choices(rows: &[Product], keep: Option<Uuid>) -> Vec<Choice> {
  rows
    .iter()
    .filter(|p| p.active || Some(p.id) == keep)
    .map(|p| Choice::new(format!("{} ({})", p.name, p.sku), p.id.to_string()))
    .collect()
}

pub(crate) fn selected_id(form: &Form, key: &str) -> Option<Uuid> {
  form.selected(key).and_then(|v| v.parse().ok())
}

impl MovementsPage {
  pub fn open<T: GraphqlTransport>(backend: &Backend<T>, session: &Session) -> Self {
    Self {
      rows: Vec::new(),
      kpis: Kpis::default(),
      cursor: 0,
      menu: None,
      form: None,
      confirm: ConfirmPrompt::new(),
      movement_rows: Vec::new(),
      product_rows: Vec::new(),
      warehouse_rows: Vec::new(),
      movements_live: backend.movements.watch_list(session),
      products_live: backend.products.watch_list(session),
      warehouses_live: backend.warehouses.watch_list(session),
    }
  }

  pub fn refresh(&mut self) -> Result<(), stockroom_graphql::Error> {
    let movements = pull(&mut self.movements_live, &mut self.movement_rows);
    let products = pull(&mut self.products_live, &mut self.product_rows);
    let warehouses = pull(&mut self.warehouses_live, &mut self.warehouse_rows);

    self.rows = self.movement_rows.iter().map(movement_vm).collect();
    self.kpis = Kpis::of(&self.movement_rows);
    self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    if let Some(open) = &mut self.form {
      let keep = open
        .editing
        .and_then(|id| self.movement_rows.iter().find(|m| m.id == id))
        .map(|m| m.product_id);
      open
        .form
        .set_options("product_id", product_choices(&self.product_rows, keep));
      open
        .form
        .set_options("warehouse_id", warehouse_choices(&self.warehouse_rows, true));
    }

    movements.and(products).and(warehouses).map(|_| ())
  }

  pub fn row_actions(&self, session: &Session) -> Vec<RowAction> {
    if session.can(ADMIN) {
      vec![RowAction::Edit, RowAction::Deactivate, RowAction::Delete]
    } else {
      Vec::new()
    }
  }

  pub async fn handle_key<T: GraphqlTransport>(
    &mut self,
    key: KeyEvent,
    backend: &Backend<T>,
    session: &Session,
  ) -> anyhow::Result<Outcome> {
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

    if self.menu.is_some() {
      let actions = self.row_actions(session);
      if let Some((row, action)) = drive_menu(&mut self.menu, &actions, key.code) {
        self.row_action(row, action, session);
      }
      return Ok(Outcome::Stay);
    }

    match key.code {
      KeyCode::Up | KeyCode::Char('k') => step(&mut self.cursor, self.rows.len(), false),
      KeyCode::Down | KeyCode::Char('j') => step(&mut self.cursor, self.rows.len(), true),
      KeyCode::Enter | KeyCode::Char('m') => {
        if self.cursor < self.rows.len() && session.can(ADMIN) {
          toggle_row_menu(&mut self.menu, self.cursor);
        }
      }
      KeyCode::Char('n') | KeyCode::Char('+') => self.open_create(session),
      KeyCode::Char('i') => return Ok(Outcome::Goto(Route::NewEntry)),
      KeyCode::Char('r') => {
        backend.movements.refetch_list(session).await?;
        return Ok(Outcome::Notice("Movimientos actualizados.".into()));
      }
      _ => {}
    }
    Ok(Outcome::Stay)
  }

  fn build_form(&self, title: &str, keep_product: Option<Uuid>) -> Form {
    Form::new(title, vec![
      Field::select("type", "Tipo", type_choices()),
      Field::select("product_id", "Producto", product_choices(&self.product_rows, keep_product)),
      Field::select(
        "warehouse_id",
        "Bodega",
        warehouse_choices(&self.warehouse_rows, true),
      ),
      Field::text("quantity", "Cantidad", "1"),
      Field::text("reason", "Razón", ""),
    ])
  }

  pub fn open_create(&mut self, session: &Session) {
    if !session.can(RECORDERS) {
      return;
    }
    self.menu = None;
    let mut form = self.build_form("Nuevo movimiento", None);
    form.select("type", Some(&MovementType::Inbound.to_string()));
    self.form = Some(MovementForm { form, editing: None });
  }

  fn row_action(&mut self, row: usize, action: RowAction, session: &Session) {
    self.menu = None;
    if !session.can(ADMIN) {
      return;
    }
    let Some(id) = self.rows.get(row).map(|r| r.id) else {
      return;
    };
    match action {
      RowAction::Edit => self.open_edit(id),
      RowAction::Deactivate => self.confirm.open(
        "Desactivar movimiento",
        "Se mantendrá para trazabilidad (active=false).",
        MovementAction::Deactivate(id),
      ),
      RowAction::Delete => self.confirm.open(
        "Eliminar movimiento",
        "Eliminar puede afectar la trazabilidad. ¿Seguro?",
        MovementAction::Delete(id),
      ),
      RowAction::Activate => {}
    }
  }

  fn open_edit(&mut self, id: Uuid) {
    let Some(row) = self.movement_rows.iter().find(|m| m.id == id) else {
      return;
    };
    let mut form = self.build_form("Editar movimiento", Some(row.product_id));
    form.select("type", Some(&row.kind.to_string()));
    form.select("product_id", Some(&row.product_id.to_string()));
    form.select(
      "warehouse_id",
      Some(&row.warehouse_id.map(|w| w.to_string()).unwrap_or_default()),
    );
    form.set_text("quantity", format_quantity(row.quantity));
    form.set_text("reason", row.reason.clone().unwrap_or_default());
    self.form = Some(MovementForm { form, editing: Some(id) });
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

    let Some(kind) = form.selected("type").and_then(|t| t.parse::<MovementType>().ok()) else {
      form.error = Some("Selecciona el tipo de movimiento.".into());
      return Ok(Outcome::Stay);
    };
    let draft = MovementDraft {
      kind,
      product_id: selected_id(form, "product_id"),
      warehouse_id: selected_id(form, "warehouse_id"),
      quantity: parse_number(form.text("quantity")),
      reason: form.text("reason").to_string(),
    };
    if let Err(message) = draft.validate() {
      form.error = Some(message.into());
      return Ok(Outcome::Stay);
    }
    let (Some(product_id), Some(quantity)) = (draft.product_id, draft.quantity) else {
      return Ok(Outcome::Stay);
    };

    let notice = match open.editing {
      None => {
        let Some(user) = session.user() else {
          return Ok(Outcome::Stay);
        };
        let movement = NewMovement {
          user_id: user.id,
          product_id,
          warehouse_id: draft.warehouse_id,
          kind,
          quantity,
          reason: draft.reason(),
          active: true,
        };
        backend.movements.insert(session, &movement).await?;
        "Movimiento registrado."
      }
      Some(id) => {
        if !session.can(ADMIN) {
          return Ok(Outcome::Stay);
        }
        let patch = MovementPatch {
          kind: Some(kind),
          product_id: Some(product_id),
          warehouse_id: Some(draft.warehouse_id),
          quantity: Some(quantity),
          reason: Some(draft.reason()),
          active: None,
        };
        backend.movements.update(session, id, &patch).await?;
        "Movimiento actualizado."
      }
    };

    self.form = None;
    backend.movements.refetch_list(session).await?;
    Ok(Outcome::Notice(notice.into()))
  }

  async fn run<T: GraphqlTransport>(
    &mut self,
    action: MovementAction,
    backend: &Backend<T>,
    session: &Session,
  ) -> anyhow::Result<Outcome> {
    if !session.can(ADMIN) {
      return Ok(Outcome::Stay);
    }
    let notice = match action {
      MovementAction::Deactivate(id) => {
        backend.movements.deactivate(session, id).await?;
        "Movimiento desactivado."
      }
      MovementAction::Delete(id) => {
        backend.movements.delete(session, id).await?;
        "Movimiento eliminado."
      }
    };
    backend.movements.refetch_list(session).await?;
    Ok(Outcome::Notice(notice.into()))
  }
}
