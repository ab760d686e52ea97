//! `/app/nuevo-ingreso`: quick movement entry by SKU.

use crossterm::event::KeyEvent;
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use stockroom_core::{
  graphql::GraphqlTransport,
  movement::{MovementType, NewMovement},
  product::Product,
  session::Session,
  warehouse::Warehouse,
};
use stockroom_graphql::{Backend, LiveQuery};

use super::{
  Outcome, format_quantity, movement_label,
  movements::{MovementDraft, selected_id, type_choices, warehouse_choices},
  pull,
};
use crate::form::{Field, Form, FormEvent, parse_number};

const MAX_SUGGESTIONS: usize = 3;

pub struct NewEntryPage {
  pub form: Form,

  product_rows:    Vec<Product>,
  warehouse_rows:  Vec<Warehouse>,
  products_live:   LiveQuery<Vec<Product>>,
  warehouses_live: LiveQuery<Vec<Warehouse>>,
}

fn blank_form() -> Form {
  let mut form = Form::new("Nuevo ingreso", vec![
    Field::text("sku", "SKU", ""),
    Field::text("quantity", "Cantidad", ""),
    Field::select("type", "Tipo", type_choices()),
    Field::select("origin", "Bodega origen", Vec::new()),
    Field::select("destination", "Bodega destino (opcional)", Vec::new()),
    Field::text("reason", "Razón", ""),
  ]);
  form.select("type", Some(&MovementType::Inbound.to_string()));
  form
}

impl NewEntryPage {
  pub fn open<T: GraphqlTransport>(backend: &Backend<T>, session: &Session) -> Self {
    Self {
      form: blank_form(),
      product_rows: Vec::new(),
      warehouse_rows: Vec::new(),
      products_live: backend.products.watch_list(session),
      warehouses_live: backend.warehouses.watch_list(session),
    }
  }

  pub fn refresh(&mut self) -> Result<(), stockroom_graphql::Error> {
    let products = pull(&mut self.products_live, &mut self.product_rows);
    let warehouses = pull(&mut self.warehouses_live, &mut self.warehouse_rows);
    self.refresh_options();
    products.and(warehouses).map(|_| ())
  }

  /// Active product with exactly this SKU, ignoring case.
  fn resolve(&self, sku: &str) -> Option<&Product> {
    self
      .product_rows
      .iter()
      .find(|p| p.active && p.sku.eq_ignore_ascii_case(sku))
  }

  /// Best fuzzy matches for `query` as `SKU · name`, best first.
  pub fn suggestions(&self, query: &str) -> Vec<String> {
    if query.is_empty() {
      return Vec::new();
    }
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &Product)> = self
      .product_rows
      .iter()
      .filter(|p| p.active)
      .filter_map(|p| {
        let haystack = format!("{} {}", p.sku, p.name);
        matcher.fuzzy_match(&haystack, query).map(|score| (score, p))
      })
      .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
      .into_iter()
      .take(MAX_SUGGESTIONS)
      .map(|(_, p)| format!("{} · {}", p.sku, p.name))
      .collect()
  }

  pub async fn handle_key<T: GraphqlTransport>(
    &mut self,
    key: KeyEvent,
    backend: &Backend<T>,
    session: &Session,
  ) -> anyhow::Result<Outcome> {
    match self.form.handle_key(key) {
      FormEvent::Edited => Ok(Outcome::Stay),
      FormEvent::Cancel => {
        self.reset(false);
        Ok(Outcome::Stay)
      }
      FormEvent::Submit => self.submit(backend, session).await,
    }
  }

  /// Clear the form. With `keep_context`, type and origin stay selected for
  /// the next entry.
  fn reset(&mut self, keep_context: bool) {
    let kind = self.form.selected("type").map(str::to_string);
    let origin = self.form.selected("origin").map(str::to_string);
    self.form = blank_form();
    self.refresh_options();
    if keep_context {
      self.form.select("type", kind.as_deref());
      self.form.select("origin", origin.as_deref());
    }
  }

  fn refresh_options(&mut self) {
    self
      .form
      .set_options("origin", warehouse_choices(&self.warehouse_rows, false));
    self
      .form
      .set_options("destination", warehouse_choices(&self.warehouse_rows, true));
  }

  fn fail(&mut self, message: impl Into<String>) -> anyhow::Result<Outcome> {
    self.form.error = Some(message.into());
    Ok(Outcome::Stay)
  }

  async fn submit<T: GraphqlTransport>(
    &mut self,
    backend: &Backend<T>,
    session: &Session,
  ) -> anyhow::Result<Outcome> {
    let sku = self.form.text("sku").to_string();
    if sku.is_empty() {
      return self.fail("Ingresa el SKU del producto.");
    }
    let Some(product) = self.resolve(&sku).cloned() else {
      let mut message = format!("No existe un producto con SKU '{sku}'.");
      let suggestions = self.suggestions(&sku);
      if !suggestions.is_empty() {
        message.push_str(&format!(" ¿Quisiste decir: {}?", suggestions.join(", ")));
      }
      return self.fail(message);
    };

    let Some(kind) = self
      .form
      .selected("type")
      .and_then(|t| t.parse::<MovementType>().ok())
    else {
      return self.fail("Selecciona el tipo de movimiento.");
    };
    let Some(origin) = selected_id(&self.form, "origin") else {
      return self.fail("Selecciona la bodega de origen.");
    };
    let destination = selected_id(&self.form, "destination");
    if kind == MovementType::Transfer && destination == Some(origin) {
      return self.fail("La bodega destino debe ser distinta a la de origen.");
    }

    let draft = MovementDraft {
      kind,
      product_id: Some(product.id),
      warehouse_id: Some(origin),
      quantity: parse_number(self.form.text("quantity")),
      reason: self.form.text("reason").to_string(),
    };
    if let Err(message) = draft.validate() {
      return self.fail(message);
    }
    let (Some(quantity), Some(user)) = (draft.quantity, session.user()) else {
      return Ok(Outcome::Stay);
    };

    let mut reason = Some(draft.reason.trim().to_string()).filter(|r| !r.is_empty());
    if kind == MovementType::Transfer
      && let Some(dest) = destination.and_then(|d| self.warehouse_rows.iter().find(|w| w.id == d))
    {
      let note = format!("Destino: {} ({})", dest.name, dest.code);
      reason = Some(match reason {
        Some(r) => format!("{r}. {note}"),
        None => note,
      });
    }

    let movement = NewMovement {
      user_id: user.id,
      product_id: product.id,
      warehouse_id: Some(origin),
      kind,
      quantity,
      reason,
      active: true,
    };
    backend.movements.insert(session, &movement).await?;
    backend.movements.refetch_list(session).await?;
    tracing::info!(sku = %product.sku, %kind, quantity, "entry recorded");

    self.reset(true);
    Ok(Outcome::Notice(format!(
      "Movimiento registrado ({}): {} × {}.",
      movement_label(kind),
      format_quantity(quantity),
      product.sku
    )))
  }
}
