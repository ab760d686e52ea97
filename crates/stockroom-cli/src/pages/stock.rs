//! `/app/bodegas-productos`: warehouses, products and raw inventory rows.

use crossterm::event::{KeyCode, KeyEvent};
use stockroom_core::{
  graphql::GraphqlTransport,
  inventory::{InventoryKey, InventoryRow},
  product::{NewProduct, Product, ProductPatch},
  session::{Role, Session},
  warehouse::{NewWarehouse, Warehouse, WarehousePatch},
};
use stockroom_graphql::{Backend, LiveQuery};
use uuid::Uuid;

use super::{
  Outcome, RowAction, RowMenu, answer, drive_menu, format_cop, format_quantity, pull, step,
  toggle_row_menu,
};
use crate::{
  confirm::ConfirmPrompt,
  form::{Choice, Field, Form, FormEvent, parse_number},
};

const ADMIN: &[Role] = &[Role::Admin];
const INVENTORY_VIEWERS: &[Role] = &[Role::Operator, Role::Admin];
const RECOMMEND_DEACTIVATE: &str =
  "Se recomienda desactivar para conservar trazabilidad. ¿Eliminar de todas formas?";

// ─── View models ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  Warehouses,
  Products,
  Inventory,
}

impl Tab {
  pub fn title(self) -> &'static str {
    match self {
      Self::Warehouses => "Bodegas",
      Self::Products => "Productos",
      Self::Inventory => "Inventario",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseVm {
  pub id:      Uuid,
  pub name:    String,
  pub code:    String,
  pub address: String,
  /// "Activo" / "Inactivo".
  pub status:  &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductVm {
  pub id:          Uuid,
  pub name:        String,
  pub sku:         String,
  pub description: String,
  pub unit:        String,
  /// Formatted as pesos.
  pub price:       String,
  pub active:      bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryVm {
  pub key:            InventoryKey,
  pub product:        String,
  pub sku:            String,
  pub warehouse:      String,
  pub warehouse_code: String,
  pub quantity:       String,
}

fn warehouse_vm(w: &Warehouse) -> WarehouseVm {
  WarehouseVm {
    id:      w.id,
    name:    w.name.clone(),
    code:    w.code.clone(),
    address: w.address.clone().unwrap_or_default(),
    status:  if w.active { "Activo" } else { "Inactivo" },
  }
}

fn product_vm(p: &Product) -> ProductVm {
  ProductVm {
    id:          p.id,
    name:        p.name.clone(),
    sku:         p.sku.clone(),
    description: p.description.clone().unwrap_or_default(),
    unit:        p.unit.clone(),
    price:       format_cop(p.price),
    active:      p.active,
  }
}

fn inventory_vm(row: &InventoryRow) -> InventoryVm {
  let (product, sku) = row
    .product
    .as_ref()
    .map(|p| (p.name.clone(), p.sku.clone()))
    .unwrap_or_else(|| ("—".into(), String::new()));
  let (warehouse, warehouse_code) = row
    .warehouse
    .as_ref()
    .map(|w| (w.name.clone(), w.code.clone()))
    .unwrap_or_else(|| ("—".into(), String::new()));
  InventoryVm {
    key: row.key(),
    product,
    sku,
    warehouse,
    warehouse_code,
    quantity: format_quantity(row.quantity),
  }
}

// ─── Actions ─────────────────────────────────────────────────────────────────

/// What runs once the prompt is confirmed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StockAction {
  DeactivateWarehouse(Uuid),
  DeleteWarehouse(Uuid),
  DeactivateProduct(Uuid),
  DeleteProduct(Uuid),
  /// Inventory edits are confirmed first and only then show their form.
  OpenInventoryForm(Option<InventoryKey>),
  DeleteInventory(InventoryKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
  NewWarehouse,
  Warehouse(Uuid),
  NewProduct,
  Product(Uuid),
  NewInventory,
  Inventory(InventoryKey),
}

pub struct StockForm {
  pub form: Form,
  target:   Target,
}

// ─── Page ────────────────────────────────────────────────────────────────────

pub struct StockPage {
  pub tab:        Tab,
  pub warehouses: Vec<WarehouseVm>,
  pub products:   Vec<ProductVm>,
  pub inventory:  Vec<InventoryVm>,
  pub cursor:     usize,
  pub menu:       Option<RowMenu>,
  pub form:       Option<StockForm>,
  pub confirm:    ConfirmPrompt<StockAction>,

  warehouse_rows:  Vec<Warehouse>,
  product_rows:    Vec<Product>,
  inventory_rows:  Vec<InventoryRow>,
  warehouses_live: LiveQuery<Vec<Warehouse>>,
  products_live:   LiveQuery<Vec<Product>>,
  /// Only subscribed for roles that can see the inventory tab.
  inventory_live:  Option<LiveQuery<Vec<InventoryRow>>>,
}

impl StockPage {
  pub fn open<T: GraphqlTransport>(backend: &Backend<T>, session: &Session) -> Self {
    let inventory_live = session
      .can(INVENTORY_VIEWERS)
      .then(|| backend.inventory.watch_list(session));
    Self {
      tab: Tab::Warehouses,
      warehouses: Vec::new(),
      products: Vec::new(),
      inventory: Vec::new(),
      cursor: 0,
      menu: None,
      form: None,
      confirm: ConfirmPrompt::new(),
      warehouse_rows: Vec::new(),
      product_rows: Vec::new(),
      inventory_rows: Vec::new(),
      warehouses_live: backend.warehouses.watch_list(session),
      products_live: backend.products.watch_list(session),
      inventory_live,
    }
  }

  /// Pull whatever the live queries delivered and rebuild the view models.
  pub fn refresh(&mut self) -> Result<(), stockroom_graphql::Error> {
    let warehouses = pull(&mut self.warehouses_live, &mut self.warehouse_rows);
    let products = pull(&mut self.products_live, &mut self.product_rows);
    let inventory = match &mut self.inventory_live {
      Some(live) => pull(live, &mut self.inventory_rows),
      None => Ok(false),
    };
    self.rebuild();
    warehouses.and(products).and(inventory).map(|_| ())
  }

  fn rebuild(&mut self) {
    self.warehouses = self.warehouse_rows.iter().map(warehouse_vm).collect();
    self.products = self.product_rows.iter().map(product_vm).collect();
    self.inventory = self.inventory_rows.iter().map(inventory_vm).collect();
    self.cursor = self.cursor.min(self.rows().saturating_sub(1));

    let products = self.product_choices();
    let warehouses = self.warehouse_choices();
    if let Some(StockForm { form, target: Target::NewInventory }) = &mut self.form {
      form.set_options("product_id", products);
      form.set_options("warehouse_id", warehouses);
    }
  }

  pub fn tabs(&self, session: &Session) -> Vec<Tab> {
    let mut tabs = vec![Tab::Warehouses, Tab::Products];
    if session.can(INVENTORY_VIEWERS) {
      tabs.push(Tab::Inventory);
    }
    tabs
  }

  /// Rows in the current tab.
  pub fn rows(&self) -> usize {
    match self.tab {
      Tab::Warehouses => self.warehouses.len(),
      Tab::Products => self.products.len(),
      Tab::Inventory => self.inventory.len(),
    }
  }

  pub fn primary_label(&self, session: &Session) -> &'static str {
    match self.tab {
      Tab::Warehouses => "+ Nueva Bodega",
      Tab::Products => "+ Nuevo Producto",
      Tab::Inventory if session.can(ADMIN) => "+ Nuevo (inventario)",
      Tab::Inventory => "+ Nuevo (bloqueado)",
    }
  }

  /// Entries of a row menu in the current tab.
  pub fn row_actions(&self, session: &Session) -> Vec<RowAction> {
    let admin = session.can(ADMIN);
    match self.tab {
      Tab::Warehouses | Tab::Products if admin => {
        vec![RowAction::Edit, RowAction::Deactivate, RowAction::Delete]
      }
      Tab::Warehouses | Tab::Products => vec![RowAction::Edit],
      Tab::Inventory if admin => vec![RowAction::Edit, RowAction::Delete],
      Tab::Inventory => Vec::new(),
    }
  }

  pub fn switch_tab(&mut self, tab: Tab, session: &Session) {
    if !self.tabs(session).contains(&tab) {
      return;
    }
    self.tab = tab;
    self.cursor = 0;
    self.menu = None;
  }

  fn cycle_tab(&mut self, session: &Session, forward: bool) {
    let tabs = self.tabs(session);
    let at = tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
    let next = if forward { (at + 1) % tabs.len() } else { (at + tabs.len() - 1) % tabs.len() };
    self.switch_tab(tabs[next], session);
  }

  fn product_choices(&self) -> Vec<Choice> {
    self
      .product_rows
      .iter()
      .map(|p| Choice::new(format!("{} ({})", p.name, p.sku), p.id.to_string()))
      .collect()
  }

  fn warehouse_choices(&self) -> Vec<Choice> {
    self
      .warehouse_rows
      .iter()
      .map(|w| Choice::new(format!("{} ({})", w.name, w.code), w.id.to_string()))
      .collect()
  }

  // ── Keys ──────────────────────────────────────────────────────────────────

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

    let len = self.rows();
    match key.code {
      KeyCode::Up | KeyCode::Char('k') => step(&mut self.cursor, len, false),
      KeyCode::Down | KeyCode::Char('j') => step(&mut self.cursor, len, true),
      KeyCode::Tab | KeyCode::Right => self.cycle_tab(session, true),
      KeyCode::BackTab | KeyCode::Left => self.cycle_tab(session, false),
      KeyCode::Enter | KeyCode::Char('m') => {
        if self.cursor < self.rows() && !self.row_actions(session).is_empty() {
          toggle_row_menu(&mut self.menu, self.cursor);
        }
      }
      KeyCode::Char('n') | KeyCode::Char('+') => self.primary(session),
      KeyCode::Char('r') => {
        self.refetch(backend, session).await?;
        return Ok(Outcome::Notice("Listas actualizadas.".into()));
      }
      _ => {}
    }
    Ok(Outcome::Stay)
  }

  /// The big button: create in the current tab.
  pub fn primary(&mut self, session: &Session) {
    self.menu = None;
    match self.tab {
      Tab::Warehouses => self.open_warehouse_form(None),
      Tab::Products => self.open_product_form(None),
      Tab::Inventory if session.can(ADMIN) => self.confirm.open(
        "Crear/Upsert inventario (no recomendado)",
        "Lo ideal es hacerlo mediante Movimiento para mantener trazabilidad. ¿Continuar?",
        StockAction::OpenInventoryForm(None),
      ),
      Tab::Inventory => {}
    }
  }

  fn row_action(&mut self, row: usize, action: RowAction, session: &Session) {
    self.menu = None;
    let admin = session.can(ADMIN);
    match (self.tab, action) {
      (Tab::Warehouses, RowAction::Edit) => {
        if let Some(id) = self.warehouses.get(row).map(|w| w.id) {
          self.open_warehouse_form(Some(id));
        }
      }
      (Tab::Products, RowAction::Edit) => {
        if let Some(id) = self.products.get(row).map(|p| p.id) {
          self.open_product_form(Some(id));
        }
      }
      (_, _) if !admin => {}
      (Tab::Warehouses, RowAction::Deactivate) => {
        if let Some(w) = self.warehouses.get(row) {
          self.confirm.open(
            "Desactivar bodega",
            format!("La bodega \"{}\" quedará inactiva.", w.name),
            StockAction::DeactivateWarehouse(w.id),
          );
        }
      }
      (Tab::Warehouses, RowAction::Delete) => {
        if let Some(w) = self.warehouses.get(row) {
          self.confirm.open(
            "Eliminar bodega",
            RECOMMEND_DEACTIVATE,
            StockAction::DeleteWarehouse(w.id),
          );
        }
      }
      (Tab::Products, RowAction::Deactivate) => {
        if let Some(p) = self.products.get(row) {
          self.confirm.open(
            "Desactivar producto",
            format!("El producto \"{}\" quedará inactivo (active=false).", p.name),
            StockAction::DeactivateProduct(p.id),
          );
        }
      }
      (Tab::Products, RowAction::Delete) => {
        if let Some(p) = self.products.get(row) {
          self.confirm.open(
            "Eliminar producto",
            RECOMMEND_DEACTIVATE,
            StockAction::DeleteProduct(p.id),
          );
        }
      }
      (Tab::Inventory, RowAction::Edit) => {
        if let Some(i) = self.inventory.get(row) {
          self.confirm.open(
            "Actualizar inventario (no recomendado)",
            format!("{} @ {}. ¿Continuar?", i.product, i.warehouse),
            StockAction::OpenInventoryForm(Some(i.key)),
          );
        }
      }
      (Tab::Inventory, RowAction::Delete) => {
        if let Some(i) = self.inventory.get(row) {
          self.confirm.open(
            "Eliminar inventario (no recomendado)",
            format!("{} @ {}. ¿Eliminar?", i.product, i.warehouse),
            StockAction::DeleteInventory(i.key),
          );
        }
      }
      _ => {}
    }
  }

  // ── Forms ─────────────────────────────────────────────────────────────────

  fn open_warehouse_form(&mut self, id: Option<Uuid>) {
    let existing = id.and_then(|id| self.warehouse_rows.iter().find(|w| w.id == id));
    let form = Form::new(
      if existing.is_some() { "Editar bodega" } else { "Nueva bodega" },
      vec![
        Field::text("code", "Código", existing.map(|w| w.code.as_str()).unwrap_or_default()),
        Field::text("name", "Nombre", existing.map(|w| w.name.as_str()).unwrap_or_default()),
        Field::text(
          "address",
          "Dirección (opcional)",
          existing.and_then(|w| w.address.as_deref()).unwrap_or_default(),
        ),
      ],
    );
    let target = match existing {
      Some(w) => Target::Warehouse(w.id),
      None => Target::NewWarehouse,
    };
    self.form = Some(StockForm { form, target });
  }

  fn open_product_form(&mut self, id: Option<Uuid>) {
    let existing = id.and_then(|id| self.product_rows.iter().find(|p| p.id == id));
    let form = Form::new(
      if existing.is_some() { "Editar producto" } else { "Nuevo producto" },
      vec![
        Field::text("sku", "SKU", existing.map(|p| p.sku.as_str()).unwrap_or_default()),
        Field::text("name", "Nombre", existing.map(|p| p.name.as_str()).unwrap_or_default()),
        Field::text(
          "description",
          "Descripción (opcional)",
          existing.and_then(|p| p.description.as_deref()).unwrap_or_default(),
        ),
        Field::text(
          "unit",
          "Unidad (ej: UND, g, ml)",
          existing.map_or(NewProduct::DEFAULT_UNIT, |p| p.unit.as_str()),
        ),
        Field::text(
          "price",
          "Precio",
          existing.map(|p| format_quantity(p.price)).unwrap_or_default(),
        ),
      ],
    );
    let target = match existing {
      Some(p) => Target::Product(p.id),
      None => Target::NewProduct,
    };
    self.form = Some(StockForm { form, target });
  }

  fn open_inventory_form(&mut self, key: Option<InventoryKey>) {
    let form = match key.and_then(|k| self.inventory.iter().find(|i| i.key == k)) {
      Some(vm) => Form::new(format!("{} @ {}", vm.product, vm.warehouse), vec![Field::text(
        "quantity",
        "Nueva cantidad",
        vm.quantity.clone(),
      )]),
      None => Form::new("Inventario", vec![
        Field::select("product_id", "Producto", self.product_choices()),
        Field::select("warehouse_id", "Bodega", self.warehouse_choices()),
        Field::text("quantity", "Cantidad", "0"),
      ]),
    };
    let target = match key {
      Some(k) => Target::Inventory(k),
      None => Target::NewInventory,
    };
    self.form = Some(StockForm { form, target });
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

    let notice = match open.target {
      Target::NewWarehouse | Target::Warehouse(_) => {
        let code = form.text("code").to_string();
        let name = form.text("name").to_string();
        let address = Some(form.text("address").to_string()).filter(|a| !a.is_empty());
        if code.is_empty() || name.is_empty() {
          form.error = Some("El código y el nombre son obligatorios.".into());
          return Ok(Outcome::Stay);
        }
        if let Target::Warehouse(id) = open.target {
          let patch = WarehousePatch {
            code: Some(code),
            name: Some(name),
            address: Some(address),
            active: None,
          };
          backend.warehouses.update(session, id, &patch).await?;
          "Bodega actualizada."
        } else {
          let new = NewWarehouse { code, name, address, active: true };
          backend.warehouses.insert(session, &new).await?;
          "Bodega creada."
        }
      }

      Target::NewProduct | Target::Product(_) => {
        let sku = form.text("sku").to_string();
        let name = form.text("name").to_string();
        let description = Some(form.text("description").to_string()).filter(|d| !d.is_empty());
        let unit = match form.text("unit") {
          "" => NewProduct::DEFAULT_UNIT.to_string(),
          u => u.to_string(),
        };
        if sku.is_empty() || name.is_empty() {
          form.error = Some("El SKU y el nombre son obligatorios.".into());
          return Ok(Outcome::Stay);
        }
        let Some(price) = parse_number(form.text("price")).filter(|p| *p >= 0.0) else {
          form.error = Some("El precio debe ser un número mayor o igual a 0.".into());
          return Ok(Outcome::Stay);
        };
        if let Target::Product(id) = open.target {
          let patch = ProductPatch {
            sku: Some(sku),
            name: Some(name),
            description: Some(description),
            unit: Some(unit),
            price: Some(price),
            active: None,
          };
          backend.products.update(session, id, &patch).await?;
          "Producto actualizado."
        } else {
          let new = NewProduct { sku, name, description, unit, price, active: true };
          backend.products.insert(session, &new).await?;
          "Producto creado."
        }
      }

      Target::NewInventory | Target::Inventory(_) => {
        let Some(quantity) = parse_number(form.text("quantity")).filter(|q| *q >= 0.0) else {
          form.error = Some("La cantidad debe ser un número mayor o igual a 0.".into());
          return Ok(Outcome::Stay);
        };
        if let Target::Inventory(key) = open.target {
          backend.inventory.update(session, key, quantity).await?;
          "Inventario actualizado."
        } else {
          let product_id = form.selected("product_id").and_then(|v| v.parse().ok());
          let warehouse_id = form.selected("warehouse_id").and_then(|v| v.parse().ok());
          let (Some(product_id), Some(warehouse_id)) = (product_id, warehouse_id) else {
            form.error = Some("Selecciona producto y bodega.".into());
            return Ok(Outcome::Stay);
          };
          let key = InventoryKey { product_id, warehouse_id };
          backend.inventory.upsert(session, key, quantity).await?;
          "Inventario guardado."
        }
      }
    };

    self.form = None;
    self.refetch(backend, session).await?;
    Ok(Outcome::Notice(notice.into()))
  }

  async fn run<T: GraphqlTransport>(
    &mut self,
    action: StockAction,
    backend: &Backend<T>,
    session: &Session,
  ) -> anyhow::Result<Outcome> {
    if !session.can(ADMIN) {
      return Ok(Outcome::Stay);
    }
    let notice = match action {
      StockAction::OpenInventoryForm(key) => {
        self.open_inventory_form(key);
        return Ok(Outcome::Stay);
      }
      StockAction::DeactivateWarehouse(id) => {
        backend.warehouses.deactivate(session, id).await?;
        "Bodega desactivada."
      }
      StockAction::DeleteWarehouse(id) => {
        backend.warehouses.delete(session, id).await?;
        "Bodega eliminada."
      }
      StockAction::DeactivateProduct(id) => {
        backend.products.deactivate(session, id).await?;
        "Producto desactivado."
      }
      StockAction::DeleteProduct(id) => {
        backend.products.delete(session, id).await?;
        "Producto eliminado."
      }
      StockAction::DeleteInventory(key) => {
        backend.inventory.delete(session, key).await?;
        "Inventario eliminado."
      }
    };
    self.refetch(backend, session).await?;
    Ok(Outcome::Notice(notice.into()))
  }

  /// Refetch every list this page shows. Subscribers pick the results up on
  /// the next [`StockPage::refresh`].
  async fn refetch<T: GraphqlTransport>(
    &self,
    backend: &Backend<T>,
    session: &Session,
  ) -> stockroom_graphql::Result<()> {
    backend.warehouses.refetch_list(session).await?;
    backend.products.refetch_list(session).await?;
    if self.inventory_live.is_some() {
      backend.inventory.refetch_list(session).await?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pages::test_support::{backend, key, session, settle};

  async fn opened(
    backend: &Backend<stockroom_graphql::testing::FakeHasura>,
    session: &Session,
  ) -> StockPage {
    let mut page = StockPage::open(backend, session);
    settle().await;
    page.refresh().unwrap();
    page
  }

  #[tokio::test]
  async fn public_role_never_sees_inventory() {
    let (hasura, backend) = backend();
    let public = session(Role::Public);
    let mut page = opened(&backend, &public).await;

    assert_eq!(page.tabs(&public), vec![Tab::Warehouses, Tab::Products]);
    assert!(!hasura.operations().contains(&"InventoryList"));

    page.switch_tab(Tab::Inventory, &public);
    assert_eq!(page.tab, Tab::Warehouses);
    page.switch_tab(Tab::Products, &public);
    assert_eq!(page.primary_label(&public), "+ Nuevo Producto");
    assert_eq!(page.row_actions(&public), vec![RowAction::Edit]);
  }

  #[tokio::test]
  async fn inventory_label_depends_on_role() {
    let (_hasura, backend) = backend();
    let operator = session(Role::Operator);
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &operator).await;

    page.switch_tab(Tab::Inventory, &operator);
    assert_eq!(page.tab, Tab::Inventory);
    assert_eq!(page.primary_label(&operator), "+ Nuevo (bloqueado)");
    assert_eq!(page.primary_label(&admin), "+ Nuevo (inventario)");

    page.primary(&operator);
    assert!(!page.confirm.is_open());
  }

  #[tokio::test]
  async fn create_product_through_form() {
    let (hasura, backend) = backend();
    let operator = session(Role::Operator);
    let mut page = opened(&backend, &operator).await;
    page.switch_tab(Tab::Products, &operator);

    page.handle_key(key(KeyCode::Char('n')), &backend, &operator).await.unwrap();
    let form = &mut page.form.as_mut().unwrap().form;
    assert_eq!(form.text("unit"), "UND");
    form.set_text("sku", "CAF-01");
    form.set_text("name", "Café");
    form.set_text("price", "12500");

    let outcome = page.handle_key(key(KeyCode::Enter), &backend, &operator).await.unwrap();
    assert_eq!(outcome, Outcome::Notice("Producto creado.".into()));
    assert!(page.form.is_none());
    assert!(hasura.operations().contains(&"InsertProduct"));

    page.refresh().unwrap();
    assert_eq!(page.products.len(), 1);
    assert_eq!(page.products[0].price, "$ 12.500");
    assert_eq!(page.products[0].unit, "UND");
  }

  #[tokio::test]
  async fn editing_a_product_keeps_its_fractional_price() {
    let (hasura, backend) = backend();
    hasura.seed_product("ARR-1", "Arroz", 4200.5);
    let operator = session(Role::Operator);
    let mut page = opened(&backend, &operator).await;
    page.switch_tab(Tab::Products, &operator);

    page.row_action(0, RowAction::Edit, &operator);
    let form = &mut page.form.as_mut().unwrap().form;
    assert_eq!(form.text("price"), "4200.5");
    form.set_text("name", "Arroz blanco");
    hasura.clear_log();
    page.handle_key(key(KeyCode::Enter), &backend, &operator).await.unwrap();

    let update = hasura
      .requests()
      .into_iter()
      .find(|r| r.operation == "UpdateProduct")
      .unwrap();
    assert_eq!(update.variables["set"]["price"], serde_json::json!(4200.5));
    assert_eq!(update.variables["set"]["name"], "Arroz blanco");
  }

  #[tokio::test]
  async fn invalid_product_form_issues_no_request() {
    let (hasura, backend) = backend();
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &admin).await;
    page.switch_tab(Tab::Products, &admin);
    hasura.clear_log();

    page.primary(&admin);
    page.form.as_mut().unwrap().form.set_text("sku", "X-1");
    page.handle_key(key(KeyCode::Enter), &backend, &admin).await.unwrap();

    let form = &page.form.as_ref().unwrap().form;
    assert!(form.error.is_some());
    assert!(hasura.requests().is_empty());
  }

  #[tokio::test]
  async fn deactivate_keeps_row_and_delete_removes_it() {
    let (hasura, backend) = backend();
    hasura.seed_product("ARR-1", "Arroz", 4200.0);
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &admin).await;
    page.switch_tab(Tab::Products, &admin);
    assert!(page.products[0].active);

    // Menu → Desactivar → confirm.
    page.handle_key(key(KeyCode::Enter), &backend, &admin).await.unwrap();
    page.handle_key(key(KeyCode::Down), &backend, &admin).await.unwrap();
    page.handle_key(key(KeyCode::Enter), &backend, &admin).await.unwrap();
    assert_eq!(page.confirm.pending().unwrap().title, "Desactivar producto");
    assert!(page.menu.is_none());
    page.handle_key(key(KeyCode::Char('y')), &backend, &admin).await.unwrap();
    page.refresh().unwrap();
    assert_eq!(page.products.len(), 1);
    assert!(!page.products[0].active);

    page.row_action(0, RowAction::Delete, &admin);
    page.handle_key(key(KeyCode::Enter), &backend, &admin).await.unwrap();
    page.refresh().unwrap();
    assert!(page.products.is_empty());
  }

  #[tokio::test]
  async fn operator_cannot_reach_destructive_actions() {
    let (hasura, backend) = backend();
    hasura.seed_warehouse("B1", "Central");
    let operator = session(Role::Operator);
    let mut page = opened(&backend, &operator).await;
    hasura.clear_log();

    page.row_action(0, RowAction::Delete, &operator);
    assert!(!page.confirm.is_open());

    let id = page.warehouses[0].id;
    let outcome = page
      .run(StockAction::DeleteWarehouse(id), &backend, &operator)
      .await
      .unwrap();
    assert_eq!(outcome, Outcome::Stay);
    assert!(hasura.requests().is_empty());
  }

  #[tokio::test]
  async fn inventory_upsert_is_confirmed_before_the_form() {
    let (hasura, backend) = backend();
    let product = hasura.seed_product("ARR-1", "Arroz", 4200.0);
    let warehouse = hasura.seed_warehouse("B1", "Central");
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &admin).await;
    page.switch_tab(Tab::Inventory, &admin);

    page.handle_key(key(KeyCode::Char('n')), &backend, &admin).await.unwrap();
    assert!(page.form.is_none());
    page.handle_key(key(KeyCode::Char('y')), &backend, &admin).await.unwrap();

    let form = &mut page.form.as_mut().unwrap().form;
    form.select("product_id", Some(&product.to_string()));
    form.select("warehouse_id", Some(&warehouse.to_string()));
    form.set_text("quantity", "7");
    page.handle_key(key(KeyCode::Enter), &backend, &admin).await.unwrap();

    page.refresh().unwrap();
    assert_eq!(page.inventory.len(), 1);
    assert_eq!(page.inventory[0].quantity, "7");
    assert_eq!(page.inventory[0].product, "Arroz");
    assert_eq!(page.inventory[0].warehouse_code, "B1");
  }

  #[tokio::test]
  async fn cursor_moves_within_the_active_tab() {
    let (hasura, backend) = backend();
    hasura.seed_warehouse("B1", "Central");
    hasura.seed_warehouse("B2", "Norte");
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &admin).await;

    page.handle_key(key(KeyCode::Char('j')), &backend, &admin).await.unwrap();
    assert_eq!(page.cursor, 1);
    page.handle_key(key(KeyCode::Down), &backend, &admin).await.unwrap();
    assert_eq!(page.cursor, 1);
    page.handle_key(key(KeyCode::Char('k')), &backend, &admin).await.unwrap();
    assert_eq!(page.cursor, 0);
  }

  #[tokio::test]
  async fn tab_change_closes_row_menu() {
    let (hasura, backend) = backend();
    hasura.seed_warehouse("B1", "Central");
    let admin = session(Role::Admin);
    let mut page = opened(&backend, &admin).await;

    page.handle_key(key(KeyCode::Char('m')), &backend, &admin).await.unwrap();
    assert!(page.menu.is_some());
    page.handle_key(key(KeyCode::Esc), &backend, &admin).await.unwrap();
    page.handle_key(key(KeyCode::Char('m')), &backend, &admin).await.unwrap();
    page.switch_tab(Tab::Products, &admin);
    assert!(page.menu.is_none());
    assert_eq!(page.warehouses[0].status, "Activo");
  }
}
