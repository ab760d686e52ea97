//! An in-memory stand-in for the Hasura endpoint.
//!
//! [`FakeHasura`] understands exactly the operations the adapters and the
//! auth service send, keyed by operation name, and keeps its tables as JSON
//! rows. Every request is recorded so tests can assert on what was (or was
//! not) sent.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value, json};
use stockroom_core::graphql::{
  GraphqlRequest, GraphqlResponse, GraphqlTransport, HasuraHeaders,
};
use uuid::Uuid;

/// One request as received by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
  pub operation: &'static str,
  pub variables: Value,
  pub headers:   HasuraHeaders,
}

#[derive(Default)]
struct Tables {
  products:   Vec<Value>,
  warehouses: Vec<Value>,
  inventory:  Vec<Value>,
  movements:  Vec<Value>,
  users:      Vec<Value>,
}

#[derive(Default)]
struct State {
  tables:    Tables,
  log:       Vec<Recorded>,
  fail_next: Option<String>,
  tick:      i64,
}

/// In-memory Hasura. Tables hold rows newest first, which is the order every
/// `created_at desc` list query returns.
pub struct FakeHasura {
  state: Mutex<State>,
  epoch: DateTime<Utc>,
}

impl Default for FakeHasura {
  fn default() -> Self { Self::new() }
}

impl FakeHasura {
  pub fn new() -> Self {
    Self { state: Mutex::new(State::default()), epoch: Utc::now() }
  }

  fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  // ── Seeding ───────────────────────────────────────────────────────────────

  pub fn seed_product(&self, sku: &str, name: &str, price: f64) -> Uuid {
    let id = Uuid::new_v4();
    let mut state = self.state();
    let created_at = self.next_timestamp(&mut state);
    state.tables.products.insert(
      0,
      json!({
        "id": id, "sku": sku, "name": name, "description": null,
        "unit": "UND", "price": price, "active": true, "created_at": created_at,
      }),
    );
    id
  }

  pub fn seed_warehouse(&self, code: &str, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let mut state = self.state();
    let created_at = self.next_timestamp(&mut state);
    state.tables.warehouses.insert(
      0,
      json!({
        "id": id, "code": code, "name": name, "address": null,
        "active": true, "created_at": created_at,
      }),
    );
    id
  }

  /// Seed an account. `role` is stored verbatim so tests can use upper-case
  /// or unknown roles.
  pub fn seed_user(&self, email: &str, password_hash: &str, role: &str, active: bool) -> Uuid {
    let id = Uuid::new_v4();
    let mut state = self.state();
    let created_at = self.next_timestamp(&mut state);
    state.tables.users.insert(
      0,
      json!({
        "id": id, "email": email, "name": null, "role": role,
        "active": active, "password_hash": password_hash, "created_at": created_at,
      }),
    );
    id
  }

  pub fn seed_inventory(&self, product_id: Uuid, warehouse_id: Uuid, quantity: f64) {
    let mut state = self.state();
    upsert_inventory(&mut state.tables, product_id, warehouse_id, quantity);
  }

  // ── Inspection ────────────────────────────────────────────────────────────

  /// Make the next request answer with a GraphQL error carrying `message`.
  pub fn fail_next(&self, message: &str) { self.state().fail_next = Some(message.to_owned()); }

  pub fn requests(&self) -> Vec<Recorded> { self.state().log.clone() }

  /// Operation names received so far, oldest first.
  pub fn operations(&self) -> Vec<&'static str> {
    self.state().log.iter().map(|r| r.operation).collect()
  }

  pub fn clear_log(&self) { self.state().log.clear(); }

  /// A stored user row, including its `password_hash`.
  pub fn user_row(&self, id: Uuid) -> Option<Value> {
    let state = self.state();
    find(&state.tables.users, id).cloned()
  }

  fn next_timestamp(&self, state: &mut State) -> String {
    state.tick += 1;
    (self.epoch + TimeDelta::seconds(state.tick)).to_rfc3339()
  }

  // ── Dispatch ──────────────────────────────────────────────────────────────

  fn handle(&self, request: &GraphqlRequest, headers: &HasuraHeaders) -> GraphqlResponse {
    let mut state = self.state();
    state.log.push(Recorded {
      operation: request.operation_name,
      variables: request.variables.clone(),
      headers:   *headers,
    });
    if let Some(message) = state.fail_next.take() {
      return GraphqlResponse::error(message);
    }

    let vars = &request.variables;
    let id = vars.get("id").and_then(as_uuid);
    let data = match request.operation_name {
      "ProductsList" => json!({ "products": project(&state.tables.products, PRODUCT_FIELDS) }),
      "WarehousesList" => {
        json!({ "warehouses": project(&state.tables.warehouses, WAREHOUSE_FIELDS) })
      }
      "UsersList" => json!({ "users": project(&state.tables.users, USER_FIELDS) }),
      "InventoryList" => json!({ "inventory": inventory_list(&state.tables) }),
      "MovementsList" => json!({ "stock_movements": movements_list(&state.tables) }),
      "GetUserByEmail" => {
        let email = vars.get("email").and_then(Value::as_str).unwrap_or_default();
        let users: Vec<Value> = state
          .tables
          .users
          .iter()
          .filter(|u| u["email"] == email)
          .map(|u| pick(u, &["id", "email", "password_hash", "role", "active"]))
          .collect();
        json!({ "users": users })
      }

      "InsertProduct" => self.insert(&mut state, Table::Products, vars, "insert_products_one"),
      "InsertWarehouse" => {
        self.insert(&mut state, Table::Warehouses, vars, "insert_warehouses_one")
      }
      "InsertMovement" => {
        self.insert(&mut state, Table::Movements, vars, "insert_stock_movements_one")
      }
      "InsertUser" => self.insert(&mut state, Table::Users, vars, "insert_users_one"),

      "UpdateProduct" | "DeactivateProduct" => update(
        table(&mut state.tables, Table::Products),
        id,
        &patch_for(request.operation_name, vars),
        "update_products_by_pk",
      ),
      "UpdateWarehouse" | "DeactivateWarehouse" => update(
        table(&mut state.tables, Table::Warehouses),
        id,
        &patch_for(request.operation_name, vars),
        "update_warehouses_by_pk",
      ),
      "UpdateMovement" | "DeactivateMovement" => update(
        table(&mut state.tables, Table::Movements),
        id,
        &patch_for(request.operation_name, vars),
        "update_stock_movements_by_pk",
      ),
      "UpdateUser" | "DeactivateUser" | "ActivateUser" => update(
        table(&mut state.tables, Table::Users),
        id,
        &patch_for(request.operation_name, vars),
        "update_users_by_pk",
      ),

      "DeleteProduct" => delete(&mut state.tables.products, id, "delete_products_by_pk"),
      "DeleteWarehouse" => delete(&mut state.tables.warehouses, id, "delete_warehouses_by_pk"),
      "DeleteMovement" => {
        delete(&mut state.tables.movements, id, "delete_stock_movements_by_pk")
      }
      "DeleteUser" => delete(&mut state.tables.users, id, "delete_users_by_pk"),

      "UpsertInventory" | "UpdateInventory" | "DeleteInventory" => {
        let (Some(product_id), Some(warehouse_id)) = (
          vars.get("product_id").and_then(as_uuid),
          vars.get("warehouse_id").and_then(as_uuid),
        ) else {
          return GraphqlResponse::error("missing inventory key");
        };
        let quantity = vars.get("quantity").and_then(Value::as_f64).unwrap_or_default();
        let key = json!({ "product_id": product_id, "warehouse_id": warehouse_id });
        let tables = &mut state.tables;
        match request.operation_name {
          "UpsertInventory" => {
            upsert_inventory(tables, product_id, warehouse_id, quantity);
            json!({ "insert_inventory_one": key })
          }
          "UpdateInventory" => {
            let row = tables.inventory.iter_mut().find(|r| {
              as_uuid(&r["product_id"]) == Some(product_id)
                && as_uuid(&r["warehouse_id"]) == Some(warehouse_id)
            });
            match row {
              Some(row) => {
                row["quantity"] = json!(quantity);
                json!({ "update_inventory_by_pk": key })
              }
              None => json!({ "update_inventory_by_pk": null }),
            }
          }
          _ => {
            let before = tables.inventory.len();
            tables.inventory.retain(|r| {
              as_uuid(&r["product_id"]) != Some(product_id)
                || as_uuid(&r["warehouse_id"]) != Some(warehouse_id)
            });
            if tables.inventory.len() < before {
              json!({ "delete_inventory_by_pk": key })
            } else {
              json!({ "delete_inventory_by_pk": null })
            }
          }
        }
      }

      other => return GraphqlResponse::error(format!("unknown operation {other}")),
    };
    GraphqlResponse::data(data)
  }

  fn insert(&self, state: &mut State, which: Table, vars: &Value, field: &str) -> Value {
    let id = Uuid::new_v4();
    let created_at = self.next_timestamp(state);
    let mut row = vars.get("obj").cloned().unwrap_or_else(|| json!({}));
    row["id"] = json!(id);
    row["created_at"] = json!(created_at);
    if row.get("active").is_none() {
      row["active"] = json!(true);
    }
    table(&mut state.tables, which).insert(0, row);
    json!({ field: { "id": id } })
  }
}

impl GraphqlTransport for FakeHasura {
  type Error = std::convert::Infallible;

  async fn execute(
    &self,
    request: &GraphqlRequest,
    headers: &HasuraHeaders,
  ) -> Result<GraphqlResponse, Self::Error> {
    Ok(self.handle(request, headers))
  }
}

// ─── Table helpers ───────────────────────────────────────────────────────────

const PRODUCT_FIELDS: &[&str] = &["id", "sku", "name", "description", "unit", "price", "active"];
const WAREHOUSE_FIELDS: &[&str] = &["id", "code", "name", "address", "active"];
const USER_FIELDS: &[&str] = &["id", "email", "name", "role", "active"];

#[derive(Clone, Copy)]
enum Table {
  Products,
  Warehouses,
  Movements,
  Users,
}

fn table(tables: &mut Tables, which: Table) -> &mut Vec<Value> {
  match which {
    Table::Products => &mut tables.products,
    Table::Warehouses => &mut tables.warehouses,
    Table::Movements => &mut tables.movements,
    Table::Users => &mut tables.users,
  }
}

fn as_uuid(v: &Value) -> Option<Uuid> { v.as_str().and_then(|s| s.parse().ok()) }

fn find(rows: &[Value], id: Uuid) -> Option<&Value> {
  rows.iter().find(|r| as_uuid(&r["id"]) == Some(id))
}

fn pick(row: &Value, fields: &[&str]) -> Value {
  let out: Map<String, Value> = fields
    .iter()
    .map(|f| (f.to_string(), row.get(*f).cloned().unwrap_or(Value::Null)))
    .collect();
  Value::Object(out)
}

fn project(rows: &[Value], fields: &[&str]) -> Vec<Value> {
  rows.iter().map(|r| pick(r, fields)).collect()
}

fn join(rows: &[Value], id: Option<Uuid>, fields: &[&str]) -> Value {
  id.and_then(|id| find(rows, id))
    .map(|r| pick(r, fields))
    .unwrap_or(Value::Null)
}

fn inventory_list(tables: &Tables) -> Vec<Value> {
  let mut rows: Vec<Value> = tables
    .inventory
    .iter()
    .map(|r| {
      let mut row = r.clone();
      row["product"] = join(&tables.products, as_uuid(&r["product_id"]), &["id", "name", "sku"]);
      row["warehouse"] =
        join(&tables.warehouses, as_uuid(&r["warehouse_id"]), &["id", "name", "code"]);
      row
    })
    .collect();
  rows.sort_by(|a, b| {
    a["product_id"]
      .as_str()
      .unwrap_or_default()
      .cmp(b["product_id"].as_str().unwrap_or_default())
  });
  rows
}

fn movements_list(tables: &Tables) -> Vec<Value> {
  tables
    .movements
    .iter()
    .map(|r| {
      let mut row = r.clone();
      row["user"] = join(&tables.users, as_uuid(&r["user_id"]), &["id", "name", "email"]);
      row["product"] = join(&tables.products, as_uuid(&r["product_id"]), &["id", "name", "sku"]);
      row["warehouse"] =
        join(&tables.warehouses, as_uuid(&r["warehouse_id"]), &["id", "name", "code"]);
      row
    })
    .collect()
}

fn upsert_inventory(tables: &mut Tables, product_id: Uuid, warehouse_id: Uuid, quantity: f64) {
  let existing = tables.inventory.iter_mut().find(|r| {
    as_uuid(&r["product_id"]) == Some(product_id)
      && as_uuid(&r["warehouse_id"]) == Some(warehouse_id)
  });
  match existing {
    Some(row) => row["quantity"] = json!(quantity),
    None => tables.inventory.push(json!({
      "product_id": product_id,
      "warehouse_id": warehouse_id,
      "quantity": quantity,
    })),
  }
}

/// The `_set` a by-pk update applies, whether passed as `$set` or fixed in
/// the document.
fn patch_for(operation: &str, vars: &Value) -> Value {
  if operation.starts_with("Deactivate") {
    json!({ "active": false })
  } else if operation.starts_with("Activate") {
    json!({ "active": true })
  } else {
    vars.get("set").cloned().unwrap_or_else(|| json!({}))
  }
}

fn update(rows: &mut [Value], id: Option<Uuid>, set: &Value, field: &str) -> Value {
  let row = id.and_then(|id| rows.iter_mut().find(|r| as_uuid(&r["id"]) == Some(id)));
  match (row, set.as_object()) {
    (Some(row), Some(set)) => {
      for (k, v) in set {
        row[k.as_str()] = v.clone();
      }
      json!({ field: { "id": row["id"].clone() } })
    }
    _ => json!({ field: null }),
  }
}

fn delete(rows: &mut Vec<Value>, id: Option<Uuid>, field: &str) -> Value {
  let Some(pos) = id.and_then(|id| rows.iter().position(|r| as_uuid(&r["id"]) == Some(id)))
  else {
    return json!({ field: null });
  };
  let row = rows.remove(pos);
  json!({ field: { "id": row["id"].clone() } })
}
