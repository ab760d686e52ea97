//! Inventory rows keyed by `(product_id, warehouse_id)`.
//!
//! Quantities are overwritten in place; there is no history and nothing ties
//! them to stock movements.

use serde_json::{Value, json};
use stockroom_core::{
  graphql::{GraphqlRequest, GraphqlTransport},
  inventory::{InventoryKey, InventoryRow},
  session::Session,
};

use crate::{
  Result,
  cache::LiveQuery,
  client::{GraphqlClient, field, returned_row},
};

const LIST: &str = "query InventoryList {
  inventory(order_by: { product_id: asc }) {
    product_id warehouse_id quantity
    product { id name sku }
    warehouse { id name code }
  }
}";

const UPSERT: &str = "mutation UpsertInventory($product_id: uuid!, $warehouse_id: uuid!, $quantity: numeric!) {
  insert_inventory_one(
    object: { product_id: $product_id, warehouse_id: $warehouse_id, quantity: $quantity }
    on_conflict: { constraint: inventory_pkey, update_columns: [quantity] }
  ) { product_id warehouse_id }
}";

const UPDATE: &str = "mutation UpdateInventory($product_id: uuid!, $warehouse_id: uuid!, $quantity: numeric!) {
  update_inventory_by_pk(
    pk_columns: { product_id: $product_id, warehouse_id: $warehouse_id }
    _set: { quantity: $quantity }
  ) { product_id warehouse_id }
}";

const DELETE: &str = "mutation DeleteInventory($product_id: uuid!, $warehouse_id: uuid!) {
  delete_inventory_by_pk(product_id: $product_id, warehouse_id: $warehouse_id) {
    product_id warehouse_id
  }
}";

fn list_request() -> GraphqlRequest { GraphqlRequest::new("InventoryList", LIST) }

fn decode_list(data: &Value) -> Result<Vec<InventoryRow>> { field(data, "inventory") }

fn quantity_vars(key: InventoryKey, quantity: f64) -> Value {
  json!({
    "product_id":   key.product_id,
    "warehouse_id": key.warehouse_id,
    "quantity":     quantity,
  })
}

pub struct InventoryAdapter<T> {
  client: GraphqlClient<T>,
}

impl<T> Clone for InventoryAdapter<T> {
  fn clone(&self) -> Self { Self { client: self.client.clone() } }
}

impl<T: GraphqlTransport> InventoryAdapter<T> {
  pub fn new(client: GraphqlClient<T>) -> Self { Self { client } }

  pub fn watch_list(&self, session: &Session) -> LiveQuery<Vec<InventoryRow>> {
    self
      .client
      .watch(list_request(), session.headers(), decode_list)
  }

  pub async fn refetch_list(&self, session: &Session) -> Result<Vec<InventoryRow>> {
    let data = self
      .client
      .refetch(&list_request(), &session.headers())
      .await?;
    decode_list(&data)
  }

  /// Insert the row, or overwrite its quantity if the key already exists.
  pub async fn upsert(&self, session: &Session, key: InventoryKey, quantity: f64) -> Result<()> {
    let req =
      GraphqlRequest::new("UpsertInventory", UPSERT).with_variables(quantity_vars(key, quantity));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "insert_inventory_one")?;
    Ok(())
  }

  pub async fn update(&self, session: &Session, key: InventoryKey, quantity: f64) -> Result<()> {
    let req =
      GraphqlRequest::new("UpdateInventory", UPDATE).with_variables(quantity_vars(key, quantity));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_inventory_by_pk")?;
    Ok(())
  }

  pub async fn delete(&self, session: &Session, key: InventoryKey) -> Result<()> {
    let req = GraphqlRequest::new("DeleteInventory", DELETE).with_variables(json!({
      "product_id":   key.product_id,
      "warehouse_id": key.warehouse_id,
    }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "delete_inventory_by_pk")?;
    Ok(())
  }
}
