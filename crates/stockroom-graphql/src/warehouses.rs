//! Warehouses ("bodegas"): list query and mutations.

use serde_json::{Value, json};
use stockroom_core::{
  graphql::{GraphqlRequest, GraphqlTransport},
  session::Session,
  warehouse::{NewWarehouse, Warehouse, WarehousePatch},
};
use uuid::Uuid;

use crate::{
  Result,
  cache::LiveQuery,
  client::{GraphqlClient, field, returned_id, returned_row},
};

const LIST: &str = "query WarehousesList {
  warehouses(order_by: { created_at: desc }) {
    id code name address active
  }
}";

const INSERT: &str = "mutation InsertWarehouse($obj: warehouses_insert_input!) {
  insert_warehouses_one(object: $obj) { id }
}";

const UPDATE: &str = "mutation UpdateWarehouse($id: uuid!, $set: warehouses_set_input!) {
  update_warehouses_by_pk(pk_columns: { id: $id }, _set: $set) { id }
}";

const DEACTIVATE: &str = "mutation DeactivateWarehouse($id: uuid!) {
  update_warehouses_by_pk(pk_columns: { id: $id }, _set: { active: false }) { id }
}";

const DELETE: &str = "mutation DeleteWarehouse($id: uuid!) {
  delete_warehouses_by_pk(id: $id) { id }
}";

fn list_request() -> GraphqlRequest { GraphqlRequest::new("WarehousesList", LIST) }

fn decode_list(data: &Value) -> Result<Vec<Warehouse>> { field(data, "warehouses") }

pub struct WarehousesAdapter<T> {
  client: GraphqlClient<T>,
}

impl<T> Clone for WarehousesAdapter<T> {
  fn clone(&self) -> Self { Self { client: self.client.clone() } }
}

impl<T: GraphqlTransport> WarehousesAdapter<T> {
  pub fn new(client: GraphqlClient<T>) -> Self { Self { client } }

  pub fn watch_list(&self, session: &Session) -> LiveQuery<Vec<Warehouse>> {
    self
      .client
      .watch(list_request(), session.headers(), decode_list)
  }

  pub async fn refetch_list(&self, session: &Session) -> Result<Vec<Warehouse>> {
    let data = self
      .client
      .refetch(&list_request(), &session.headers())
      .await?;
    decode_list(&data)
  }

  pub async fn insert(&self, session: &Session, warehouse: &NewWarehouse) -> Result<Uuid> {
    let req = GraphqlRequest::new("InsertWarehouse", INSERT)
      .with_variables(json!({ "obj": warehouse }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    let id = returned_id(&data, "insert_warehouses_one")?;
    tracing::debug!(%id, code = %warehouse.code, "warehouse inserted");
    Ok(id)
  }

  pub async fn update(
    &self,
    session: &Session,
    id: Uuid,
    patch: &WarehousePatch,
  ) -> Result<()> {
    let req = GraphqlRequest::new("UpdateWarehouse", UPDATE)
      .with_variables(json!({ "id": id, "set": patch }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_warehouses_by_pk")?;
    Ok(())
  }

  pub async fn deactivate(&self, session: &Session, id: Uuid) -> Result<()> {
    let req = GraphqlRequest::new("DeactivateWarehouse", DEACTIVATE)
      .with_variables(json!({ "id": id }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_warehouses_by_pk")?;
    Ok(())
  }

  pub async fn delete(&self, session: &Session, id: Uuid) -> Result<()> {
    let req =
      GraphqlRequest::new("DeleteWarehouse", DELETE).with_variables(json!({ "id": id }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "delete_warehouses_by_pk")?;
    Ok(())
  }
}
