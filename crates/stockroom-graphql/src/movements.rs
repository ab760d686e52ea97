//! Stock movements: list query (with user/product/warehouse joins) and
//! mutations.

use serde_json::{Value, json};
use stockroom_core::{
  graphql::{GraphqlRequest, GraphqlTransport},
  movement::{Movement, MovementPatch, NewMovement},
  session::Session,
};
use uuid::Uuid;

use crate::{
  Result,
  cache::LiveQuery,
  client::{GraphqlClient, field, returned_id, returned_row},
};

const LIST: &str = "query MovementsList {
  stock_movements(order_by: { created_at: desc }) {
    id created_at user_id product_id warehouse_id type quantity reason active
    user { id name email }
    product { id name sku }
    warehouse { id name code }
  }
}";

const INSERT: &str = "mutation InsertMovement($obj: stock_movements_insert_input!) {
  insert_stock_movements_one(object: $obj) { id }
}";

const UPDATE: &str = "mutation UpdateMovement($id: uuid!, $set: stock_movements_set_input!) {
  update_stock_movements_by_pk(pk_columns: { id: $id }, _set: $set) { id }
}";

const DEACTIVATE: &str = "mutation DeactivateMovement($id: uuid!) {
  update_stock_movements_by_pk(pk_columns: { id: $id }, _set: { active: false }) { id }
}";

const DELETE: &str = "mutation DeleteMovement($id: uuid!) {
  delete_stock_movements_by_pk(id: $id) { id }
}";

fn list_request() -> GraphqlRequest { GraphqlRequest::new("MovementsList", LIST) }

fn decode_list(data: &Value) -> Result<Vec<Movement>> { field(data, "stock_movements") }

pub struct MovementsAdapter<T> {
  client: GraphqlClient<T>,
}

impl<T> Clone for MovementsAdapter<T> {
  fn clone(&self) -> Self { Self { client: self.client.clone() } }
}

impl<T: GraphqlTransport> MovementsAdapter<T> {
  pub fn new(client: GraphqlClient<T>) -> Self { Self { client } }

  pub fn watch_list(&self, session: &Session) -> LiveQuery<Vec<Movement>> {
    self
      .client
      .watch(list_request(), session.headers(), decode_list)
  }

  pub async fn refetch_list(&self, session: &Session) -> Result<Vec<Movement>> {
    let data = self
      .client
      .refetch(&list_request(), &session.headers())
      .await?;
    decode_list(&data)
  }

  pub async fn insert(&self, session: &Session, movement: &NewMovement) -> Result<Uuid> {
    let req = GraphqlRequest::new("InsertMovement", INSERT)
      .with_variables(json!({ "obj": movement }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    let id = returned_id(&data, "insert_stock_movements_one")?;
    tracing::debug!(%id, kind = %movement.kind, "movement recorded");
    Ok(id)
  }

  pub async fn update(&self, session: &Session, id: Uuid, patch: &MovementPatch) -> Result<()> {
    let req = GraphqlRequest::new("UpdateMovement", UPDATE)
      .with_variables(json!({ "id": id, "set": patch }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_stock_movements_by_pk")?;
    Ok(())
  }

  pub async fn deactivate(&self, session: &Session, id: Uuid) -> Result<()> {
    let req = GraphqlRequest::new("DeactivateMovement", DEACTIVATE)
      .with_variables(json!({ "id": id }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_stock_movements_by_pk")?;
    Ok(())
  }

  pub async fn delete(&self, session: &Session, id: Uuid) -> Result<()> {
    let req =
      GraphqlRequest::new("DeleteMovement", DELETE).with_variables(json!({ "id": id }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "delete_stock_movements_by_pk")?;
    Ok(())
  }
}
