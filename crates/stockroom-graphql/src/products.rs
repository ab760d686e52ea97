//! Products: list query and mutations.

use serde_json::{Value, json};
use stockroom_core::{
  graphql::{GraphqlRequest, GraphqlTransport},
  product::{NewProduct, Product, ProductPatch},
  session::Session,
};
use uuid::Uuid;

use crate::{
  Result,
  cache::LiveQuery,
  client::{GraphqlClient, field, returned_id, returned_row},
};

const LIST: &str = "query ProductsList {
  products(order_by: { created_at: desc }) {
    id sku name description unit price active
  }
}";

const INSERT: &str = "mutation InsertProduct($obj: products_insert_input!) {
  insert_products_one(object: $obj) { id }
}";

const UPDATE: &str = "mutation UpdateProduct($id: uuid!, $set: products_set_input!) {
  update_products_by_pk(pk_columns: { id: $id }, _set: $set) { id }
}";

const DEACTIVATE: &str = "mutation DeactivateProduct($id: uuid!) {
  update_products_by_pk(pk_columns: { id: $id }, _set: { active: false }) { id }
}";

const DELETE: &str = "mutation DeleteProduct($id: uuid!) {
  delete_products_by_pk(id: $id) { id }
}";

fn list_request() -> GraphqlRequest { GraphqlRequest::new("ProductsList", LIST) }

fn decode_list(data: &Value) -> Result<Vec<Product>> { field(data, "products") }

pub struct ProductsAdapter<T> {
  client: GraphqlClient<T>,
}

impl<T> Clone for ProductsAdapter<T> {
  fn clone(&self) -> Self { Self { client: self.client.clone() } }
}

impl<T: GraphqlTransport> ProductsAdapter<T> {
  pub fn new(client: GraphqlClient<T>) -> Self { Self { client } }

  /// Every product, newest first, as a cache-and-network live query.
  pub fn watch_list(&self, session: &Session) -> LiveQuery<Vec<Product>> {
    self
      .client
      .watch(list_request(), session.headers(), decode_list)
  }

  pub async fn refetch_list(&self, session: &Session) -> Result<Vec<Product>> {
    let data = self
      .client
      .refetch(&list_request(), &session.headers())
      .await?;
    decode_list(&data)
  }

  /// Insert a product and return its server-assigned id.
  pub async fn insert(&self, session: &Session, product: &NewProduct) -> Result<Uuid> {
    let req = GraphqlRequest::new("InsertProduct", INSERT)
      .with_variables(json!({ "obj": product }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    let id = returned_id(&data, "insert_products_one")?;
    tracing::debug!(%id, sku = %product.sku, "product inserted");
    Ok(id)
  }

  pub async fn update(&self, session: &Session, id: Uuid, patch: &ProductPatch) -> Result<()> {
    let req = GraphqlRequest::new("UpdateProduct", UPDATE)
      .with_variables(json!({ "id": id, "set": patch }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_products_by_pk")?;
    Ok(())
  }

  /// Soft delete: the row stays with `active = false`.
  pub async fn deactivate(&self, session: &Session, id: Uuid) -> Result<()> {
    let req = GraphqlRequest::new("DeactivateProduct", DEACTIVATE)
      .with_variables(json!({ "id": id }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_products_by_pk")?;
    Ok(())
  }

  pub async fn delete(&self, session: &Session, id: Uuid) -> Result<()> {
    let req = GraphqlRequest::new("DeleteProduct", DELETE).with_variables(json!({ "id": id }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "delete_products_by_pk")?;
    Ok(())
  }
}
