//! Admin-managed user accounts.
//!
//! The list query never selects `password_hash`. Callers hash passwords with
//! [`crate::password::hash_password`] before building a [`NewUser`] or a
//! [`UserPatch`].

use serde_json::{Value, json};
use stockroom_core::{
  graphql::{GraphqlRequest, GraphqlTransport},
  session::Session,
  user::{NewUser, User, UserPatch},
};
use uuid::Uuid;

use crate::{
  Result,
  cache::LiveQuery,
  client::{GraphqlClient, field, returned_id, returned_row},
};

const LIST: &str = "query UsersList {
  users(order_by: { created_at: desc }) {
    id email name role active
  }
}";

const INSERT: &str = "mutation InsertUser($obj: users_insert_input!) {
  insert_users_one(object: $obj) { id }
}";

const UPDATE: &str = "mutation UpdateUser($id: uuid!, $set: users_set_input!) {
  update_users_by_pk(pk_columns: { id: $id }, _set: $set) { id }
}";

const ACTIVATE: &str = "mutation ActivateUser($id: uuid!) {
  update_users_by_pk(pk_columns: { id: $id }, _set: { active: true }) { id }
}";

const DEACTIVATE: &str = "mutation DeactivateUser($id: uuid!) {
  update_users_by_pk(pk_columns: { id: $id }, _set: { active: false }) { id }
}";

const DELETE: &str = "mutation DeleteUser($id: uuid!) {
  delete_users_by_pk(id: $id) { id }
}";

fn list_request() -> GraphqlRequest { GraphqlRequest::new("UsersList", LIST) }

fn decode_list(data: &Value) -> Result<Vec<User>> { field(data, "users") }

pub struct UsersAdapter<T> {
  client: GraphqlClient<T>,
}

impl<T> Clone for UsersAdapter<T> {
  fn clone(&self) -> Self { Self { client: self.client.clone() } }
}

impl<T: GraphqlTransport> UsersAdapter<T> {
  pub fn new(client: GraphqlClient<T>) -> Self { Self { client } }

  pub fn watch_list(&self, session: &Session) -> LiveQuery<Vec<User>> {
    self
      .client
      .watch(list_request(), session.headers(), decode_list)
  }

  pub async fn refetch_list(&self, session: &Session) -> Result<Vec<User>> {
    let data = self
      .client
      .refetch(&list_request(), &session.headers())
      .await?;
    decode_list(&data)
  }

  pub async fn insert(&self, session: &Session, user: &NewUser) -> Result<Uuid> {
    let req = GraphqlRequest::new("InsertUser", INSERT).with_variables(json!({ "obj": user }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    let id = returned_id(&data, "insert_users_one")?;
    tracing::info!(%id, email = %user.email, role = %user.role, "user created");
    Ok(id)
  }

  /// Partial update. `password_hash` is only sent when the patch carries one.
  pub async fn update(&self, session: &Session, id: Uuid, patch: &UserPatch) -> Result<()> {
    let req = GraphqlRequest::new("UpdateUser", UPDATE)
      .with_variables(json!({ "id": id, "set": patch }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_users_by_pk")?;
    Ok(())
  }

  pub async fn activate(&self, session: &Session, id: Uuid) -> Result<()> {
    self.set_active(session, id, ("ActivateUser", ACTIVATE)).await
  }

  pub async fn deactivate(&self, session: &Session, id: Uuid) -> Result<()> {
    self.set_active(session, id, ("DeactivateUser", DEACTIVATE)).await
  }

  pub async fn delete(&self, session: &Session, id: Uuid) -> Result<()> {
    let req = GraphqlRequest::new("DeleteUser", DELETE).with_variables(json!({ "id": id }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "delete_users_by_pk")?;
    Ok(())
  }

  async fn set_active(
    &self,
    session: &Session,
    id: Uuid,
    (operation, document): (&'static str, &'static str),
  ) -> Result<()> {
    let req = GraphqlRequest::new(operation, document).with_variables(json!({ "id": id }));
    let data = self.client.mutate(&req, &session.headers()).await?;
    returned_row(&data, "update_users_by_pk")?;
    Ok(())
  }
}
