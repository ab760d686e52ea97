//! Adapter, live-query and auth tests against [`FakeHasura`].

use std::sync::Arc;

use stockroom_core::{
  graphql::{GraphqlRequest, GraphqlResponse, GraphqlTransport, HasuraHeaders},
  inventory::InventoryKey,
  movement::{MovementType, NewMovement},
  product::{NewProduct, ProductPatch},
  session::{Role, Session, SessionStore, SessionUser, SESSION_STORAGE_KEY},
  storage::{ClientStorage, MemoryStorage},
  user::{NewUser, UserPatch},
  warehouse::NewWarehouse,
};
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

use crate::{
  Backend, Error, GraphqlClient, Origin,
  auth::{AuthService, LoginError},
  password::{PasswordPolicy, hash_password},
  testing::FakeHasura,
};

fn setup() -> (Arc<FakeHasura>, Backend<FakeHasura>) {
  let hasura = Arc::new(FakeHasura::new());
  let backend = Backend::new(GraphqlClient::with_shared(Arc::clone(&hasura)));
  (hasura, backend)
}

fn session(role: Role) -> Session {
  Session::authenticated(SessionUser {
    id: Uuid::new_v4(),
    email: format!("{role}@example.com"),
    role,
  })
}

fn auth(
  backend: &Backend<FakeHasura>,
  policy: PasswordPolicy,
) -> AuthService<FakeHasura, MemoryStorage> {
  AuthService::new(
    backend.client.clone(),
    SessionStore::new(MemoryStorage::new()),
    policy,
  )
}

fn new_product(sku: &str) -> NewProduct {
  NewProduct {
    sku:         sku.into(),
    name:        format!("Producto {sku}"),
    description: None,
    unit:        NewProduct::DEFAULT_UNIT.into(),
    price:       12500.0,
    active:      true,
  }
}

// ─── Live queries ────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_watch_emits_cache_then_network() {
  let (hasura, backend) = setup();
  let admin = session(Role::Admin);
  hasura.seed_product("A-1", "Arroz", 3000.0);

  let mut first = backend.products.watch_list(&admin);
  let update = first.next().await.unwrap();
  assert_eq!(update.origin, Origin::Network);
  assert_eq!(update.rows.len(), 1);

  hasura.seed_product("B-2", "Frijol", 4000.0);

  let mut second = backend.products.watch_list(&admin);
  let cached = second.next().await.unwrap();
  assert_eq!(cached.origin, Origin::Cache);
  assert_eq!(cached.rows.len(), 1);

  let fresh = second.next().await.unwrap();
  assert_eq!(fresh.origin, Origin::Network);
  assert_eq!(fresh.rows.len(), 2);
  assert_eq!(fresh.rows[0].sku, "B-2");

  // The earlier subscriber sees the same refreshed list.
  assert_eq!(first.next().await.unwrap().rows.len(), 2);
  assert_eq!(hasura.operations(), vec!["ProductsList", "ProductsList"]);
}

#[tokio::test]
async fn refetch_reaches_every_subscriber() {
  let (hasura, backend) = setup();
  let op = session(Role::Operator);
  let mut live = backend.warehouses.watch_list(&op);
  assert!(live.next().await.unwrap().rows.is_empty());

  hasura.seed_warehouse("BOG", "Bogotá");
  let rows = backend.warehouses.refetch_list(&op).await.unwrap();
  assert_eq!(rows.len(), 1);

  let update = live.poll().unwrap().unwrap();
  assert_eq!(update.rows[0].code, "BOG");
}

#[tokio::test]
async fn failed_refetch_keeps_rows_and_reports_error() {
  let (hasura, backend) = setup();
  let admin = session(Role::Admin);
  hasura.seed_product("A-1", "Arroz", 3000.0);

  let mut live = backend.products.watch_list(&admin);
  live.next().await.unwrap();

  hasura.fail_next("database unavailable");
  let err = backend.products.refetch_list(&admin).await.unwrap_err();
  assert!(matches!(err, Error::Graphql(ref e) if e[0].message == "database unavailable"));

  assert!(matches!(live.poll(), Some(Err(Error::LiveQuery(_)))));
  assert_eq!(live.latest().unwrap().unwrap().len(), 1);
}

// ─── Products ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn product_deactivate_keeps_row_and_delete_removes_it() {
  let (hasura, backend) = setup();
  let admin = session(Role::Admin);

  let id = backend.products.insert(&admin, &new_product("P-1")).await.unwrap();
  let rows = backend.products.refetch_list(&admin).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert!(rows[0].active);
  assert_eq!(rows[0].unit, "UND");

  backend.products.deactivate(&admin, id).await.unwrap();
  let rows = backend.products.refetch_list(&admin).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert!(!rows[0].active);

  backend.products.delete(&admin, id).await.unwrap();
  assert!(backend.products.refetch_list(&admin).await.unwrap().is_empty());

  let err = backend.products.delete(&admin, id).await.unwrap_err();
  assert!(matches!(err, Error::RowNotFound("delete_products_by_pk")));

  let insert = &hasura.requests()[0];
  assert_eq!(insert.operation, "InsertProduct");
  assert_eq!(insert.headers, admin.headers());
  assert_eq!(insert.variables["obj"]["sku"], "P-1");
}

#[tokio::test]
async fn product_update_sends_only_patched_fields() {
  let (hasura, backend) = setup();
  let admin = session(Role::Admin);
  let id = hasura.seed_product("P-1", "Arroz", 3000.0);

  let patch = ProductPatch { price: Some(3500.0), ..Default::default() };
  backend.products.update(&admin, id, &patch).await.unwrap();

  let sent = &hasura.requests()[0].variables["set"];
  assert_eq!(sent, &serde_json::json!({ "price": 3500.0 }));
  let rows = backend.products.refetch_list(&admin).await.unwrap();
  assert_eq!(rows[0].price, 3500.0);
  assert_eq!(rows[0].name, "Arroz");
}

// ─── Warehouses ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn warehouse_lifecycle() {
  let (_, backend) = setup();
  let admin = session(Role::Admin);
  let id = backend
    .warehouses
    .insert(&admin, &NewWarehouse {
      code:    "MED".into(),
      name:    "Medellín".into(),
      address: Some("Cra 1".into()),
      active:  true,
    })
    .await
    .unwrap();

  backend.warehouses.deactivate(&admin, id).await.unwrap();
  let rows = backend.warehouses.refetch_list(&admin).await.unwrap();
  assert_eq!(rows[0].address.as_deref(), Some("Cra 1"));
  assert!(!rows[0].active);

  backend.warehouses.delete(&admin, id).await.unwrap();
  assert!(backend.warehouses.refetch_list(&admin).await.unwrap().is_empty());
}

// ─── Inventory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn inventory_upsert_overwrites_in_place() {
  let (hasura, backend) = setup();
  let admin = session(Role::Admin);
  let product_id = hasura.seed_product("P-1", "Arroz", 3000.0);
  let warehouse_id = hasura.seed_warehouse("BOG", "Bogotá");
  let key = InventoryKey { product_id, warehouse_id };

  backend.inventory.upsert(&admin, key, 10.0).await.unwrap();
  backend.inventory.upsert(&admin, key, 4.0).await.unwrap();

  let rows = backend.inventory.refetch_list(&admin).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].quantity, 4.0);
  assert_eq!(rows[0].key(), key);
  assert_eq!(rows[0].product.as_ref().unwrap().sku, "P-1");
  assert_eq!(rows[0].warehouse.as_ref().unwrap().code, "BOG");

  backend.inventory.update(&admin, key, 7.0).await.unwrap();
  assert_eq!(backend.inventory.refetch_list(&admin).await.unwrap()[0].quantity, 7.0);

  backend.inventory.delete(&admin, key).await.unwrap();
  let missing = backend.inventory.update(&admin, key, 1.0).await.unwrap_err();
  assert!(matches!(missing, Error::RowNotFound("update_inventory_by_pk")));
}

#[tokio::test]
async fn movements_do_not_touch_inventory() {
  let (hasura, backend) = setup();
  let op = session(Role::Operator);
  let product_id = hasura.seed_product("P-1", "Arroz", 3000.0);
  let warehouse_id = hasura.seed_warehouse("BOG", "Bogotá");
  hasura.seed_inventory(product_id, warehouse_id, 5.0);

  backend
    .movements
    .insert(&op, &NewMovement {
      user_id: op.user().unwrap().id,
      product_id,
      warehouse_id: Some(warehouse_id),
      kind: MovementType::Inbound,
      quantity: 20.0,
      reason: None,
      active: true,
    })
    .await
    .unwrap();

  let inventory = backend.inventory.refetch_list(&op).await.unwrap();
  assert_eq!(inventory[0].quantity, 5.0);
}

// ─── Movements ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn movement_list_carries_joins() {
  let (hasura, backend) = setup();
  let admin = session(Role::Admin);
  let user_id = hasura.seed_user("ops@example.com", "x", "operator", true);
  let product_id = hasura.seed_product("P-1", "Arroz", 3000.0);

  let id = backend
    .movements
    .insert(&admin, &NewMovement {
      user_id,
      product_id,
      warehouse_id: None,
      kind: MovementType::Transfer,
      quantity: 2.0,
      reason: Some("hacia MED".into()),
      active: true,
    })
    .await
    .unwrap();

  let rows = backend.movements.refetch_list(&admin).await.unwrap();
  assert_eq!(rows[0].id, id);
  assert_eq!(rows[0].kind, MovementType::Transfer);
  assert_eq!(rows[0].user.as_ref().unwrap().email, "ops@example.com");
  assert_eq!(rows[0].product.as_ref().unwrap().name, "Arroz");
  assert!(rows[0].warehouse.is_none());

  backend.movements.deactivate(&admin, id).await.unwrap();
  assert!(!backend.movements.refetch_list(&admin).await.unwrap()[0].active);
  backend.movements.delete(&admin, id).await.unwrap();
  assert!(backend.movements.refetch_list(&admin).await.unwrap().is_empty());
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn user_password_is_only_sent_when_patched() {
  let (hasura, backend) = setup();
  let admin = session(Role::Admin);
  let id = backend
    .users
    .insert(&admin, &NewUser {
      email:         "nuevo@example.com".into(),
      name:          Some("Nuevo".into()),
      role:          Role::Operator,
      active:        true,
      password_hash: hash_password("clave").unwrap(),
    })
    .await
    .unwrap();
  let stored = hasura.user_row(id).unwrap()["password_hash"].clone();
  assert!(stored.as_str().unwrap().starts_with("$argon2"));

  let patch = UserPatch { role: Some(Role::Admin), ..Default::default() };
  backend.users.update(&admin, id, &patch).await.unwrap();
  assert_eq!(hasura.user_row(id).unwrap()["password_hash"], stored);
  assert!(hasura.requests()[1].variables["set"].get("password_hash").is_none());

  backend.users.deactivate(&admin, id).await.unwrap();
  let users = backend.users.refetch_list(&admin).await.unwrap();
  assert_eq!(users[0].role, Role::Admin);
  assert!(!users[0].active);

  backend.users.activate(&admin, id).await.unwrap();
  assert!(backend.users.refetch_list(&admin).await.unwrap()[0].active);

  backend.users.delete(&admin, id).await.unwrap();
  assert!(hasura.user_row(id).is_none());
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_normalises_role_and_persists_session() {
  let (hasura, backend) = setup();
  let hash = hash_password("1234").unwrap();
  let id = hasura.seed_user("ana@example.com", &hash, "OPERATOR", true);
  let auth = auth(&backend, PasswordPolicy::strict());

  let session = auth.login("ana@example.com", "1234").await.unwrap();
  let user = session.user().unwrap();
  assert_eq!(user.id, id);
  assert_eq!(user.role, Role::Operator);

  let lookup = &hasura.requests()[0];
  assert_eq!(lookup.operation, "GetUserByEmail");
  assert_eq!(lookup.headers.role, Some(Role::Public));
  assert_eq!(lookup.headers.user_id, None);
  assert!(backend.client.cache().is_empty());

  let stored = auth.store().storage().get_item(SESSION_STORAGE_KEY).await.unwrap().unwrap();
  assert!(stored.contains("\"role\":\"operator\""));
  assert_eq!(auth.restore().await, session);
}

#[tokio::test]
async fn login_failures() {
  let (hasura, backend) = setup();
  let hash = hash_password("1234").unwrap();
  hasura.seed_user("ana@example.com", &hash, "admin", true);
  hasura.seed_user("off@example.com", &hash, "admin", false);
  hasura.seed_user("odd@example.com", &hash, "root", true);
  let auth = auth(&backend, PasswordPolicy::strict());

  assert!(matches!(
    auth.login("nadie@example.com", "1234").await,
    Err(LoginError::NotFound)
  ));
  assert!(matches!(
    auth.login("off@example.com", "1234").await,
    Err(LoginError::Inactive)
  ));
  assert!(matches!(
    auth.login("ana@example.com", "nope").await,
    Err(LoginError::InvalidCredentials)
  ));
  assert!(matches!(
    auth.login("odd@example.com", "1234").await,
    Err(LoginError::UnknownRole(r)) if r == "root"
  ));
  assert_eq!(LoginError::InvalidCredentials.to_string(), "Credenciales inválidas.");
  assert!(!auth.restore().await.is_logged_in());
}

#[tokio::test]
async fn plaintext_secret_only_with_policy() {
  let (hasura, backend) = setup();
  hasura.seed_user("demo@example.com", "1234", "admin", true);

  let strict = auth(&backend, PasswordPolicy::strict());
  assert!(matches!(
    strict.login("demo@example.com", "1234").await,
    Err(LoginError::InvalidCredentials)
  ));

  let lenient = auth(&backend, PasswordPolicy::allowing_plaintext());
  let session = lenient.login("demo@example.com", "1234").await.unwrap();
  assert!(session.is_admin());
}

#[tokio::test]
async fn logout_clears_storage_cache_and_session() {
  let (hasura, backend) = setup();
  let hash = hash_password("1234").unwrap();
  hasura.seed_user("ana@example.com", &hash, "admin", true);
  let auth = auth(&backend, PasswordPolicy::strict());

  let mut session = auth.login("ana@example.com", "1234").await.unwrap();
  backend.users.refetch_list(&session).await.unwrap();
  assert!(!backend.client.cache().is_empty());

  auth.logout(&mut session).await;
  assert!(!session.is_logged_in());
  assert!(!session.can(&[]));
  assert!(!session.can(&[Role::Admin]));
  assert!(backend.client.cache().is_empty());
  assert_eq!(
    auth.store().storage().get_item(SESSION_STORAGE_KEY).await.unwrap(),
    None
  );
}

/// Holds every request for one operation until a permit is added.
struct Gated {
  inner:   FakeHasura,
  hold:    &'static str,
  arrived: Notify,
  gate:    Semaphore,
}

impl GraphqlTransport for Gated {
  type Error = std::convert::Infallible;

  async fn execute(
    &self,
    request: &GraphqlRequest,
    headers: &HasuraHeaders,
  ) -> Result<GraphqlResponse, Self::Error> {
    if request.operation_name == self.hold {
      self.arrived.notify_one();
      if let Ok(permit) = self.gate.acquire().await {
        permit.forget();
      }
    }
    self.inner.execute(request, headers).await
  }
}

#[tokio::test]
async fn fetch_in_flight_at_logout_does_not_refill_cache() {
  let gated = Arc::new(Gated {
    inner:   FakeHasura::new(),
    hold:    "ProductsList",
    arrived: Notify::new(),
    gate:    Semaphore::new(0),
  });
  gated.inner.seed_product("A-1", "Arroz", 3000.0);
  let hash = hash_password("1234").unwrap();
  gated.inner.seed_user("ana@example.com", &hash, "admin", true);

  let client = GraphqlClient::with_shared(Arc::clone(&gated));
  let backend = Backend::new(client.clone());
  let auth = AuthService::new(
    client,
    SessionStore::new(MemoryStorage::new()),
    PasswordPolicy::strict(),
  );

  let mut session = auth.login("ana@example.com", "1234").await.unwrap();
  let mut admin_list = backend.products.watch_list(&session);
  gated.arrived.notified().await;

  auth.logout(&mut session).await;
  assert!(backend.client.cache().is_empty());

  gated.gate.add_permits(1);
  for _ in 0..8 {
    tokio::task::yield_now().await;
  }
  assert!(backend.client.cache().is_empty());
  assert!(admin_list.poll().is_none());

  gated.gate.add_permits(1);
  let mut public_list = backend.products.watch_list(&session);
  let first = public_list.next().await.unwrap();
  assert_eq!(first.origin, Origin::Network);
}
