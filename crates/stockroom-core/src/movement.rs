//! Stock movements: inventory-affecting events.
//!
//! Movements are recorded independently of inventory rows; recording one does
//! not change any quantity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{product::ProductRef, user::UserRef, warehouse::WarehouseRef};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
  Inbound,
  Outbound,
  Transfer,
  Adjustment,
}

impl MovementType {
  pub const ALL: [MovementType; 4] = [
    MovementType::Inbound,
    MovementType::Outbound,
    MovementType::Transfer,
    MovementType::Adjustment,
  ];
}

/// A movement row as returned by the `stock_movements` list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
  pub id:           Uuid,
  pub created_at:   DateTime<Utc>,
  pub user_id:      Uuid,
  pub product_id:   Uuid,
  pub warehouse_id: Option<Uuid>,
  #[serde(rename = "type")]
  pub kind:         MovementType,
  #[serde(deserialize_with = "crate::numeric::deserialize")]
  pub quantity:     f64,
  pub reason:       Option<String>,
  pub active:       bool,
  #[serde(default)]
  pub user:         Option<UserRef>,
  #[serde(default)]
  pub product:      Option<ProductRef>,
  #[serde(default)]
  pub warehouse:    Option<WarehouseRef>,
}

/// Input to `insert_stock_movements_one`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMovement {
  pub user_id:      Uuid,
  pub product_id:   Uuid,
  pub warehouse_id: Option<Uuid>,
  #[serde(rename = "type")]
  pub kind:         MovementType,
  pub quantity:     f64,
  pub reason:       Option<String>,
  pub active:       bool,
}

/// Partial update (`_set`) for a movement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovementPatch {
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub kind:         Option<MovementType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub product_id:   Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub warehouse_id: Option<Option<Uuid>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quantity:     Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason:       Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub active:       Option<bool>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn decodes_hasura_row() {
    let m: Movement = serde_json::from_value(json!({
      "id": "6f0d1b52-95c4-4ac1-8f55-0d6d6b8a0f01",
      "created_at": "2024-03-01T10:15:00.123456+00:00",
      "user_id": "1c1a8f8e-4d5e-4c38-9f3c-0a3b8b0f6a11",
      "product_id": "2d2b9f9f-5e6f-4d49-a04d-1b4c9c1f7b22",
      "warehouse_id": null,
      "type": "TRANSFER",
      "quantity": "3",
      "reason": null,
      "active": true,
      "product": { "id": "2d2b9f9f-5e6f-4d49-a04d-1b4c9c1f7b22", "name": "Arroz", "sku": "ARR-1" }
    }))
    .unwrap();
    assert_eq!(m.kind, MovementType::Transfer);
    assert_eq!(m.quantity, 3.0);
    assert!(m.warehouse.is_none());
    assert_eq!(m.product.unwrap().sku, "ARR-1");
  }

  #[test]
  fn type_round_trips_through_strum_and_serde() {
    assert_eq!(MovementType::Adjustment.to_string(), "ADJUSTMENT");
    assert_eq!("INBOUND".parse::<MovementType>().unwrap(), MovementType::Inbound);
    assert_eq!(
      serde_json::to_value(MovementType::Outbound).unwrap(),
      json!("OUTBOUND")
    );
  }
}
