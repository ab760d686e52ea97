//! Warehouses (bodegas).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
  pub id:      Uuid,
  pub code:    String,
  pub name:    String,
  pub address: Option<String>,
  pub active:  bool,
}

/// Denormalised warehouse columns joined onto inventory and movement rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseRef {
  pub id:   Uuid,
  pub name: String,
  pub code: String,
}

/// Input to `insert_warehouses_one`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWarehouse {
  pub code:    String,
  pub name:    String,
  pub address: Option<String>,
  pub active:  bool,
}

/// Partial update (`_set`) for a warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarehousePatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub code:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub active:  Option<bool>,
}
