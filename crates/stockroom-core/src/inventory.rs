//! Inventory rows: current quantity per (product, warehouse).
//!
//! Rows carry no history: an update overwrites the quantity in place. Nothing
//! here is derived from stock movements; the two are maintained independently.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{product::ProductRef, warehouse::WarehouseRef};

/// Composite primary key of an inventory row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryKey {
  pub product_id:   Uuid,
  pub warehouse_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
  pub product_id:   Uuid,
  pub warehouse_id: Uuid,
  #[serde(deserialize_with = "crate::numeric::deserialize")]
  pub quantity:     f64,
  #[serde(default)]
  pub product:      Option<ProductRef>,
  #[serde(default)]
  pub warehouse:    Option<WarehouseRef>,
}

impl InventoryRow {
  pub fn key(&self) -> InventoryKey {
    InventoryKey {
      product_id:   self.product_id,
      warehouse_id: self.warehouse_id,
    }
  }
}
