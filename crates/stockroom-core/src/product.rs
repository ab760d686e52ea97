//! Products: the catalogue of stockable items.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product row as returned by the `products` list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id:          Uuid,
  pub sku:         String,
  pub name:        String,
  pub description: Option<String>,
  pub unit:        String,
  #[serde(deserialize_with = "crate::numeric::deserialize")]
  pub price:       f64,
  pub active:      bool,
}

/// Denormalised product columns joined onto inventory and movement rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
  pub id:   Uuid,
  pub name: String,
  pub sku:  String,
}

/// Input to `insert_products_one`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
  pub sku:         String,
  pub name:        String,
  pub description: Option<String>,
  pub unit:        String,
  pub price:       f64,
  pub active:      bool,
}

impl NewProduct {
  /// Unit used when the form leaves it blank.
  pub const DEFAULT_UNIT: &'static str = "UND";
}

/// Partial update (`_set`) for a product. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sku:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:        Option<String>,
  /// `Some(None)` clears the description.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unit:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub price:       Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub active:      Option<bool>,
}
