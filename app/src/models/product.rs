// app/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub price: Decimal,
  /// Read-only here; purchases do not decrement it.
  pub stock: i32,
  pub category: String,
  pub image_url: String,
  pub created_at: DateTime<Utc>,
}

impl Product {
  pub fn in_stock(&self) -> bool {
    self.stock > 0
  }

  /// Case-insensitive match on name or category.
  pub fn matches_search(&self, term: &str) -> bool {
    let term = term.to_lowercase();
    self.name.to_lowercase().contains(&term) || self.category.to_lowercase().contains(&term)
  }
}
