// app/src/models/cart_item.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Product;

/// Upper bound for the quantity of one cart or order line.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// One row per (user, product); quantity is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
}

/// A cart row joined with its product; drives pricing and order-item creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub product_id: Uuid,
  pub name: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub image_url: String,
}

impl LineItem {
  pub fn from_product(product: &Product, quantity: i32) -> Self {
    Self {
      product_id: product.id,
      name: product.name.clone(),
      unit_price: product.price,
      quantity,
      image_url: product.image_url.clone(),
    }
  }

  pub fn line_total(&self) -> Decimal {
    self.unit_price.saturating_mul(Decimal::from(self.quantity))
  }
}
