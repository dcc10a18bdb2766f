// app/src/models/order_item.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  /// Unit price captured at purchase time.
  pub price: Decimal,
  pub created_at: DateTime<Utc>,
}

impl OrderItem {
  pub fn line_total(&self) -> Decimal {
    self.price.saturating_mul(Decimal::from(self.quantity))
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
}
