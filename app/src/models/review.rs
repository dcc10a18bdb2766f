// app/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub order_id: Uuid,
  pub rating: i32,
  #[serde(default)]
  pub review_text: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub order_id: Uuid,
  pub rating: i32,
  pub review_text: Option<String>,
}
