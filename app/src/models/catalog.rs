// app/src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
  pub id: Uuid,
  pub name: String,
  pub country: String,
  pub description: String,
  pub image_url: String,
  #[serde(default)]
  pub images: Option<Vec<String>>,
  #[serde(default)]
  pub featured: Option<bool>,
  #[serde(default)]
  pub best_time_to_visit: Option<String>,
  #[serde(default)]
  pub highlights: Option<Vec<String>>,
  #[serde(default)]
  pub entry_fee: Option<String>,
  #[serde(default)]
  pub visiting_hours: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationSummary {
  pub name: String,
  pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
  pub id: Uuid,
  #[serde(default)]
  pub destination_id: Option<Uuid>,
  pub name: String,
  pub description: String,
  pub budget_category: String,
  pub price_per_night: Decimal,
  pub rating: Decimal,
  pub image_url: String,
  #[serde(default)]
  pub amenities: Option<Vec<String>>,
  #[serde(default)]
  pub contact_number: Option<String>,
  #[serde(default)]
  pub distance_from_center: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPackage {
  pub id: Uuid,
  #[serde(default)]
  pub destination_id: Option<Uuid>,
  pub name: String,
  pub description: String,
  pub duration_days: i32,
  pub duration_nights: i32,
  pub price: Decimal,
  pub image_url: String,
  #[serde(default)]
  pub includes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDestination {
  pub id: Uuid,
  pub user_id: Uuid,
  pub destination_id: Uuid,
  pub created_at: DateTime<Utc>,
}
