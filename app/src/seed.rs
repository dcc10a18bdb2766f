// app/src/seed.rs

//! Demo catalog for the in-memory gateway.

use crate::gateway::memory::MemoryGateway;
use crate::gateway::{value_text, GatewayError, Row};
use serde_json::{json, Value};
use tracing::info;

fn rows(values: Vec<Value>) -> Vec<Row> {
  values
    .into_iter()
    .filter_map(|v| match v {
      Value::Object(row) => Some(row),
      _ => None,
    })
    .collect()
}

fn id_of(row: &Row) -> Value {
  row.get("id").and_then(value_text).map(Value::String).unwrap_or(Value::Null)
}

/// Seeds destinations, hotels, packages and products. Returns the number of rows written.
pub fn seed_catalog(gateway: &MemoryGateway) -> Result<usize, GatewayError> {
  let destinations = gateway.seed(
    "destinations",
    rows(vec![
      json!({
        "name": "Goa",
        "country": "India",
        "description": "Beaches, churches and seafood shacks along the Konkan coast.",
        "image_url": "https://images.example.com/goa.jpg",
        "featured": true,
        "best_time_to_visit": "November to February",
        "highlights": ["Baga Beach", "Basilica of Bom Jesus", "Dudhsagar Falls"],
      }),
      json!({
        "name": "Jaipur",
        "country": "India",
        "description": "Forts and palaces of the Pink City.",
        "image_url": "https://images.example.com/jaipur.jpg",
        "featured": true,
        "best_time_to_visit": "October to March",
        "highlights": ["Amber Fort", "Hawa Mahal", "City Palace"],
        "entry_fee": "INR 200",
        "visiting_hours": "8:00 AM - 5:30 PM",
      }),
      json!({
        "name": "Munnar",
        "country": "India",
        "description": "Tea estates and misty hills in the Western Ghats.",
        "image_url": "https://images.example.com/munnar.jpg",
        "featured": false,
        "best_time_to_visit": "September to May",
      }),
    ]),
  )?;
  let goa = id_of(&destinations[0]);
  let jaipur = id_of(&destinations[1]);
  let munnar = id_of(&destinations[2]);

  let hotels = gateway.seed(
    "hotels",
    rows(vec![
      json!({
        "destination_id": goa,
        "name": "Sea Breeze Resort",
        "description": "Beachfront rooms with a pool.",
        "budget_category": "luxury",
        "price_per_night": "6500.00",
        "rating": "4.6",
        "image_url": "https://images.example.com/sea-breeze.jpg",
        "amenities": ["Pool", "Wi-Fi", "Spa"],
      }),
      json!({
        "destination_id": jaipur,
        "name": "Haveli Heritage Stay",
        "description": "Restored haveli near the old city.",
        "budget_category": "mid-range",
        "price_per_night": "3200.00",
        "rating": "4.3",
        "image_url": "https://images.example.com/haveli.jpg",
        "amenities": ["Breakfast", "Rooftop"],
      }),
      json!({
        "destination_id": munnar,
        "name": "Tea Valley Homestay",
        "description": "Family-run rooms overlooking the estates.",
        "budget_category": "budget",
        "price_per_night": "1400.00",
        "rating": "4.1",
        "image_url": "https://images.example.com/tea-valley.jpg",
      }),
    ]),
  )?;

  let packages = gateway.seed(
    "packages",
    rows(vec![
      json!({
        "destination_id": goa,
        "name": "Goa Beach Escape",
        "description": "Four days of sun and sand.",
        "duration_days": 4,
        "duration_nights": 3,
        "price": "15999.00",
        "image_url": "https://images.example.com/goa-package.jpg",
        "includes": ["Hotel", "Breakfast", "Airport transfer"],
      }),
      json!({
        "destination_id": jaipur,
        "name": "Royal Rajasthan",
        "description": "Forts, bazaars and a desert evening.",
        "duration_days": 5,
        "duration_nights": 4,
        "price": "22999.00",
        "image_url": "https://images.example.com/rajasthan.jpg",
        "includes": ["Hotel", "Guide", "Sightseeing"],
      }),
    ]),
  )?;

  let products = gateway.seed(
    "products",
    rows(vec![
      json!({
        "name": "Travel Backpack 40L",
        "description": "Carry-on sized with a laptop sleeve.",
        "price": "2499.00",
        "stock": 25,
        "category": "Bags",
        "image_url": "https://images.example.com/backpack.jpg",
      }),
      json!({
        "name": "Memory Foam Neck Pillow",
        "description": "Washable cover.",
        "price": "799.00",
        "stock": 60,
        "category": "Comfort",
        "image_url": "https://images.example.com/pillow.jpg",
      }),
      json!({
        "name": "Universal Travel Adapter",
        "description": "Works in 150+ countries.",
        "price": "1199.00",
        "stock": 0,
        "category": "Electronics",
        "image_url": "https://images.example.com/adapter.jpg",
      }),
    ]),
  )?;

  let written = destinations.len() + hotels.len() + packages.len() + products.len();
  info!(written, "Demo catalog seeded.");
  Ok(written)
}
