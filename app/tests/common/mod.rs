// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;
use wanderkart::config::AppConfig;
use wanderkart::gateway::{decode_row, Row};
use wanderkart::gateway::memory::MemoryGateway;
use wanderkart::models::Product;
use wanderkart::notify::NoticeBuffer;
use wanderkart::services::payment_gateway::SimulatedPaymentGateway;
use wanderkart::session::RequestContext;
use wanderkart::state::AppState;

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

pub fn dec(raw: &str) -> Decimal {
  Decimal::from_str(raw).unwrap()
}

pub fn row(value: Value) -> Row {
  match value {
    Value::Object(row) => row,
    other => panic!("expected a JSON object, got {}", other),
  }
}

/// Shared state over an in-memory gateway and an instant payment simulator.
pub struct Harness {
  pub state: AppState,
  pub gateway: Arc<MemoryGateway>,
  pub payments: Arc<SimulatedPaymentGateway>,
}

impl Harness {
  pub fn new() -> Self {
    Self::with_gateway(MemoryGateway::new())
  }

  pub fn with_gateway(gateway: MemoryGateway) -> Self {
    setup_tracing();
    let gateway = Arc::new(gateway);
    let payments = Arc::new(SimulatedPaymentGateway::new(Duration::from_millis(5)));
    let config = AppConfig {
      payment_latency: Duration::from_millis(5),
      ..AppConfig::default()
    };
    let state = AppState::new(config, gateway.clone(), payments.clone());
    Self {
      state,
      gateway,
      payments,
    }
  }

  /// A signed-in caller and the buffer its notices land in.
  pub fn user(&self) -> (RequestContext, Arc<NoticeBuffer>) {
    self.user_with_id(Uuid::new_v4())
  }

  pub fn user_with_id(&self, user_id: Uuid) -> (RequestContext, Arc<NoticeBuffer>) {
    let notices = Arc::new(NoticeBuffer::new());
    (RequestContext::signed_in(user_id, notices.clone()), notices)
  }

  pub fn anonymous(&self) -> (RequestContext, Arc<NoticeBuffer>) {
    let notices = Arc::new(NoticeBuffer::new());
    (RequestContext::anonymous(notices.clone()), notices)
  }

  pub fn product(&self, name: &str, price: &str) -> Product {
    let rows = self
      .gateway
      .seed(
        "products",
        vec![row(json!({
          "name": name,
          "description": format!("{} for testing", name),
          "price": price,
          "stock": 10,
          "category": "Testing",
          "image_url": format!("https://images.example.com/{}.jpg", name.to_lowercase()),
        }))],
      )
      .unwrap();
    decode_row("products", rows.into_iter().next().unwrap()).unwrap()
  }

  /// Writes a cart row directly, bypassing the cart pipeline.
  pub fn cart_row(&self, user_id: Uuid, product_id: Uuid, quantity: i32) {
    self
      .gateway
      .seed(
        "cart_items",
        vec![row(json!({
          "user_id": user_id.to_string(),
          "product_id": product_id.to_string(),
          "quantity": quantity,
        }))],
      )
      .unwrap();
  }

  pub fn count(&self, table: &str) -> usize {
    self.gateway.rows(table).len()
  }

  pub fn rows_for(&self, table: &str, column: &str, value: &str) -> Vec<Row> {
    self
      .gateway
      .rows(table)
      .into_iter()
      .filter(|r| r.get(column).and_then(|v| v.as_str()) == Some(value))
      .collect()
  }
}
