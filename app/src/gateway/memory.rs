// app/src/gateway/memory.rs

//! In-process gateway: one `Vec<Row>` per table behind a `parking_lot` lock.
//! Enforces the same unique keys as the migrations and supports one-shot
//! failure injection per (table, operation).

use super::{apply_defaults, compare_values, Filter, Gateway, GatewayError, OrderBy, Row};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Select,
  Insert,
  Update,
  Delete,
}

const ID_ONLY: &[&[&str]] = &[&["id"]];
const CART_ITEMS_KEYS: &[&[&str]] = &[&["id"], &["user_id", "product_id"]];
const REVIEWS_KEYS: &[&[&str]] = &[&["id"], &["order_id", "product_id"]];
const SAVED_DESTINATIONS_KEYS: &[&[&str]] = &[&["id"], &["user_id", "destination_id"]];

fn unique_keys(table: &str) -> &'static [&'static [&'static str]] {
  match table {
    "cart_items" => CART_ITEMS_KEYS,
    "reviews" => REVIEWS_KEYS,
    "saved_destinations" => SAVED_DESTINATIONS_KEYS,
    _ => ID_ONLY,
  }
}

/// Values of `columns` in `row`; `None` if any is null, since nulls never collide.
fn key_of(row: &Row, columns: &[&str]) -> Option<Vec<String>> {
  columns.iter().map(|c| row.get(*c).and_then(super::value_text)).collect()
}

#[derive(Default)]
pub struct MemoryGateway {
  tables: RwLock<HashMap<String, Vec<Row>>>,
  /// (table, op, matching calls still to let through)
  injected_failures: Mutex<Vec<(String, Op, usize)>>,
  last_timestamp: Mutex<Option<DateTime<Utc>>>,
  latency: Option<Duration>,
}

impl MemoryGateway {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every operation sleeps `latency` before touching the tables, so concurrent callers interleave.
  pub fn with_latency(latency: Duration) -> Self {
    Self {
      latency: Some(latency),
      ..Self::default()
    }
  }

  /// The next `op` on `table` fails with `GatewayError::Unavailable`.
  pub fn fail_next(&self, table: &str, op: Op) {
    self.fail_nth(table, op, 1);
  }

  /// The `n`-th upcoming `op` on `table` (1-based) fails; earlier ones succeed.
  pub fn fail_nth(&self, table: &str, op: Op, n: usize) {
    self.injected_failures.lock().push((table.to_string(), op, n.saturating_sub(1)));
  }

  /// Inserts rows synchronously, bypassing latency and injected failures.
  pub fn seed(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, GatewayError> {
    self.insert_rows(table, rows)
  }

  /// Snapshot of a table's rows in insertion order.
  pub fn rows(&self, table: &str) -> Vec<Row> {
    self.tables.read().get(table).cloned().unwrap_or_default()
  }

  async fn before_op(&self, table: &str, op: Op) -> Result<(), GatewayError> {
    if let Some(latency) = self.latency {
      tokio::time::sleep(latency).await;
    }
    let injected = {
      let mut failures = self.injected_failures.lock();
      let mut fired = None;
      for (idx, (t, o, skip)) in failures.iter_mut().enumerate() {
        if t != table || *o != op {
          continue;
        }
        if *skip == 0 {
          fired = Some(idx);
          break;
        }
        *skip -= 1;
      }
      match fired {
        Some(idx) => {
          failures.remove(idx);
          true
        }
        None => false,
      }
    };
    if injected {
      warn!(table, ?op, "Injected gateway failure.");
      return Err(GatewayError::Unavailable(format!("injected {:?} failure on '{}'", op, table)));
    }
    Ok(())
  }

  /// Strictly increasing timestamps so `created_at` ordering is deterministic.
  fn next_timestamp(&self) -> DateTime<Utc> {
    let mut last = self.last_timestamp.lock();
    let mut now = Utc::now();
    if let Some(prev) = *last {
      if now <= prev {
        now = prev + ChronoDuration::microseconds(1);
      }
    }
    *last = Some(now);
    now
  }

  fn insert_rows(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, GatewayError> {
    let prepared: Vec<Row> = rows
      .into_iter()
      .map(|mut row| {
        apply_defaults(table, &mut row, self.next_timestamp());
        row
      })
      .collect();

    let mut tables = self.tables.write();
    let existing = tables.entry(table.to_string()).or_default();
    for (idx, row) in prepared.iter().enumerate() {
      for columns in unique_keys(table) {
        let Some(key) = key_of(row, columns) else { continue };
        let collides = existing
          .iter()
          .chain(prepared[..idx].iter())
          .any(|other| key_of(other, columns).as_ref() == Some(&key));
        if collides {
          return Err(GatewayError::Conflict {
            table: table.to_string(),
            detail: format!("duplicate key ({}) = ({})", columns.join(", "), key.join(", ")),
          });
        }
      }
    }
    existing.extend(prepared.iter().cloned());
    debug!(table, inserted = prepared.len(), "Memory gateway insert.");
    Ok(prepared)
  }
}

fn require_filters(table: &str, filters: &[Filter]) -> Result<(), GatewayError> {
  if filters.is_empty() {
    return Err(GatewayError::InvalidQuery {
      table: table.to_string(),
      message: "refusing to modify every row; at least one filter is required".to_string(),
    });
  }
  Ok(())
}

#[async_trait]
impl Gateway for MemoryGateway {
  async fn fetch(
    &self,
    table: &str,
    filters: &[Filter],
    order: &[OrderBy],
    limit: Option<usize>,
  ) -> Result<Vec<Row>, GatewayError> {
    self.before_op(table, Op::Select).await?;
    let mut rows: Vec<Row> = {
      let tables = self.tables.read();
      tables
        .get(table)
        .map(|rows| rows.iter().filter(|r| filters.iter().all(|f| f.matches(r))).cloned().collect())
        .unwrap_or_default()
    };
    rows.sort_by(|a, b| {
      order
        .iter()
        .map(|o| {
          let ord = compare_values(a.get(&o.column), b.get(&o.column));
          if o.ascending {
            ord
          } else {
            ord.reverse()
          }
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(limit) = limit {
      rows.truncate(limit);
    }
    Ok(rows)
  }

  async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, GatewayError> {
    self.before_op(table, Op::Insert).await?;
    self.insert_rows(table, rows)
  }

  async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<u64, GatewayError> {
    require_filters(table, filters)?;
    self.before_op(table, Op::Update).await?;

    let mut tables = self.tables.write();
    let rows = tables.entry(table.to_string()).or_default();
    let matched: Vec<usize> = rows
      .iter()
      .enumerate()
      .filter(|(_, r)| filters.iter().all(|f| f.matches(r)))
      .map(|(idx, _)| idx)
      .collect();

    let mut updated = rows.clone();
    for idx in &matched {
      for (column, value) in &patch {
        updated[*idx].insert(column.clone(), value.clone());
      }
    }
    for idx in &matched {
      for columns in unique_keys(table) {
        let Some(key) = key_of(&updated[*idx], columns) else { continue };
        let collides = updated
          .iter()
          .enumerate()
          .any(|(other, r)| other != *idx && key_of(r, columns).as_ref() == Some(&key));
        if collides {
          return Err(GatewayError::Conflict {
            table: table.to_string(),
            detail: format!("duplicate key ({}) after update", columns.join(", ")),
          });
        }
      }
    }
    *rows = updated;
    debug!(table, updated = matched.len(), "Memory gateway update.");
    Ok(matched.len() as u64)
  }

  async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, GatewayError> {
    require_filters(table, filters)?;
    self.before_op(table, Op::Delete).await?;

    let mut tables = self.tables.write();
    let rows = tables.entry(table.to_string()).or_default();
    let before = rows.len();
    rows.retain(|r| !filters.iter().all(|f| f.matches(r)));
    let deleted = (before - rows.len()) as u64;
    debug!(table, deleted, "Memory gateway delete.");
    Ok(deleted)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::gateway::{Join, Select};
  use serde_json::{json, Value};

  fn row(value: Value) -> Row {
    match value {
      Value::Object(map) => map,
      _ => panic!("expected object"),
    }
  }

  #[tokio::test]
  async fn composite_unique_key_rejects_second_cart_row() {
    let gw = MemoryGateway::new();
    gw.insert("cart_items", vec![row(json!({"user_id": "u1", "product_id": "p1", "quantity": 1}))])
      .await
      .unwrap();
    let err = gw
      .insert("cart_items", vec![row(json!({"user_id": "u1", "product_id": "p1", "quantity": 3}))])
      .await
      .unwrap_err();
    assert!(matches!(err, GatewayError::Conflict { .. }));
    assert_eq!(gw.rows("cart_items").len(), 1);
  }

  #[tokio::test]
  async fn batch_insert_is_all_or_nothing() {
    let gw = MemoryGateway::new();
    let err = gw
      .insert(
        "reviews",
        vec![
          row(json!({"order_id": "o1", "product_id": "p1", "rating": 5})),
          row(json!({"order_id": "o1", "product_id": "p1", "rating": 4})),
        ],
      )
      .await
      .unwrap_err();
    assert!(matches!(err, GatewayError::Conflict { .. }));
    assert!(gw.rows("reviews").is_empty());
  }

  #[tokio::test]
  async fn injected_failure_fires_once() {
    let gw = MemoryGateway::new();
    gw.fail_next("orders", Op::Insert);
    assert!(matches!(
      gw.insert("orders", vec![row(json!({"user_id": "u"}))]).await,
      Err(GatewayError::Unavailable(_))
    ));
    let stored = gw.insert("orders", vec![row(json!({"user_id": "u"}))]).await.unwrap();
    assert_eq!(stored[0]["status"], json!("processing"));
  }

  #[tokio::test]
  async fn nth_failure_lets_earlier_calls_through() {
    let gw = MemoryGateway::new();
    gw.fail_nth("products", Op::Select, 2);
    assert!(gw.fetch("products", &[], &[], None).await.is_ok());
    assert!(matches!(
      gw.fetch("products", &[], &[], None).await,
      Err(GatewayError::Unavailable(_))
    ));
    assert!(gw.fetch("products", &[], &[], None).await.is_ok());
  }

  #[tokio::test]
  async fn update_and_delete_require_filters() {
    let gw = MemoryGateway::new();
    assert!(matches!(
      gw.delete("cart_items", &[]).await,
      Err(GatewayError::InvalidQuery { .. })
    ));
    assert!(matches!(
      gw.update("cart_items", Row::new(), &[]).await,
      Err(GatewayError::InvalidQuery { .. })
    ));
  }

  #[tokio::test]
  async fn select_resolves_nested_joins() {
    let gw = MemoryGateway::new();
    gw.seed("products", vec![row(json!({"id": "p1", "name": "Backpack"}))]).unwrap();
    gw.seed("orders", vec![row(json!({"id": "o1", "user_id": "u"})), row(json!({"id": "o2", "user_id": "u"}))])
      .unwrap();
    gw.seed(
      "order_items",
      vec![row(json!({"order_id": "o1", "product_id": "p1", "quantity": 2}))],
    )
    .unwrap();

    let query = Select::from("orders")
      .eq("user_id", "u")
      .order_by(OrderBy::asc("id"))
      .join(Join::has_many("order_items", "order_items", "order_id").with(Join::belongs_to("product", "products", "product_id")));
    let rows = gw.select(&query).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["order_items"][0]["product"]["name"], json!("Backpack"));
    assert_eq!(rows[1]["order_items"], json!([]));
  }

  #[tokio::test]
  async fn fetch_orders_and_limits() {
    let gw = MemoryGateway::new();
    gw.seed(
      "packages",
      vec![
        row(json!({"name": "b", "price": "1200"})),
        row(json!({"name": "a", "price": "450.50"})),
        row(json!({"name": "c", "price": "99"})),
      ],
    )
    .unwrap();
    let rows = gw.fetch("packages", &[], &[OrderBy::asc("price")], Some(2)).await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("c"), json!("a")]);
  }
}
