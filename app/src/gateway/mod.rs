// app/src/gateway/mod.rs

//! Table-scoped CRUD against the relational store.
//!
//! Rows cross this boundary as JSON objects and are decoded into typed models
//! right after the call (`decode_row`, `take_embedded`). Joins are resolved by
//! follow-up `In` queries and embedded under the join alias.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryGateway, Op};
pub use postgres::PgGateway;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("Unique constraint violated on '{table}': {detail}")]
  Conflict { table: String, detail: String },

  #[error("Invalid query on '{table}': {message}")]
  InvalidQuery { table: String, message: String },

  #[error("Could not decode a '{table}' row: {source}")]
  Decode {
    table: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("Data service unavailable: {0}")]
  Unavailable(String),

  #[error("Database error: {0}")]
  Backend(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  Eq(String, Value),
  In(String, Vec<Value>),
}

impl Filter {
  pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
    Filter::Eq(column.into(), value.into())
  }

  pub fn id(id: Uuid) -> Self {
    Filter::eq("id", id.to_string())
  }

  pub fn column(&self) -> &str {
    match self {
      Filter::Eq(c, _) | Filter::In(c, _) => c,
    }
  }

  pub fn matches(&self, row: &Row) -> bool {
    let cell = row.get(self.column()).and_then(value_text);
    match self {
      Filter::Eq(_, expected) => cell == value_text(expected),
      Filter::In(_, candidates) => cell.is_some_and(|c| candidates.iter().any(|v| value_text(v).as_deref() == Some(c.as_str()))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
  pub column: String,
  pub ascending: bool,
}

impl OrderBy {
  pub fn asc(column: impl Into<String>) -> Self {
    Self { column: column.into(), ascending: true }
  }

  pub fn desc(column: impl Into<String>) -> Self {
    Self { column: column.into(), ascending: false }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKind {
  /// Embeds the single row of `table` whose `id` equals `row[local_key]`, or `null`.
  BelongsTo { local_key: String },
  /// Embeds every row of `table` whose `foreign_key` equals `row.id`, as an array.
  HasMany { foreign_key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
  pub alias: String,
  pub table: String,
  pub kind: JoinKind,
  pub order: Vec<OrderBy>,
  pub joins: Vec<Join>,
}

impl Join {
  pub fn belongs_to(alias: impl Into<String>, table: impl Into<String>, local_key: impl Into<String>) -> Self {
    Self {
      alias: alias.into(),
      table: table.into(),
      kind: JoinKind::BelongsTo { local_key: local_key.into() },
      order: Vec::new(),
      joins: Vec::new(),
    }
  }

  pub fn has_many(alias: impl Into<String>, table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
    Self {
      alias: alias.into(),
      table: table.into(),
      kind: JoinKind::HasMany { foreign_key: foreign_key.into() },
      order: Vec::new(),
      joins: Vec::new(),
    }
  }

  /// Nests `join` under the rows embedded by this join.
  pub fn with(mut self, join: Join) -> Self {
    self.joins.push(join);
    self
  }

  pub fn order_by(mut self, order: OrderBy) -> Self {
    self.order.push(order);
    self
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
  pub table: String,
  pub filters: Vec<Filter>,
  pub order: Vec<OrderBy>,
  pub joins: Vec<Join>,
  pub limit: Option<usize>,
}

impl Select {
  pub fn from(table: impl Into<String>) -> Self {
    Self {
      table: table.into(),
      filters: Vec::new(),
      order: Vec::new(),
      joins: Vec::new(),
      limit: None,
    }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filters.push(filter);
    self
  }

  pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
    self.filter(Filter::eq(column, value))
  }

  pub fn order_by(mut self, order: OrderBy) -> Self {
    self.order.push(order);
    self
  }

  pub fn join(mut self, join: Join) -> Self {
    self.joins.push(join);
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

#[async_trait]
pub trait Gateway: Send + Sync {
  /// Single-table select.
  async fn fetch(
    &self,
    table: &str,
    filters: &[Filter],
    order: &[OrderBy],
    limit: Option<usize>,
  ) -> Result<Vec<Row>, GatewayError>;

  /// Inserts all rows or none; returns the stored rows with defaults filled in.
  async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, GatewayError>;

  /// Applies `patch` to every matching row. `filters` must not be empty.
  async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<u64, GatewayError>;

  /// Deletes every matching row. `filters` must not be empty.
  async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, GatewayError>;

  async fn select(&self, query: &Select) -> Result<Vec<Row>, GatewayError> {
    let mut rows = self.fetch(&query.table, &query.filters, &query.order, query.limit).await?;
    resolve_joins(self, &mut rows, &query.joins).await?;
    Ok(rows)
  }

  /// First matching row, if any. A miss is not an error.
  async fn find_one(&self, table: &str, filters: &[Filter]) -> Result<Option<Row>, GatewayError> {
    Ok(self.fetch(table, filters, &[], Some(1)).await?.into_iter().next())
  }

  async fn insert_one(&self, table: &str, row: Row) -> Result<Row, GatewayError> {
    self.insert(table, vec![row]).await?.into_iter().next().ok_or_else(|| GatewayError::InvalidQuery {
      table: table.to_string(),
      message: "insert returned no row".to_string(),
    })
  }
}

fn resolve_joins<'a, G>(gateway: &'a G, rows: &'a mut Vec<Row>, joins: &'a [Join]) -> BoxFuture<'a, Result<(), GatewayError>>
where
  G: Gateway + ?Sized,
{
  Box::pin(async move {
    for join in joins {
      match &join.kind {
        JoinKind::BelongsTo { local_key } => {
          let keys = distinct_values(rows.iter().filter_map(|r| r.get(local_key)));
          let mut related = if keys.is_empty() {
            Vec::new()
          } else {
            gateway.fetch(&join.table, &[Filter::In("id".to_string(), keys)], &join.order, None).await?
          };
          resolve_joins(gateway, &mut related, &join.joins).await?;

          let by_id: HashMap<String, Row> = related
            .into_iter()
            .filter_map(|r| r.get("id").and_then(value_text).map(|k| (k, r)))
            .collect();
          for row in rows.iter_mut() {
            let embedded = row
              .get(local_key)
              .and_then(value_text)
              .and_then(|k| by_id.get(&k))
              .cloned()
              .map(Value::Object)
              .unwrap_or(Value::Null);
            row.insert(join.alias.clone(), embedded);
          }
        }
        JoinKind::HasMany { foreign_key } => {
          let ids = distinct_values(rows.iter().filter_map(|r| r.get("id")));
          let mut related = if ids.is_empty() {
            Vec::new()
          } else {
            gateway.fetch(&join.table, &[Filter::In(foreign_key.clone(), ids)], &join.order, None).await?
          };
          resolve_joins(gateway, &mut related, &join.joins).await?;

          let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
          for r in related {
            if let Some(k) = r.get(foreign_key).and_then(value_text) {
              grouped.entry(k).or_default().push(Value::Object(r));
            }
          }
          for row in rows.iter_mut() {
            let children = row
              .get("id")
              .and_then(value_text)
              .and_then(|k| grouped.get(&k))
              .cloned()
              .unwrap_or_default();
            row.insert(join.alias.clone(), Value::Array(children));
          }
        }
      }
    }
    Ok(())
  })
}

fn distinct_values<'v>(values: impl Iterator<Item = &'v Value>) -> Vec<Value> {
  let mut seen = std::collections::HashSet::new();
  values
    .filter(|v| !v.is_null())
    .filter(|v| value_text(v).is_some_and(|t| seen.insert(t)))
    .cloned()
    .collect()
}

/// Text form used for comparisons; matches Postgres' `::text` rendering for strings, numbers and booleans.
pub fn value_text(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Number(n) => Some(n.to_string()),
    other => Some(other.to_string()),
  }
}

/// Ordering for sorting rows. Numeric text compares numerically; nulls sort last.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
  let a = a.filter(|v| !v.is_null());
  let b = b.filter(|v| !v.is_null());
  match (a, b) {
    (None, None) => Ordering::Equal,
    (None, Some(_)) => Ordering::Greater,
    (Some(_), None) => Ordering::Less,
    (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
    (Some(x), Some(y)) => {
      let (tx, ty) = (value_text(x).unwrap_or_default(), value_text(y).unwrap_or_default());
      match (tx.parse::<f64>(), ty.parse::<f64>()) {
        (Ok(nx), Ok(ny)) => nx.partial_cmp(&ny).unwrap_or(Ordering::Equal),
        _ => tx.cmp(&ty),
      }
    }
  }
}

/// Fills the `id` and `created_at` columns every table carries, plus table-level defaults.
pub fn apply_defaults(table: &str, row: &mut Row, now: DateTime<Utc>) {
  if row.get("id").map_or(true, Value::is_null) {
    row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
  }
  if table != "package_itinerary" && row.get("created_at").map_or(true, Value::is_null) {
    row.insert(
      "created_at".to_string(),
      Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
  }
  let table_defaults: &[(&str, &str)] = match table {
    "orders" => &[("status", "processing"), ("payment_status", "pending")],
    "bookings" => &[("status", "confirmed")],
    _ => &[],
  };
  for (column, default) in table_defaults {
    if row.get(*column).map_or(true, Value::is_null) {
      row.insert(column.to_string(), Value::String(default.to_string()));
    }
  }
}

pub fn decode_row<T: DeserializeOwned>(table: &str, row: Row) -> Result<T, GatewayError> {
  serde_json::from_value(Value::Object(row)).map_err(|source| GatewayError::Decode {
    table: table.to_string(),
    source,
  })
}

pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Row>) -> Result<Vec<T>, GatewayError> {
  rows.into_iter().map(|r| decode_row(table, r)).collect()
}

pub fn encode_row<T: Serialize>(table: &str, value: &T) -> Result<Row, GatewayError> {
  match serde_json::to_value(value) {
    Ok(Value::Object(row)) => Ok(row),
    Ok(_) => Err(GatewayError::InvalidQuery {
      table: table.to_string(),
      message: "row must serialize to a JSON object".to_string(),
    }),
    Err(source) => Err(GatewayError::Decode {
      table: table.to_string(),
      source,
    }),
  }
}

/// Removes the single row embedded under `alias` and decodes it. `null` or absent yields `None`.
pub fn take_embedded<T: DeserializeOwned>(row: &mut Row, alias: &str, table: &str) -> Result<Option<T>, GatewayError> {
  match row.remove(alias) {
    None | Some(Value::Null) => Ok(None),
    Some(value) => serde_json::from_value(value).map(Some).map_err(|source| GatewayError::Decode {
      table: table.to_string(),
      source,
    }),
  }
}

/// Removes the rows embedded under `alias` by a has-many join and decodes them.
pub fn take_embedded_many(row: &mut Row, alias: &str) -> Vec<Row> {
  match row.remove(alias) {
    Some(Value::Array(values)) => values
      .into_iter()
      .filter_map(|v| match v {
        Value::Object(r) => Some(r),
        _ => None,
      })
      .collect(),
    _ => Vec::new(),
  }
}
