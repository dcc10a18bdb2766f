// app/src/gateway/postgres.rs

//! Postgres gateway over `sqlx`. Rows travel as `jsonb` in both directions so
//! one code path serves every table.

use super::{apply_defaults, value_text, Filter, Gateway, GatewayError, OrderBy, Row};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier pattern is valid"));

/// Quotes a table or column name after checking it is a plain lowercase identifier.
fn ident(table: &str, name: &str) -> Result<String, GatewayError> {
  if IDENTIFIER.is_match(name) {
    Ok(format!("\"{}\"", name))
  } else {
    Err(GatewayError::InvalidQuery {
      table: table.to_string(),
      message: format!("invalid identifier '{}'", name),
    })
  }
}

fn map_sqlx_error(table: &str, err: sqlx::Error) -> GatewayError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return GatewayError::Conflict {
        table: table.to_string(),
        detail: db_err.message().to_string(),
      };
    }
  }
  match err {
    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => GatewayError::Unavailable(err.to_string()),
    other => GatewayError::Backend(other),
  }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, table: &str, filters: &[Filter]) -> Result<(), GatewayError> {
  for (idx, filter) in filters.iter().enumerate() {
    qb.push(if idx == 0 { " WHERE " } else { " AND " });
    let column = ident(table, filter.column())?;
    match filter {
      Filter::Eq(_, value) => match value_text(value) {
        Some(text) => {
          qb.push("t.").push(column).push("::text = ").push_bind(text);
        }
        None => {
          qb.push("t.").push(column).push(" IS NULL");
        }
      },
      Filter::In(_, values) => {
        let texts: Vec<String> = values.iter().filter_map(value_text).collect();
        qb.push("t.").push(column).push("::text = ANY(").push_bind(texts).push(")");
      }
    }
  }
  Ok(())
}

#[derive(Clone)]
pub struct PgGateway {
  pool: PgPool,
}

impl PgGateway {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self, GatewayError> {
    let pool = PgPoolOptions::new()
      .max_connections(10)
      .connect(database_url)
      .await
      .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
    info!("Successfully connected to the database.");
    Ok(Self::new(pool))
  }

  /// Applies the embedded migrations under `app/migrations`.
  pub async fn migrate(&self) -> Result<(), GatewayError> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| GatewayError::Unavailable(format!("migration failed: {}", e)))?;
    info!("Database migrations applied.");
    Ok(())
  }
}

#[async_trait]
impl Gateway for PgGateway {
  #[instrument(name = "PgGateway::fetch", skip(self, filters, order), err)]
  async fn fetch(
    &self,
    table: &str,
    filters: &[Filter],
    order: &[OrderBy],
    limit: Option<usize>,
  ) -> Result<Vec<Row>, GatewayError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT to_jsonb(t) FROM ");
    qb.push(ident(table, table)?).push(" AS t");
    push_filters(&mut qb, table, filters)?;
    for (idx, o) in order.iter().enumerate() {
      qb.push(if idx == 0 { " ORDER BY " } else { ", " });
      qb.push("t.").push(ident(table, &o.column)?).push(if o.ascending { " ASC NULLS LAST" } else { " DESC NULLS LAST" });
    }
    if let Some(limit) = limit {
      qb.push(" LIMIT ").push_bind(limit as i64);
    }

    let values: Vec<Value> = qb
      .build_query_scalar()
      .fetch_all(&self.pool)
      .await
      .map_err(|e| map_sqlx_error(table, e))?;
    debug!(rows = values.len(), "Fetched rows.");
    Ok(
      values
        .into_iter()
        .filter_map(|v| match v {
          Value::Object(row) => Some(row),
          _ => None,
        })
        .collect(),
    )
  }

  #[instrument(name = "PgGateway::insert", skip(self, rows), fields(rows = rows.len()), err)]
  async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, GatewayError> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }
    let now = Utc::now();
    let rows: Vec<Row> = rows
      .into_iter()
      .map(|mut row| {
        apply_defaults(table, &mut row, now);
        row
      })
      .collect();

    let mut columns: Vec<&str> = Vec::new();
    for row in &rows {
      for key in row.keys() {
        if !columns.contains(&key.as_str()) {
          columns.push(key.as_str());
        }
      }
    }
    let quoted: Vec<String> = columns.iter().map(|c| ident(table, c)).collect::<Result<_, _>>()?;
    let column_list = quoted.join(", ");
    let table_ident = ident(table, table)?;
    let payload = Value::Array(rows.iter().cloned().map(Value::Object).collect());

    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
    qb.push(&table_ident)
      .push(" AS t (")
      .push(&column_list)
      .push(") SELECT ")
      .push(&column_list)
      .push(" FROM jsonb_populate_recordset(NULL::")
      .push(&table_ident)
      .push(", ")
      .push_bind(Json(payload))
      .push(") RETURNING to_jsonb(t)");

    let values: Vec<Value> = qb
      .build_query_scalar()
      .fetch_all(&self.pool)
      .await
      .map_err(|e| map_sqlx_error(table, e))?;
    Ok(
      values
        .into_iter()
        .filter_map(|v| match v {
          Value::Object(row) => Some(row),
          _ => None,
        })
        .collect(),
    )
  }

  #[instrument(name = "PgGateway::update", skip(self, patch, filters), err)]
  async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<u64, GatewayError> {
    if filters.is_empty() || patch.is_empty() {
      return Err(GatewayError::InvalidQuery {
        table: table.to_string(),
        message: "update needs a non-empty patch and at least one filter".to_string(),
      });
    }
    let table_ident = ident(table, table)?;
    let assignments = patch
      .keys()
      .map(|c| ident(table, c).map(|q| format!("{q} = p.{q}")))
      .collect::<Result<Vec<_>, _>>()?
      .join(", ");

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
    qb.push(&table_ident)
      .push(" AS t SET ")
      .push(&assignments)
      .push(" FROM jsonb_populate_record(NULL::")
      .push(&table_ident)
      .push(", ")
      .push_bind(Json(Value::Object(patch)))
      .push(") AS p");
    push_filters(&mut qb, table, filters)?;

    let result = qb.build().execute(&self.pool).await.map_err(|e| map_sqlx_error(table, e))?;
    Ok(result.rows_affected())
  }

  #[instrument(name = "PgGateway::delete", skip(self, filters), err)]
  async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, GatewayError> {
    if filters.is_empty() {
      return Err(GatewayError::InvalidQuery {
        table: table.to_string(),
        message: "refusing to delete every row; at least one filter is required".to_string(),
      });
    }
    let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
    qb.push(ident(table, table)?).push(" AS t");
    push_filters(&mut qb, table, filters)?;

    let result = qb.build().execute(&self.pool).await.map_err(|e| map_sqlx_error(table, e))?;
    Ok(result.rows_affected())
  }
}
