// app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` selects the in-memory gateway.
  pub database_url: Option<String>,
  pub run_migrations: bool,
  /// Artificial latency of the simulated payment gateway for online methods.
  pub payment_latency: Duration,
  /// Seed the catalog tables on startup.
  pub seed_db: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      run_migrations: false,
      payment_latency: Duration::from_millis(2000),
      seed_db: false,
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from an arbitrary variable source. Unset and empty values take defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| lookup(var_name).filter(|v| !v.trim().is_empty());
    let defaults = Self::default();

    let server_host = get_env("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = match get_env("SERVER_PORT") {
      Some(raw) => raw
        .parse::<u16>()
        .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?,
      None => defaults.server_port,
    };
    let database_url = get_env("DATABASE_URL");
    let run_migrations = parse_flag(get_env("RUN_MIGRATIONS"), "RUN_MIGRATIONS")?;
    let payment_latency = match get_env("PAYMENT_LATENCY_MS") {
      Some(raw) => Duration::from_millis(
        raw
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid PAYMENT_LATENCY_MS: {}", e)))?,
      ),
      None => defaults.payment_latency,
    };
    let seed_db = parse_flag(get_env("SEED_DB"), "SEED_DB")?;

    tracing::info!(
      %server_host,
      server_port,
      persistent = database_url.is_some(),
      payment_latency_ms = payment_latency.as_millis() as u64,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      run_migrations,
      payment_latency,
      seed_db,
    })
  }
}

fn parse_flag(raw: Option<String>, name: &str) -> Result<bool> {
  match raw {
    None => Ok(false),
    Some(value) => value
      .trim()
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid {} value: {}", name, e))),
  }
}
