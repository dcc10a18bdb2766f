// app/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use wanderkart::config::AppConfig;
use wanderkart::gateway::memory::MemoryGateway;
use wanderkart::gateway::postgres::PgGateway;
use wanderkart::gateway::Gateway;
use wanderkart::seed;
use wanderkart::services::payment_gateway::SimulatedPaymentGateway;
use wanderkart::state::AppState;
use wanderkart::web::configure_app_routes;

async fn build_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn Gateway>> {
  match &config.database_url {
    Some(url) => {
      let gateway = PgGateway::connect(url).await?;
      tracing::info!("Connected to the database.");
      if config.run_migrations {
        gateway.migrate().await?;
        tracing::info!("Migrations applied.");
      }
      Ok(Arc::new(gateway))
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using the in-memory gateway.");
      let gateway = MemoryGateway::new();
      if config.seed_db {
        seed::seed_catalog(&gateway)?;
      }
      Ok(Arc::new(gateway))
    }
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting Wanderkart server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let gateway = match build_gateway(&app_config).await {
    Ok(gateway) => gateway,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise the data gateway.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let payments = Arc::new(SimulatedPaymentGateway::new(app_config.payment_latency));
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::new(app_config, gateway, payments);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
