// app/src/pipelines/mod.rs

//! Defines and registers the multi-step workflows of the application.

use crate::errors::AppError;
use std::sync::Arc;
use wanderkart_flow::FlowRegistry;

pub mod common_steps;
pub mod contexts;

pub mod booking_pipeline;
pub mod cart_pipeline;
pub mod checkout_pipeline;

/// Registers every pipeline with `registry`. Called once while building `AppState`.
pub fn register_all_pipelines(registry: &Arc<FlowRegistry<AppError>>) {
  tracing::info!("Registering pipelines...");

  cart_pipeline::register_add_to_cart_pipeline(registry);
  cart_pipeline::register_update_cart_quantity_pipeline(registry);
  checkout_pipeline::register_checkout_pipeline(registry);
  booking_pipeline::register_booking_pipeline(registry);

  tracing::info!("All application pipelines registered.");
}
