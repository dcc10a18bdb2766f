// app/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::gateway::Gateway;
use crate::pipelines;
use crate::services::cart_store::CartSnapshots;
use crate::services::checkout::CheckoutGuard;
use crate::services::payment_gateway::PaymentGateway;
use std::sync::Arc;
use wanderkart_flow::FlowRegistry;

#[derive(Clone)]
pub struct AppState {
  pub gateway: Arc<dyn Gateway>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub payments: Arc<dyn PaymentGateway>,
  /// Last successfully loaded cart per user.
  pub carts: Arc<CartSnapshots>,
  pub checkouts_in_flight: Arc<CheckoutGuard>,
}

impl AppState {
  /// Builds the shared state and registers every pipeline against it.
  pub fn new(config: AppConfig, gateway: Arc<dyn Gateway>, payments: Arc<dyn PaymentGateway>) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&flows);

    Self {
      gateway,
      flows,
      config: Arc::new(config),
      payments,
      carts: Arc::new(CartSnapshots::default()),
      checkouts_in_flight: Arc::new(CheckoutGuard::default()),
    }
  }
}
