// app/src/web/handlers/checkout_handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::services::checkout::{self, CheckoutOutcome, CheckoutRequest};
use crate::services::payment_gateway::PaymentSelection;
use crate::state::AppState;
use crate::web::caller::Caller;

#[derive(Deserialize, Debug)]
pub struct DirectBuyPayload {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct CheckoutPayload {
  pub payment: PaymentSelection,
  /// Buy one product right away instead of the stored cart.
  #[serde(default)]
  pub direct_buy: Option<DirectBuyPayload>,
}

fn status_for(outcome: &CheckoutOutcome) -> StatusCode {
  match outcome {
    CheckoutOutcome::Placed { .. } => StatusCode::CREATED,
    CheckoutOutcome::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    CheckoutOutcome::EmptyCart { .. } => StatusCode::CONFLICT,
    CheckoutOutcome::SignInRequired { .. } => StatusCode::UNAUTHORIZED,
    CheckoutOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
  }
}

#[instrument(name = "handler::checkout", skip(app_state, payload, caller), fields(direct_buy = payload.direct_buy.is_some()))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutPayload>,
  caller: Caller,
) -> HttpResponse {
  let CheckoutPayload { payment, direct_buy } = payload.into_inner();

  let request = match direct_buy {
    Some(DirectBuyPayload { product_id, quantity }) => CheckoutRequest::direct_buy_product(payment, product_id, quantity),
    None => CheckoutRequest::from_cart(payment),
  };

  let report = checkout::place_order(&app_state, &caller.rctx, request).await;
  info!(phases = ?report.phases, "Checkout finished.");
  caller.respond(status_for(&report.outcome), Ok(report))
}
