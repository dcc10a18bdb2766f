// app/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::services::cart_store::{self, CartView};
use crate::state::AppState;
use crate::web::caller::Caller;

fn one() -> i32 {
  1
}

#[derive(Deserialize, Debug)]
pub struct AddToCartPayload {
  pub product_id: Uuid,
  #[serde(default = "one")]
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::view_cart", skip(app_state, caller))]
pub async fn view_cart_handler(app_state: web::Data<AppState>, caller: Caller) -> HttpResponse {
  let items = cart_store::fetch_cart(&app_state, &caller.rctx).await;
  caller.ok(Ok(CartView::new(items)))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, payload, caller),
    fields(product_id = %payload.product_id, quantity = payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AddToCartPayload>,
  caller: Caller,
) -> HttpResponse {
  info!("Add to cart requested.");
  let result = cart_store::add_to_cart(&app_state, &caller.rctx, payload.product_id, payload.quantity).await;
  caller.ok(result.map(CartView::new))
}

#[instrument(name = "handler::update_cart_quantity", skip(app_state, path, payload, caller))]
pub async fn update_quantity_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateQuantityPayload>,
  caller: Caller,
) -> HttpResponse {
  let product_id = path.into_inner();
  let result = cart_store::update_quantity(&app_state, &caller.rctx, product_id, payload.quantity).await;
  caller.ok(result.map(CartView::new))
}
