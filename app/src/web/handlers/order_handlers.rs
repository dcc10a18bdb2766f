// app/src/web/handlers/order_handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use crate::services::order_history::{self, OrderFilter};
use crate::services::reviews::{self, ReviewInput};
use crate::state::AppState;
use crate::web::caller::Caller;

#[instrument(name = "handler::list_orders", skip(app_state, query, caller))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrderFilter>,
  caller: Caller,
) -> HttpResponse {
  caller.ok(order_history::list_orders(&app_state, &caller.rctx, &query).await)
}

#[instrument(name = "handler::cancel_order", skip(app_state, path, caller), fields(order_id = %path.as_ref()))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: Caller,
) -> HttpResponse {
  caller.ok(order_history::cancel_order(&app_state, &caller.rctx, path.into_inner()).await)
}

#[instrument(name = "handler::list_reviews", skip(app_state, caller))]
pub async fn list_reviews_handler(app_state: web::Data<AppState>, caller: Caller) -> HttpResponse {
  caller.ok(reviews::list_reviews(&app_state, &caller.rctx).await)
}

#[instrument(name = "handler::submit_review", skip(app_state, payload, caller))]
pub async fn submit_review_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ReviewInput>,
  caller: Caller,
) -> HttpResponse {
  let result = reviews::submit_review(&app_state, &caller.rctx, payload.into_inner()).await;
  caller.respond(StatusCode::CREATED, result)
}
