// app/src/web/handlers/booking_handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use crate::services::booking::{self, BookingRequest};
use crate::state::AppState;
use crate::web::caller::Caller;

#[instrument(name = "handler::list_bookings", skip(app_state, caller))]
pub async fn list_bookings_handler(app_state: web::Data<AppState>, caller: Caller) -> HttpResponse {
  caller.ok(booking::list_bookings(&app_state, &caller.rctx).await)
}

#[instrument(name = "handler::create_booking", skip(app_state, payload, caller))]
pub async fn create_booking_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<BookingRequest>,
  caller: Caller,
) -> HttpResponse {
  let result = booking::create_booking(&app_state, &caller.rctx, payload.into_inner()).await;
  caller.respond(StatusCode::CREATED, result)
}

#[instrument(name = "handler::cancel_booking", skip(app_state, path, caller), fields(booking_id = %path.as_ref()))]
pub async fn cancel_booking_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: Caller,
) -> HttpResponse {
  let result = booking::cancel_booking(&app_state, &caller.rctx, path.into_inner()).await;
  caller.ok(result)
}
