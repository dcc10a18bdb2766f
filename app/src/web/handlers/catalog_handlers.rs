// app/src/web/handlers/catalog_handlers.rs

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::models::Destination;
use crate::services::catalog::{self, HotelFilter};
use crate::state::AppState;
use crate::web::caller::Caller;

#[derive(Deserialize, Debug)]
pub struct ProductSearch {
  #[serde(default)]
  pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SaveDestinationPayload {
  pub destination_id: Uuid,
}

#[derive(Serialize, Debug)]
pub struct DestinationDetail {
  #[serde(flatten)]
  pub destination: Destination,
  pub saved: bool,
}

#[instrument(name = "handler::list_products", skip(app_state, query, caller))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductSearch>,
  caller: Caller,
) -> HttpResponse {
  caller.ok(catalog::list_products(&app_state, &caller.rctx, query.search.as_deref()).await)
}

#[instrument(name = "handler::get_product", skip(app_state, path, caller), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: Caller,
) -> HttpResponse {
  caller.ok(catalog::get_product(&app_state, &caller.rctx, path.into_inner()).await)
}

#[instrument(name = "handler::list_destinations", skip(app_state, caller))]
pub async fn list_destinations_handler(app_state: web::Data<AppState>, caller: Caller) -> HttpResponse {
  caller.ok(catalog::list_destinations(&app_state, &caller.rctx).await)
}

#[instrument(name = "handler::get_destination", skip(app_state, path, caller), fields(destination_id = %path.as_ref()))]
pub async fn get_destination_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: Caller,
) -> HttpResponse {
  let destination_id = path.into_inner();
  let result = match catalog::get_destination(&app_state, &caller.rctx, destination_id).await {
    Ok(destination) => {
      let saved = catalog::is_destination_saved(&app_state, &caller.rctx, destination_id).await;
      Ok(DestinationDetail { destination, saved })
    }
    Err(e) => Err(e),
  };
  caller.ok(result)
}

#[instrument(name = "handler::list_hotels", skip(app_state, query, caller))]
pub async fn list_hotels_handler(
  app_state: web::Data<AppState>,
  query: web::Query<HotelFilter>,
  caller: Caller,
) -> HttpResponse {
  caller.ok(catalog::list_hotels(&app_state, &caller.rctx, &query).await)
}

#[instrument(name = "handler::list_packages", skip(app_state, caller))]
pub async fn list_packages_handler(app_state: web::Data<AppState>, caller: Caller) -> HttpResponse {
  caller.ok(catalog::list_packages(&app_state, &caller.rctx).await)
}

#[instrument(name = "handler::list_saved_destinations", skip(app_state, caller))]
pub async fn list_saved_destinations_handler(app_state: web::Data<AppState>, caller: Caller) -> HttpResponse {
  caller.ok(catalog::list_saved_destinations(&app_state, &caller.rctx).await)
}

#[instrument(name = "handler::toggle_saved_destination", skip(app_state, payload, caller), fields(destination_id = %payload.destination_id))]
pub async fn toggle_saved_destination_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<SaveDestinationPayload>,
  caller: Caller,
) -> HttpResponse {
  let result = catalog::toggle_saved_destination(&app_state, &caller.rctx, payload.destination_id).await;
  caller.ok(result.map(|saved| json!({ "destination_id": payload.destination_id, "saved": saved })))
}
