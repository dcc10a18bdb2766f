// app/src/services/catalog.rs

//! Read-side catalog queries and the saved-destinations toggle.

use crate::errors::{AppError, Result as AppResult};
use crate::gateway::{decode_row, decode_rows, take_embedded, Filter, GatewayError, Join, OrderBy, Row, Select};
use crate::models::{Destination, DestinationSummary, Hotel, Product, TravelPackage};
use crate::session::RequestContext;
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub const SAVED: &str = "Added to saved destinations";
pub const UNSAVED: &str = "Removed from saved destinations";
pub const SAVE_FAILED: &str = "Failed to update saved destinations";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HotelFilter {
  /// Matches hotel name or destination name, case-insensitively.
  #[serde(default)]
  pub search: Option<String>,
  /// `"all"` or absent disables the filter.
  #[serde(default)]
  pub budget_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelListing {
  #[serde(flatten)]
  pub hotel: Hotel,
  pub destination: Option<DestinationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedDestinationView {
  pub id: Uuid,
  pub destination: Option<Destination>,
}

/// Logs a failed read and turns it into a notice.
fn report<T>(rctx: &RequestContext, notice: &str, result: AppResult<T>) -> AppResult<T> {
  if let Err(e) = &result {
    match e {
      AppError::NotFound(_) => warn!(error = %e, "Catalog lookup missed."),
      _ => error!(error = %e, "Catalog query failed."),
    }
    rctx.error(notice);
  }
  result
}

async fn fetch_all<T: serde::de::DeserializeOwned>(state: &AppState, query: Select) -> AppResult<Vec<T>> {
  let rows = state.gateway.select(&query).await?;
  Ok(decode_rows(&query.table, rows)?)
}

async fn fetch_by_id<T: serde::de::DeserializeOwned>(state: &AppState, table: &str, id: Uuid, what: &str) -> AppResult<T> {
  match state.gateway.find_one(table, &[Filter::id(id)]).await? {
    Some(row) => Ok(decode_row(table, row)?),
    None => Err(AppError::NotFound(format!("{} {} not found.", what, id))),
  }
}

/// Products ordered by category; `search` matches name or category.
#[instrument(name = "catalog::products", skip(state, rctx))]
pub async fn list_products(state: &AppState, rctx: &RequestContext, search: Option<&str>) -> AppResult<Vec<Product>> {
  let query = Select::from("products").order_by(OrderBy::asc("category"));
  let products: Vec<Product> = report(rctx, "Failed to load products", fetch_all(state, query).await)?;
  Ok(match search.map(str::trim).filter(|s| !s.is_empty()) {
    Some(term) => products.into_iter().filter(|p| p.matches_search(term)).collect(),
    None => products,
  })
}

#[instrument(name = "catalog::product", skip(state, rctx))]
pub async fn get_product(state: &AppState, rctx: &RequestContext, product_id: Uuid) -> AppResult<Product> {
  report(
    rctx,
    "Failed to load product",
    fetch_by_id(state, "products", product_id, "Product").await,
  )
}

/// Featured destinations first, then by name.
#[instrument(name = "catalog::destinations", skip(state, rctx))]
pub async fn list_destinations(state: &AppState, rctx: &RequestContext) -> AppResult<Vec<Destination>> {
  let query = Select::from("destinations")
    .order_by(OrderBy::desc("featured"))
    .order_by(OrderBy::asc("name"));
  report(rctx, "Failed to load destinations", fetch_all(state, query).await)
}

#[instrument(name = "catalog::destination", skip(state, rctx))]
pub async fn get_destination(state: &AppState, rctx: &RequestContext, destination_id: Uuid) -> AppResult<Destination> {
  report(
    rctx,
    "Failed to load destination",
    fetch_by_id(state, "destinations", destination_id, "Destination").await,
  )
}

/// Hotels by rating, best first, with their destination's name and country.
#[instrument(name = "catalog::hotels", skip(state, rctx))]
pub async fn list_hotels(state: &AppState, rctx: &RequestContext, filter: &HotelFilter) -> AppResult<Vec<HotelListing>> {
  let query = Select::from("hotels")
    .order_by(OrderBy::desc("rating"))
    .join(Join::belongs_to("destination", "destinations", "destination_id"));
  let rows = report(rctx, "Failed to load hotels", state.gateway.select(&query).await.map_err(AppError::from))?;

  let category = filter
    .budget_category
    .as_deref()
    .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));
  let term = filter
    .search
    .as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_lowercase);

  let mut listings = Vec::with_capacity(rows.len());
  for mut row in rows {
    let destination: Option<DestinationSummary> = take_embedded(&mut row, "destination", "destinations")?;
    let hotel: Hotel = decode_row("hotels", row)?;

    if category.is_some_and(|c| !hotel.budget_category.eq_ignore_ascii_case(c)) {
      continue;
    }
    if let Some(term) = &term {
      let in_name = hotel.name.to_lowercase().contains(term);
      let in_destination = destination.as_ref().is_some_and(|d| d.name.to_lowercase().contains(term));
      if !in_name && !in_destination {
        continue;
      }
    }
    listings.push(HotelListing { hotel, destination });
  }
  Ok(listings)
}

/// Packages from cheapest to most expensive.
#[instrument(name = "catalog::packages", skip(state, rctx))]
pub async fn list_packages(state: &AppState, rctx: &RequestContext) -> AppResult<Vec<TravelPackage>> {
  let query = Select::from("packages").order_by(OrderBy::asc("price"));
  report(rctx, "Failed to load packages", fetch_all(state, query).await)
}

fn saved_key(user_id: Uuid, destination_id: Uuid) -> [Filter; 2] {
  [
    Filter::eq("user_id", user_id.to_string()),
    Filter::eq("destination_id", destination_id.to_string()),
  ]
}

/// Whether the caller saved `destination_id`. Anonymous callers and failed
/// lookups both read as "not saved".
#[instrument(name = "catalog::is_saved", skip(state, rctx))]
pub async fn is_destination_saved(state: &AppState, rctx: &RequestContext, destination_id: Uuid) -> bool {
  let Some(user) = rctx.user else {
    return false;
  };
  match state.gateway.find_one("saved_destinations", &saved_key(user.user_id, destination_id)).await {
    Ok(found) => found.is_some(),
    Err(e) => {
      warn!(error = %e, "Saved-destination lookup failed.");
      false
    }
  }
}

/// Saves or unsaves `destination_id`; returns whether it is saved afterwards.
#[instrument(name = "catalog::toggle_saved", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn toggle_saved_destination(state: &AppState, rctx: &RequestContext, destination_id: Uuid) -> AppResult<bool> {
  let user = rctx.require_user()?;
  let result = flip_saved(state, user.user_id, destination_id).await;

  match result {
    Ok(saved) => {
      info!(%destination_id, saved, "Saved destinations updated.");
      rctx.success(if saved { SAVED } else { UNSAVED });
      Ok(saved)
    }
    Err(e) => {
      error!(error = %e, "Updating saved destinations failed.");
      rctx.error(SAVE_FAILED);
      Err(e)
    }
  }
}

async fn flip_saved(state: &AppState, user_id: Uuid, destination_id: Uuid) -> AppResult<bool> {
  let key = saved_key(user_id, destination_id);
  if state.gateway.find_one("saved_destinations", &key).await?.is_some() {
    state.gateway.delete("saved_destinations", &key).await?;
    return Ok(false);
  }

  let mut row = Row::new();
  row.insert("user_id".to_string(), user_id.to_string().into());
  row.insert("destination_id".to_string(), destination_id.to_string().into());
  match state.gateway.insert_one("saved_destinations", row).await {
    Ok(_) | Err(GatewayError::Conflict { .. }) => Ok(true),
    Err(e) => Err(e.into()),
  }
}

/// The caller's saved destinations, each with its destination row.
#[instrument(name = "catalog::saved", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn list_saved_destinations(state: &AppState, rctx: &RequestContext) -> AppResult<Vec<SavedDestinationView>> {
  let user = rctx.require_user()?;
  let query = Select::from("saved_destinations")
    .eq("user_id", user.user_id.to_string())
    .order_by(OrderBy::desc("created_at"))
    .join(Join::belongs_to("destination", "destinations", "destination_id"));
  let rows = report(
    rctx,
    "Failed to load saved destinations",
    state.gateway.select(&query).await.map_err(AppError::from),
  )?;

  let mut views = Vec::with_capacity(rows.len());
  for mut row in rows {
    let destination: Option<Destination> = take_embedded(&mut row, "destination", "destinations")?;
    let id = row
      .get("id")
      .and_then(|v| v.as_str())
      .and_then(|s| Uuid::parse_str(s).ok())
      .ok_or_else(|| AppError::Internal("Saved destination without an id.".to_string()))?;
    views.push(SavedDestinationView { id, destination });
  }
  Ok(views)
}
