// app/src/services/booking.rs

use crate::errors::{AppError, Result as AppResult};
use crate::gateway::{decode_row, take_embedded, Filter, Join, OrderBy, Select};
use crate::models::{Booking, BookingType, TransportMode};
use crate::pipelines::contexts::BookingCtxData;
use crate::session::RequestContext;
use crate::state::AppState;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;
use wanderkart_flow::ContextData;

pub const MAX_PASSENGERS: i32 = 6;
/// Package and hotel stays start a week out.
pub const STAY_LEAD_DAYS: i64 = 7;
pub const HOTEL_NIGHTS: i64 = 2;

pub const CANCELLED: &str = "Booking cancelled";
pub const CANCEL_FAILED: &str = "Failed to cancel booking";
pub const LOAD_FAILED: &str = "Failed to load bookings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "booking_type", rename_all = "lowercase")]
pub enum BookingRequest {
  Ticket {
    from: String,
    to: String,
    travel_date: NaiveDate,
    passengers: i32,
    transport_type: TransportMode,
  },
  Package {
    package_id: Uuid,
  },
  Hotel {
    hotel_id: Uuid,
  },
}

impl BookingRequest {
  pub fn booking_type(&self) -> BookingType {
    match self {
      BookingRequest::Ticket { .. } => BookingType::Ticket,
      BookingRequest::Package { .. } => BookingType::Package,
      BookingRequest::Hotel { .. } => BookingType::Hotel,
    }
  }

  fn success_message(&self) -> &'static str {
    match self.booking_type() {
      BookingType::Ticket => "Booking confirmed successfully!",
      BookingType::Package => "Package booked successfully!",
      BookingType::Hotel => "Hotel booked successfully!",
    }
  }

  fn failure_message(&self) -> &'static str {
    match self.booking_type() {
      BookingType::Ticket => "Failed to create booking",
      BookingType::Package => "Failed to book package",
      BookingType::Hotel => "Failed to book hotel",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NameOnly {
  name: String,
}

/// A booking with the name of the package or hotel it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingView {
  #[serde(flatten)]
  pub booking: Booking,
  pub package_name: Option<String>,
  pub hotel_name: Option<String>,
}

pub async fn create_booking(state: &AppState, rctx: &RequestContext, request: BookingRequest) -> AppResult<Booking> {
  create_booking_on(state, rctx, request, Utc::now().date_naive()).await
}

/// Like `create_booking`, with stay dates computed from `today`.
#[instrument(name = "booking::create", skip(state, rctx, request), fields(user = ?rctx.user, booking_type = ?request.booking_type()))]
pub async fn create_booking_on(
  state: &AppState,
  rctx: &RequestContext,
  request: BookingRequest,
  today: NaiveDate,
) -> AppResult<Booking> {
  let success = request.success_message();
  let failure = request.failure_message();
  let ctx = ContextData::new(BookingCtxData::new(state.clone(), rctx.user, request, today));

  let booked = match state.flows.run(ctx.clone()).await {
    Ok(_) => ctx.read().booking.clone(),
    Err(e) => {
      error!(error = %e, "Booking failed.");
      match &e {
        AppError::Validation(m) => rctx.error(m),
        _ => rctx.error(failure),
      }
      return Err(e);
    }
  };

  match booked {
    Some(booking) => {
      rctx.success(success);
      Ok(booking)
    }
    None => {
      rctx.error(failure);
      Err(AppError::Internal("Booking pipeline finished without a booking.".to_string()))
    }
  }
}

/// The caller's bookings, newest first.
#[instrument(name = "booking::list", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn list_bookings(state: &AppState, rctx: &RequestContext) -> AppResult<Vec<BookingView>> {
  let user = rctx.require_user()?;
  let query = Select::from("bookings")
    .eq("user_id", user.user_id.to_string())
    .order_by(OrderBy::desc("created_at"))
    .join(Join::belongs_to("package", "packages", "package_id"))
    .join(Join::belongs_to("hotel", "hotels", "hotel_id"));

  let rows = match state.gateway.select(&query).await {
    Ok(rows) => rows,
    Err(e) => {
      error!(error = %e, "Loading bookings failed.");
      rctx.error(LOAD_FAILED);
      return Err(e.into());
    }
  };

  let mut views = Vec::with_capacity(rows.len());
  for mut row in rows {
    let package: Option<NameOnly> = take_embedded(&mut row, "package", "packages")?;
    let hotel: Option<NameOnly> = take_embedded(&mut row, "hotel", "hotels")?;
    views.push(BookingView {
      booking: decode_row("bookings", row)?,
      package_name: package.map(|p| p.name),
      hotel_name: hotel.map(|h| h.name),
    });
  }
  Ok(views)
}

#[instrument(name = "booking::cancel", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn cancel_booking(state: &AppState, rctx: &RequestContext, booking_id: Uuid) -> AppResult<()> {
  let user = match rctx.require_user() {
    Ok(user) => user,
    Err(e) => {
      rctx.error(CANCEL_FAILED);
      return Err(e);
    }
  };
  let filters = [Filter::id(booking_id), Filter::eq("user_id", user.user_id.to_string())];

  match state.gateway.delete("bookings", &filters).await {
    Ok(0) => {
      rctx.error(CANCEL_FAILED);
      Err(AppError::NotFound(format!("Booking {} not found.", booking_id)))
    }
    Ok(_) => {
      info!(%booking_id, "Booking cancelled.");
      rctx.success(CANCELLED);
      Ok(())
    }
    Err(e) => {
      error!(error = %e, "Cancelling booking failed.");
      rctx.error(CANCEL_FAILED);
      Err(e.into())
    }
  }
}
