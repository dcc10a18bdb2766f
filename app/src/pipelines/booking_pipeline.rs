// app/src/pipelines/booking_pipeline.rs
use crate::errors::AppError;
use crate::gateway::{decode_row, encode_row, Filter};
use crate::models::{Booking, BookingType, Hotel, NewBooking, TicketDetails, TravelPackage};
use crate::pipelines::common_steps::require_session;
use crate::pipelines::contexts::BookingCtxData;
use crate::services::booking::{BookingRequest, HOTEL_NIGHTS, MAX_PASSENGERS, STAY_LEAD_DAYS};
use chrono::Duration;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use wanderkart_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};

pub fn register_booking_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<BookingCtxData, AppError>::new(&[("price_booking", false, None), ("insert_booking", false, None)]);

  p.before_root("price_booking", require_session::<BookingCtxData>);

  p.on_root("price_booking", |ctx_data: ContextData<BookingCtxData>| {
    Box::pin(async move {
      let (user, request, today, gateway) = {
        let guard = ctx_data.read();
        (guard.user, guard.request.clone(), guard.today, guard.app_state.gateway.clone())
      };
      let user = user.ok_or_else(|| AppError::Unauthenticated("Sign in to continue.".to_string()))?;
      let stay_start = today + Duration::days(STAY_LEAD_DAYS);

      let new_booking = match request {
        BookingRequest::Ticket {
          from,
          to,
          travel_date,
          passengers,
          transport_type,
        } => {
          if !(1..=MAX_PASSENGERS).contains(&passengers) {
            warn!(passengers, "Passenger count out of range.");
            return Err(AppError::Validation(format!(
              "Passengers must be between 1 and {}.",
              MAX_PASSENGERS
            )));
          }
          if from.trim().is_empty() || to.trim().is_empty() {
            return Err(AppError::Validation("Both origin and destination are required.".to_string()));
          }
          NewBooking {
            user_id: user.user_id,
            booking_type: BookingType::Ticket,
            package_id: None,
            hotel_id: None,
            start_date: travel_date,
            end_date: None,
            passengers: Some(passengers),
            total_price: transport_type.base_fare() * Decimal::from(passengers),
            status: "confirmed".to_string(),
            ticket_details: Some(TicketDetails {
              from,
              to,
              transport_type,
            }),
          }
        }
        BookingRequest::Package { package_id } => {
          let row = gateway.find_one("packages", &[Filter::id(package_id)]).await?;
          let Some(row) = row else {
            return Err(AppError::NotFound(format!("Package {} not found.", package_id)));
          };
          let package: TravelPackage = decode_row("packages", row)?;
          NewBooking {
            user_id: user.user_id,
            booking_type: BookingType::Package,
            package_id: Some(package.id),
            hotel_id: None,
            start_date: stay_start,
            end_date: Some(stay_start + Duration::days(i64::from(package.duration_days))),
            passengers: Some(1),
            total_price: package.price,
            status: "confirmed".to_string(),
            ticket_details: None,
          }
        }
        BookingRequest::Hotel { hotel_id } => {
          let row = gateway.find_one("hotels", &[Filter::id(hotel_id)]).await?;
          let Some(row) = row else {
            return Err(AppError::NotFound(format!("Hotel {} not found.", hotel_id)));
          };
          let hotel: Hotel = decode_row("hotels", row)?;
          NewBooking {
            user_id: user.user_id,
            booking_type: BookingType::Hotel,
            package_id: None,
            hotel_id: Some(hotel.id),
            start_date: stay_start,
            end_date: Some(stay_start + Duration::days(HOTEL_NIGHTS)),
            passengers: None,
            total_price: hotel.price_per_night * Decimal::from(HOTEL_NIGHTS),
            status: "confirmed".to_string(),
            ticket_details: None,
          }
        }
      };

      info!(booking_type = ?new_booking.booking_type, total = %new_booking.total_price, "Booking priced.");
      ctx_data.write().new_booking = Some(new_booking);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("insert_booking", |ctx_data: ContextData<BookingCtxData>| {
    Box::pin(async move {
      let (new_booking, gateway) = {
        let guard = ctx_data.read();
        (guard.new_booking.clone(), guard.app_state.gateway.clone())
      };
      let new_booking =
        new_booking.ok_or_else(|| AppError::Internal("Booking inserted before it was priced.".to_string()))?;

      let row = gateway.insert_one("bookings", encode_row("bookings", &new_booking)?).await?;
      let booking: Booking = decode_row("bookings", row)?;
      info!(booking_id = %booking.id, "Booking stored.");

      ctx_data.write().booking = Some(booking);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  info!("Booking pipeline registered.");
}
