// app/src/models/booking.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
  Ticket,
  Package,
  Hotel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
  Train,
  Bus,
  Vehicle,
}

impl TransportMode {
  /// Flat fare per passenger.
  pub fn base_fare(&self) -> Decimal {
    match self {
      TransportMode::Train => Decimal::from(50),
      TransportMode::Bus => Decimal::from(30),
      TransportMode::Vehicle => Decimal::from(100),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDetails {
  pub from: String,
  pub to: String,
  pub transport_type: TransportMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
  pub id: Uuid,
  pub user_id: Uuid,
  pub booking_type: BookingType,
  #[serde(default)]
  pub package_id: Option<Uuid>,
  #[serde(default)]
  pub hotel_id: Option<Uuid>,
  pub start_date: NaiveDate,
  #[serde(default)]
  pub end_date: Option<NaiveDate>,
  #[serde(default)]
  pub passengers: Option<i32>,
  pub total_price: Decimal,
  pub status: String,
  #[serde(default)]
  pub ticket_details: Option<TicketDetails>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
  pub user_id: Uuid,
  pub booking_type: BookingType,
  pub package_id: Option<Uuid>,
  pub hotel_id: Option<Uuid>,
  pub start_date: NaiveDate,
  pub end_date: Option<NaiveDate>,
  pub passengers: Option<i32>,
  pub total_price: Decimal,
  pub status: String,
  pub ticket_details: Option<TicketDetails>,
}
