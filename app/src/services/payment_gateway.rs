// app/src/services/payment_gateway.rs

use crate::errors::{AppError, Result as AppResult};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

pub const INVALID_UPI_MESSAGE: &str = "Please enter a valid UPI ID (e.g., yourname@upi)";

static UPI_PATTERN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9]+$").expect("UPI pattern is valid"));

/// A syntactically valid UPI identifier (`localpart@provider`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UpiId(String);

impl UpiId {
  pub fn parse(raw: &str) -> AppResult<Self> {
    if UPI_PATTERN.is_match(raw) {
      Ok(Self(raw.to_string()))
    } else {
      Err(AppError::Validation(INVALID_UPI_MESSAGE.to_string()))
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "upi_id", rename_all = "snake_case")]
pub enum PaymentMethod {
  CashOnDelivery,
  Upi(UpiId),
  Card,
  NetBanking,
}

impl PaymentMethod {
  /// Stored in `orders.payment_method`.
  pub fn display_name(&self) -> String {
    match self {
      PaymentMethod::CashOnDelivery => "Cash on Delivery".to_string(),
      PaymentMethod::Upi(id) => format!("UPI ({})", id.as_str()),
      PaymentMethod::Card => "Card".to_string(),
      PaymentMethod::NetBanking => "Net Banking".to_string(),
    }
  }

  /// Stored in `orders.payment_status`.
  pub fn payment_status(&self) -> &'static str {
    match self {
      PaymentMethod::CashOnDelivery => "Cash on Delivery",
      PaymentMethod::Upi(_) => "Paid via UPI",
      PaymentMethod::Card | PaymentMethod::NetBanking => "completed",
    }
  }

  /// Online methods are authorized before the order is written.
  pub fn is_online(&self) -> bool {
    !matches!(self, PaymentMethod::CashOnDelivery)
  }

  pub fn success_message(&self) -> &'static str {
    match self {
      PaymentMethod::CashOnDelivery => "Your order has been placed with Cash on Delivery!",
      _ => "Payment successful! Your order has been placed.",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChoice {
  Cod,
  Upi,
  Card,
  NetBanking,
}

/// The client's raw payment selection; turned into a `PaymentMethod` by `resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentSelection {
  pub method: PaymentChoice,
  #[serde(default)]
  pub upi_id: Option<String>,
}

impl PaymentSelection {
  pub fn cod() -> Self {
    Self {
      method: PaymentChoice::Cod,
      upi_id: None,
    }
  }

  pub fn upi(id: impl Into<String>) -> Self {
    Self {
      method: PaymentChoice::Upi,
      upi_id: Some(id.into()),
    }
  }

  pub fn resolve(&self) -> AppResult<PaymentMethod> {
    match self.method {
      PaymentChoice::Cod => Ok(PaymentMethod::CashOnDelivery),
      PaymentChoice::Upi => UpiId::parse(self.upi_id.as_deref().unwrap_or_default()).map(PaymentMethod::Upi),
      PaymentChoice::Card => Ok(PaymentMethod::Card),
      PaymentChoice::NetBanking => Ok(PaymentMethod::NetBanking),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentAuthorization {
  pub reference: String,
  pub amount: Decimal,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn authorize(&self, attempt_id: Uuid, method: &PaymentMethod, amount: Decimal) -> AppResult<PaymentAuthorization>;

  /// Releases an authorization whose order could not be completed.
  async fn void(&self, authorization: &PaymentAuthorization) -> AppResult<()>;
}

/// Stand-in for a real provider: waits `latency` and approves every positive amount.
#[derive(Debug)]
pub struct SimulatedPaymentGateway {
  latency: Duration,
  voided: Mutex<Vec<String>>,
}

impl SimulatedPaymentGateway {
  pub fn new(latency: Duration) -> Self {
    Self {
      latency,
      voided: Mutex::new(Vec::new()),
    }
  }

  /// References of voided authorizations, oldest first.
  pub fn voided(&self) -> Vec<String> {
    self.voided.lock().clone()
  }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
  #[instrument(skip(self, method), fields(method = %method.display_name()))]
  async fn authorize(&self, attempt_id: Uuid, method: &PaymentMethod, amount: Decimal) -> AppResult<PaymentAuthorization> {
    if amount <= Decimal::ZERO {
      return Err(AppError::Payment("Amount must be greater than zero".to_string()));
    }
    info!("Simulating payment authorization.");
    tokio::time::sleep(self.latency).await;

    let reference = format!("sim_auth_{}", Uuid::new_v4().simple());
    info!(%reference, "Simulated payment authorized.");
    Ok(PaymentAuthorization { reference, amount })
  }

  #[instrument(skip(self), fields(reference = %authorization.reference))]
  async fn void(&self, authorization: &PaymentAuthorization) -> AppResult<()> {
    info!("Voiding simulated payment authorization.");
    self.voided.lock().push(authorization.reference.clone());
    Ok(())
  }
}
