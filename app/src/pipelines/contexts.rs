// app/src/pipelines/contexts.rs

//! Data carried through each pipeline. Handlers receive these wrapped in `ContextData`.

use crate::models::{Booking, LineItem, NewBooking, Order, OrderItem, Product};
use crate::pricing::PriceBreakdown;
use crate::services::booking::BookingRequest;
use crate::services::payment_gateway::{PaymentAuthorization, PaymentMethod, PaymentSelection};
use crate::session::CurrentUser;
use crate::state::AppState;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

// --- Cart ---

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub user: Option<CurrentUser>,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product: Option<Product>,
  /// Quantity stored on the cart row after the merge.
  pub stored_quantity: Option<i32>,
  /// `None` when the post-write reload failed.
  pub cart: Option<Vec<LineItem>>,
}

impl AddToCartCtxData {
  pub fn new(app_state: AppState, user: Option<CurrentUser>, product_id: Uuid, quantity: i32) -> Self {
    Self {
      app_state,
      user,
      product_id,
      quantity,
      product: None,
      stored_quantity: None,
      cart: None,
    }
  }
}

#[derive(Clone)]
pub struct UpdateCartQuantityCtxData {
  pub app_state: AppState,
  pub user: Option<CurrentUser>,
  pub product_id: Uuid,
  pub quantity: i32,
  pub removed: bool,
  pub cart: Option<Vec<LineItem>>,
}

impl UpdateCartQuantityCtxData {
  pub fn new(app_state: AppState, user: Option<CurrentUser>, product_id: Uuid, quantity: i32) -> Self {
    Self {
      app_state,
      user,
      product_id,
      quantity,
      removed: false,
      cart: None,
    }
  }
}

// --- Checkout ---

/// Progress marks recorded as a checkout moves through its states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
  Idle,
  Validating,
  Submitting,
  CreateOrder,
  CreateOrderItems,
  ClearCart,
  Done,
  Failed,
}

/// A catalog product bought directly, priced inside the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductPick {
  pub product_id: Uuid,
  pub quantity: i32,
}

/// Why a checkout stopped before touching any data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutHalt {
  SignInRequired,
  Rejected(String),
  EmptyCart,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub user: Option<CurrentUser>,
  /// Idempotency key handed to the payment provider.
  pub attempt_id: Uuid,
  pub direct_buy: bool,
  /// Items were handed in by the caller instead of read from the cart.
  pub items_supplied: bool,
  /// Looked up once payment details and the session have been accepted.
  pub pick: Option<ProductPick>,
  pub payment: PaymentSelection,
  pub payment_method: Option<PaymentMethod>,
  pub items: Vec<LineItem>,
  pub pricing: Option<PriceBreakdown>,
  pub authorization: Option<PaymentAuthorization>,
  pub order: Option<Order>,
  pub order_items: Vec<OrderItem>,
  pub phases: Vec<CheckoutPhase>,
  pub halt: Option<CheckoutHalt>,
}

impl CheckoutCtxData {
  pub fn new(
    app_state: AppState,
    user: Option<CurrentUser>,
    payment: PaymentSelection,
    items: Option<Vec<LineItem>>,
    pick: Option<ProductPick>,
    direct_buy: bool,
  ) -> Self {
    Self {
      app_state,
      user,
      attempt_id: Uuid::new_v4(),
      direct_buy,
      items_supplied: items.is_some(),
      pick,
      payment,
      payment_method: None,
      items: items.unwrap_or_default(),
      pricing: None,
      authorization: None,
      order: None,
      order_items: Vec::new(),
      phases: vec![CheckoutPhase::Idle],
      halt: None,
    }
  }

  pub fn enter(&mut self, phase: CheckoutPhase) {
    if self.phases.last() != Some(&phase) {
      self.phases.push(phase);
    }
  }
}

// --- Bookings ---

#[derive(Clone)]
pub struct BookingCtxData {
  pub app_state: AppState,
  pub user: Option<CurrentUser>,
  pub request: BookingRequest,
  /// Reference date for relative start dates.
  pub today: NaiveDate,
  pub new_booking: Option<NewBooking>,
  pub booking: Option<Booking>,
}

impl BookingCtxData {
  pub fn new(app_state: AppState, user: Option<CurrentUser>, request: BookingRequest, today: NaiveDate) -> Self {
    Self {
      app_state,
      user,
      request,
      today,
      new_booking: None,
      booking: None,
    }
  }
}
