// app/src/services/checkout.rs

//! Places an order from the cart (or from a direct-buy item) as one
//! all-or-nothing transaction.

use crate::errors::AppError;
use crate::models::{LineItem, Order, OrderItem};
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutHalt};
use crate::pricing::PriceBreakdown;
use crate::services::cart_store::SIGN_IN_REQUIRED;
use crate::services::payment_gateway::PaymentSelection;
use crate::session::RequestContext;
use crate::state::AppState;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use wanderkart_flow::{ContextData, PipelineResult};

pub use crate::pipelines::contexts::{CheckoutPhase, ProductPick};

pub const ORDER_FAILED: &str = "Order failed. Please try again.";
pub const ALREADY_IN_PROGRESS: &str = "A checkout is already in progress";
pub const EMPTY_CART: &str = "Your cart is empty";

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
  pub payment: PaymentSelection,
  /// Items to buy instead of the stored cart.
  pub items: Option<Vec<LineItem>>,
  /// A catalog product to buy instead of the stored cart.
  pub pick: Option<ProductPick>,
  /// A direct buy leaves the stored cart alone.
  pub direct_buy: bool,
}

impl CheckoutRequest {
  pub fn from_cart(payment: PaymentSelection) -> Self {
    Self {
      payment,
      items: None,
      pick: None,
      direct_buy: false,
    }
  }

  pub fn direct_buy(payment: PaymentSelection, item: LineItem) -> Self {
    Self {
      payment,
      items: Some(vec![item]),
      pick: None,
      direct_buy: true,
    }
  }

  /// Buys `quantity` of a catalog product at its current price.
  pub fn direct_buy_product(payment: PaymentSelection, product_id: Uuid, quantity: i32) -> Self {
    Self {
      payment,
      items: None,
      pick: Some(ProductPick { product_id, quantity }),
      direct_buy: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigateTo {
  OrderHistory,
  Catalog,
  SignIn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
  Placed {
    order: Order,
    items: Vec<OrderItem>,
    pricing: PriceBreakdown,
    navigate_to: NavigateTo,
  },
  Rejected {
    reason: String,
  },
  EmptyCart {
    navigate_to: NavigateTo,
  },
  SignInRequired {
    navigate_to: NavigateTo,
  },
  Failed {
    reason: String,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutReport {
  #[serde(flatten)]
  pub outcome: CheckoutOutcome,
  pub phases: Vec<CheckoutPhase>,
}

/// Users with a checkout currently running.
#[derive(Debug, Default)]
pub struct CheckoutGuard {
  users: Mutex<HashSet<Uuid>>,
}

impl CheckoutGuard {
  /// `None` if `user_id` already holds a permit.
  pub fn try_acquire(self: &Arc<Self>, user_id: Uuid) -> Option<CheckoutPermit> {
    if self.users.lock().insert(user_id) {
      Some(CheckoutPermit {
        guard: Arc::clone(self),
        user_id,
      })
    } else {
      None
    }
  }

  pub fn is_busy(&self, user_id: Uuid) -> bool {
    self.users.lock().contains(&user_id)
  }
}

/// Released on drop.
#[derive(Debug)]
pub struct CheckoutPermit {
  guard: Arc<CheckoutGuard>,
  user_id: Uuid,
}

impl Drop for CheckoutPermit {
  fn drop(&mut self) {
    self.guard.users.lock().remove(&self.user_id);
  }
}

/// Runs one checkout attempt and reports how it ended.
///
/// Validation problems end the attempt before any remote call. Once writing
/// starts, a failure at any step undoes the steps that completed.
#[instrument(name = "checkout::place_order", skip(state, rctx, request), fields(user = ?rctx.user, direct_buy = request.direct_buy))]
pub async fn place_order(state: &AppState, rctx: &RequestContext, request: CheckoutRequest) -> CheckoutReport {
  let _permit = match rctx.user {
    Some(user) => match state.checkouts_in_flight.try_acquire(user.user_id) {
      Some(permit) => Some(permit),
      None => {
        warn!("Concurrent checkout refused.");
        rctx.error(ALREADY_IN_PROGRESS);
        return CheckoutReport {
          outcome: CheckoutOutcome::Rejected {
            reason: ALREADY_IN_PROGRESS.to_string(),
          },
          phases: vec![CheckoutPhase::Idle],
        };
      }
    },
    None => None,
  };

  let ctx = ContextData::new(CheckoutCtxData::new(
    state.clone(),
    rctx.user,
    request.payment,
    request.items,
    request.pick,
    request.direct_buy,
  ));
  let result = state.flows.run(ctx.clone()).await;

  let mut data = ctx.snapshot();
  let outcome = match result {
    Ok(PipelineResult::Completed) => placed(state, rctx, &mut data),
    Ok(PipelineResult::Stopped) => halted(rctx, &data),
    Err(e) => failed(rctx, &mut data, e),
  };

  CheckoutReport {
    outcome,
    phases: data.phases,
  }
}

fn placed(state: &AppState, rctx: &RequestContext, data: &mut CheckoutCtxData) -> CheckoutOutcome {
  let (Some(order), Some(pricing), Some(method)) = (data.order.clone(), data.pricing, data.payment_method.clone())
  else {
    return failed(
      rctx,
      data,
      AppError::Internal("Checkout completed without an order.".to_string()),
    );
  };

  data.enter(CheckoutPhase::Done);
  if !data.direct_buy {
    if let Some(user) = data.user {
      state.carts.clear(user.user_id);
    }
  }
  info!(order_id = %order.id, total = %order.total_amount, "Order placed.");
  rctx.success(method.success_message());

  CheckoutOutcome::Placed {
    order,
    items: data.order_items.clone(),
    pricing,
    navigate_to: NavigateTo::OrderHistory,
  }
}

fn halted(rctx: &RequestContext, data: &CheckoutCtxData) -> CheckoutOutcome {
  match data.halt.clone() {
    Some(CheckoutHalt::SignInRequired) => {
      rctx.error(SIGN_IN_REQUIRED);
      CheckoutOutcome::SignInRequired {
        navigate_to: NavigateTo::SignIn,
      }
    }
    Some(CheckoutHalt::Rejected(reason)) => {
      rctx.error(&reason);
      CheckoutOutcome::Rejected { reason }
    }
    Some(CheckoutHalt::EmptyCart) => {
      rctx.info(EMPTY_CART);
      CheckoutOutcome::EmptyCart {
        navigate_to: NavigateTo::Catalog,
      }
    }
    None => {
      error!("Checkout stopped without a reason.");
      rctx.error(ORDER_FAILED);
      CheckoutOutcome::Failed {
        reason: ORDER_FAILED.to_string(),
      }
    }
  }
}

fn failed(rctx: &RequestContext, data: &mut CheckoutCtxData, err: AppError) -> CheckoutOutcome {
  error!(error = %err, phases = ?data.phases, "Checkout failed; completed steps were rolled back.");
  data.enter(CheckoutPhase::Failed);
  rctx.error(ORDER_FAILED);
  CheckoutOutcome::Failed {
    reason: err.public_message(),
  }
}
