// app/src/services/cart_store.rs

//! The signed-in user's cart: add, change quantity, reload.
//!
//! Each user has a snapshot of their last successfully loaded cart. A failed
//! reload leaves it untouched and raises a "Failed to load cart" notice.

use crate::errors::{AppError, Result as AppResult};
use crate::models::LineItem;
use crate::pipelines::common_steps::load_line_items;
use crate::pipelines::contexts::{AddToCartCtxData, UpdateCartQuantityCtxData};
use crate::pricing::{self, PriceBreakdown};
use crate::session::{CurrentUser, RequestContext};
use crate::state::AppState;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, instrument, warn};
use uuid::Uuid;
use wanderkart_flow::ContextData;

pub const ADDED: &str = "Added to cart";
pub const ADD_FAILED: &str = "Failed to add to cart";
pub const UPDATE_FAILED: &str = "Failed to update cart";
pub const LOAD_FAILED: &str = "Failed to load cart";
pub const SIGN_IN_TO_ADD: &str = "Please sign in to add items to cart";
pub const SIGN_IN_REQUIRED: &str = "Please sign in to continue";

#[derive(Debug, Default)]
pub struct CartSnapshots {
  by_user: RwLock<HashMap<Uuid, Vec<LineItem>>>,
}

impl CartSnapshots {
  pub fn get(&self, user_id: Uuid) -> Vec<LineItem> {
    self.by_user.read().get(&user_id).cloned().unwrap_or_default()
  }

  /// An empty cart drops the user's entry rather than storing it.
  pub fn replace(&self, user_id: Uuid, items: Vec<LineItem>) {
    let mut by_user = self.by_user.write();
    if items.is_empty() {
      by_user.remove(&user_id);
    } else {
      by_user.insert(user_id, items);
    }
  }

  pub fn clear(&self, user_id: Uuid) {
    self.by_user.write().remove(&user_id);
  }

  pub fn is_tracked(&self, user_id: Uuid) -> bool {
    self.by_user.read().contains_key(&user_id)
  }

  pub fn len(&self) -> usize {
    self.by_user.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_user.read().is_empty()
  }
}

/// A cart and its price breakdown, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
  pub items: Vec<LineItem>,
  pub pricing: PriceBreakdown,
}

impl CartView {
  pub fn new(items: Vec<LineItem>) -> Self {
    let pricing = pricing::price(&items).rounded();
    Self { items, pricing }
  }
}

/// Adds `quantity` of a product to the caller's cart and returns the reloaded cart.
#[instrument(name = "cart::add_to_cart", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn add_to_cart(
  state: &AppState,
  rctx: &RequestContext,
  product_id: Uuid,
  quantity: i32,
) -> AppResult<Vec<LineItem>> {
  let ctx = ContextData::new(AddToCartCtxData::new(state.clone(), rctx.user, product_id, quantity));

  match state.flows.run(ctx.clone()).await {
    Ok(_) => {
      let cart = { ctx.read().cart.clone() };
      rctx.success(ADDED);
      Ok(settle(state, rctx, cart))
    }
    Err(AppError::Unauthenticated(m)) => {
      rctx.error(SIGN_IN_TO_ADD);
      Err(AppError::Unauthenticated(m))
    }
    Err(AppError::Validation(m)) => {
      rctx.error(&m);
      Err(AppError::Validation(m))
    }
    Err(e) => {
      error!(error = %e, "Add to cart failed.");
      rctx.error(ADD_FAILED);
      Err(e)
    }
  }
}

/// Sets the stored quantity of a cart line. Zero removes the line; negatives are rejected.
#[instrument(name = "cart::update_quantity", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn update_quantity(
  state: &AppState,
  rctx: &RequestContext,
  product_id: Uuid,
  quantity: i32,
) -> AppResult<Vec<LineItem>> {
  let ctx = ContextData::new(UpdateCartQuantityCtxData::new(state.clone(), rctx.user, product_id, quantity));

  match state.flows.run(ctx.clone()).await {
    Ok(_) => {
      let cart = { ctx.read().cart.clone() };
      Ok(settle(state, rctx, cart))
    }
    Err(AppError::Unauthenticated(m)) => {
      rctx.error(SIGN_IN_REQUIRED);
      Err(AppError::Unauthenticated(m))
    }
    Err(e) => {
      error!(error = %e, "Cart quantity update failed.");
      rctx.error(UPDATE_FAILED);
      Err(e)
    }
  }
}

/// Reloads the caller's cart. Anonymous callers get an empty cart; on failure the
/// previous snapshot is returned.
#[instrument(name = "cart::fetch_cart", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn fetch_cart(state: &AppState, rctx: &RequestContext) -> Vec<LineItem> {
  let Some(user) = rctx.user else {
    return Vec::new();
  };
  match load_line_items(state.gateway.clone(), user.user_id).await {
    Ok(items) => {
      state.carts.replace(user.user_id, items.clone());
      items
    }
    Err(e) => {
      warn!(error = %e, "Cart reload failed; serving the previous snapshot.");
      rctx.error(LOAD_FAILED);
      state.carts.get(user.user_id)
    }
  }
}

/// Stores a freshly loaded cart, or falls back to the snapshot when the reload failed.
fn settle(state: &AppState, rctx: &RequestContext, cart: Option<Vec<LineItem>>) -> Vec<LineItem> {
  let Some(CurrentUser { user_id }) = rctx.user else {
    return Vec::new();
  };
  match cart {
    Some(items) => {
      state.carts.replace(user_id, items.clone());
      items
    }
    None => {
      rctx.error(LOAD_FAILED);
      state.carts.get(user_id)
    }
  }
}
