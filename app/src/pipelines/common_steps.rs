// app/src/pipelines/common_steps.rs
use crate::errors::{AppError, Result as AppResult};
use crate::gateway::{decode_row, take_embedded, Gateway, Join, OrderBy, Select};
use crate::models::{CartItem, LineItem, Product};
use crate::pipelines::contexts::{AddToCartCtxData, BookingCtxData, UpdateCartQuantityCtxData};
use crate::session::CurrentUser;
use crate::state::AppState;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use wanderkart_flow::{ContextData, PipelineControl};

/// Contexts whose pipelines act on behalf of a signed-in user.
pub trait SessionScoped {
  fn session_user(&self) -> Option<CurrentUser>;
  fn app_state(&self) -> &AppState;
}

/// Contexts that end with a fresh copy of the caller's cart.
pub trait HoldsCart: SessionScoped {
  fn set_refreshed_cart(&mut self, cart: Option<Vec<LineItem>>);
}

macro_rules! session_scoped {
  ($($ctx:ty),+) => {
    $(impl SessionScoped for $ctx {
      fn session_user(&self) -> Option<CurrentUser> {
        self.user
      }

      fn app_state(&self) -> &AppState {
        &self.app_state
      }
    })+
  };
}

session_scoped!(AddToCartCtxData, UpdateCartQuantityCtxData, BookingCtxData);

impl HoldsCart for AddToCartCtxData {
  fn set_refreshed_cart(&mut self, cart: Option<Vec<LineItem>>) {
    self.cart = cart;
  }
}

impl HoldsCart for UpdateCartQuantityCtxData {
  fn set_refreshed_cart(&mut self, cart: Option<Vec<LineItem>>) {
    self.cart = cart;
  }
}

/// `before` hook: refuses to run any mutating step without a signed-in user.
#[instrument(name = "common_step::require_session", skip(ctx_data), err)]
pub async fn require_session<T>(ctx_data: ContextData<T>) -> AppResult<PipelineControl>
where
  T: SessionScoped + Send + Sync + 'static,
{
  let user = { ctx_data.read().session_user() };
  match user {
    Some(_) => Ok(PipelineControl::Continue),
    None => {
      warn!("Mutating operation attempted without a session.");
      Err(AppError::Unauthenticated("Sign in to continue.".to_string()))
    }
  }
}

/// Reloads the caller's cart after a write. A failed reload is recorded as `None`
/// and does not fail the pipeline; the write itself already succeeded.
#[instrument(name = "common_step::refresh_cart", skip(ctx_data), err)]
pub async fn refresh_cart<T>(ctx_data: ContextData<T>) -> AppResult<PipelineControl>
where
  T: HoldsCart + Send + Sync + 'static,
{
  let (gateway, user) = {
    let guard = ctx_data.read();
    (guard.app_state().gateway.clone(), guard.session_user())
  };
  let Some(user) = user else {
    return Ok(PipelineControl::Continue);
  };

  match load_line_items(gateway, user.user_id).await {
    Ok(items) => {
      info!(lines = items.len(), "Cart reloaded.");
      ctx_data.write().set_refreshed_cart(Some(items));
    }
    Err(e) => {
      warn!(error = %e, "Cart reload failed; callers keep the previous snapshot.");
      ctx_data.write().set_refreshed_cart(None);
    }
  }
  Ok(PipelineControl::Continue)
}

/// Cart rows of `user_id` joined with their products, oldest first.
/// Rows whose product no longer exists are dropped.
#[instrument(name = "common_step::load_line_items", skip(gateway), err)]
pub async fn load_line_items(gateway: Arc<dyn Gateway>, user_id: Uuid) -> AppResult<Vec<LineItem>> {
  let query = Select::from("cart_items")
    .eq("user_id", user_id.to_string())
    .order_by(OrderBy::asc("created_at"))
    .join(Join::belongs_to("product", "products", "product_id"));
  let rows = gateway.select(&query).await?;

  let mut items = Vec::with_capacity(rows.len());
  for mut row in rows {
    let product: Option<Product> = take_embedded(&mut row, "product", "products")?;
    let cart_item: CartItem = decode_row("cart_items", row)?;
    match product {
      Some(product) => items.push(LineItem::from_product(&product, cart_item.quantity)),
      None => warn!(cart_item_id = %cart_item.id, "Cart row references a missing product; skipping."),
    }
  }
  Ok(items)
}
