// app/src/pipelines/cart_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::gateway::{decode_row, encode_row, Filter, Gateway, GatewayError, Row};
use crate::models::{CartItem, NewCartItem, Product, MAX_LINE_QUANTITY};
use crate::pipelines::common_steps::{refresh_cart, require_session};
use crate::pipelines::contexts::{AddToCartCtxData, UpdateCartQuantityCtxData};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use wanderkart_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};

pub fn register_add_to_cart_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(&[
    ("load_product", false, None),
    ("merge_into_cart", false, None),
    ("refresh_cart", false, None),
  ]);

  p.before_root("load_product", require_session::<AddToCartCtxData>);

  p.on_root("load_product", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (product_id, quantity, gateway) = {
        let guard = ctx_data.read();
        (guard.product_id, guard.quantity, guard.app_state.gateway.clone())
      };

      if quantity < 1 {
        warn!(quantity, "Rejected add-to-cart with a non-positive quantity.");
        return Err(AppError::Validation("Quantity must be at least 1.".to_string()));
      }
      if quantity > MAX_LINE_QUANTITY {
        warn!(quantity, "Rejected add-to-cart above the line limit.");
        return Err(AppError::Validation("Quantity too large.".to_string()));
      }

      let row = gateway.find_one("products", &[Filter::id(product_id)]).await?;
      let Some(row) = row else {
        return Err(AppError::NotFound(format!("Product {} not found.", product_id)));
      };
      let product: Product = decode_row("products", row)?;
      info!(%product_id, name = %product.name, "Product resolved for cart.");

      ctx_data.write().product = Some(product);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("merge_into_cart", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (user, product_id, quantity, gateway) = {
        let guard = ctx_data.read();
        (guard.user, guard.product_id, guard.quantity, guard.app_state.gateway.clone())
      };
      let user = user.ok_or_else(|| AppError::Unauthenticated("Sign in to continue.".to_string()))?;

      let stored = merge_cart_row(gateway, user.user_id, product_id, quantity).await?;
      ctx_data.write().stored_quantity = Some(stored);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("refresh_cart", refresh_cart::<AddToCartCtxData>);

  registry.register_pipeline(p);
  info!("Add-to-cart pipeline registered.");
}

pub fn register_update_cart_quantity_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<UpdateCartQuantityCtxData, AppError>::new(&[
    ("write_quantity", false, None),
    ("refresh_cart", false, None),
  ]);

  p.before_root("write_quantity", require_session::<UpdateCartQuantityCtxData>);

  p.on_root("write_quantity", |ctx_data: ContextData<UpdateCartQuantityCtxData>| {
    Box::pin(async move {
      let (user, product_id, quantity, gateway) = {
        let guard = ctx_data.read();
        (guard.user, guard.product_id, guard.quantity, guard.app_state.gateway.clone())
      };
      let user = user.ok_or_else(|| AppError::Unauthenticated("Sign in to continue.".to_string()))?;

      if quantity < 0 {
        return Err(AppError::Validation("Quantity cannot be negative.".to_string()));
      }
      if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::Validation("Quantity too large.".to_string()));
      }

      let key = cart_key(user.user_id, product_id);
      if quantity == 0 {
        let removed = gateway.delete("cart_items", &key).await?;
        info!(%product_id, removed, "Cart line removed.");
        ctx_data.write().removed = true;
      } else {
        let mut patch = Row::new();
        patch.insert("quantity".to_string(), quantity.into());
        let updated = gateway.update("cart_items", patch, &key).await?;
        if updated == 0 {
          warn!(%product_id, "Quantity update matched no cart line.");
          return Err(AppError::NotFound(format!("Product {} is not in the cart.", product_id)));
        }
        info!(%product_id, quantity, updated, "Cart quantity written.");
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("refresh_cart", refresh_cart::<UpdateCartQuantityCtxData>);

  registry.register_pipeline(p);
  info!("Update-cart-quantity pipeline registered.");
}

fn cart_key(user_id: Uuid, product_id: Uuid) -> [Filter; 2] {
  [
    Filter::eq("user_id", user_id.to_string()),
    Filter::eq("product_id", product_id.to_string()),
  ]
}

/// Adds `quantity` to the caller's row for the product, creating it if absent.
///
/// Two concurrent first adds both see no row; the loser's insert hits the
/// (user, product) unique key and is retried as an increment.
#[instrument(skip(gateway), err)]
async fn merge_cart_row(gateway: Arc<dyn Gateway>, user_id: Uuid, product_id: Uuid, quantity: i32) -> AppResult<i32> {
  let key = cart_key(user_id, product_id);
  if let Some(stored) = increment_existing(gateway.as_ref(), &key, quantity).await? {
    return Ok(stored);
  }

  let row = encode_row(
    "cart_items",
    &NewCartItem {
      user_id,
      product_id,
      quantity,
    },
  )?;
  match gateway.insert_one("cart_items", row).await {
    Ok(_) => {
      info!("New cart line created.");
      Ok(quantity)
    }
    Err(GatewayError::Conflict { .. }) => {
      warn!("Cart line appeared concurrently; merging into it.");
      increment_existing(gateway.as_ref(), &key, quantity)
        .await?
        .ok_or_else(|| AppError::Internal("Cart line vanished during merge.".to_string()))
    }
    Err(e) => Err(e.into()),
  }
}

async fn increment_existing(gateway: &dyn Gateway, key: &[Filter], quantity: i32) -> AppResult<Option<i32>> {
  let Some(row) = gateway.find_one("cart_items", key).await? else {
    return Ok(None);
  };
  let existing: CartItem = decode_row("cart_items", row)?;
  let stored = existing
    .quantity
    .checked_add(quantity)
    .filter(|q| *q <= MAX_LINE_QUANTITY)
    .ok_or_else(|| AppError::Validation("Quantity too large.".to_string()))?;

  let mut patch = Row::new();
  patch.insert("quantity".to_string(), stored.into());
  gateway.update("cart_items", patch, &[Filter::id(existing.id)]).await?;
  info!(cart_item_id = %existing.id, stored, "Existing cart line incremented.");
  Ok(Some(stored))
}
