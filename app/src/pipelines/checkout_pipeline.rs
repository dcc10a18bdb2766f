// app/src/pipelines/checkout_pipeline.rs
use crate::errors::AppError;
use crate::gateway::{decode_row, decode_rows, encode_row, Filter};
use crate::models::{LineItem, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, Product, MAX_LINE_QUANTITY};
use crate::pipelines::common_steps::load_line_items;
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutHalt, CheckoutPhase};
use crate::pricing;
use crate::services::payment_gateway::PaymentMethod;
use std::sync::Arc;
use tracing::{error, info, warn};
use wanderkart_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, SkipCondition};

pub fn register_checkout_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let items_supplied: SkipCondition<CheckoutCtxData> = Arc::new(|ctx| ctx.read().items_supplied);
  let pays_on_delivery: SkipCondition<CheckoutCtxData> =
    Arc::new(|ctx| matches!(ctx.read().payment_method, Some(PaymentMethod::CashOnDelivery)));
  let is_direct_buy: SkipCondition<CheckoutCtxData> = Arc::new(|ctx| ctx.read().direct_buy);

  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_payment", false, None),
    ("resolve_line_items", false, Some(items_supplied)),
    ("ensure_items", false, None),
    ("price_order", false, None),
    ("authorize_payment", false, Some(pays_on_delivery)),
    ("create_order", false, None),
    ("create_order_items", false, None),
    ("clear_cart", false, Some(is_direct_buy)),
  ]);

  // Nothing below may touch the gateway for an anonymous caller.
  p.before_root("validate_payment", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      guard.enter(CheckoutPhase::Validating);
      if guard.user.is_none() {
        warn!("Checkout attempted without a session.");
        guard.halt = Some(CheckoutHalt::SignInRequired);
        return Ok(PipelineControl::Stop);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("validate_payment", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      match guard.payment.resolve() {
        Ok(method) => {
          info!(method = %method.display_name(), "Payment method accepted.");
          guard.payment_method = Some(method);
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        Err(e) => {
          warn!(error = %e, "Payment details rejected.");
          guard.halt = Some(CheckoutHalt::Rejected(e.public_message()));
          Ok(PipelineControl::Stop)
        }
      }
    })
  });

  p.on_root("resolve_line_items", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (user, pick, gateway) = {
        let guard = ctx_data.read();
        (guard.user, guard.pick, guard.app_state.gateway.clone())
      };
      let user = user.ok_or_else(|| AppError::Unauthenticated("Sign in to continue.".to_string()))?;

      let items = match pick {
        Some(pick) => {
          let Some(row) = gateway.find_one("products", &[Filter::id(pick.product_id)]).await? else {
            warn!(product_id = %pick.product_id, "Direct-buy product not found.");
            ctx_data.write().halt = Some(CheckoutHalt::Rejected(format!("Product {} not found.", pick.product_id)));
            return Ok(PipelineControl::Stop);
          };
          let product: Product = decode_row("products", row)?;
          info!(product_id = %product.id, quantity = pick.quantity, "Direct-buy product resolved.");
          vec![LineItem::from_product(&product, pick.quantity)]
        }
        None => {
          let items = load_line_items(gateway, user.user_id).await?;
          info!(lines = items.len(), "Checkout items read from cart.");
          items
        }
      };
      ctx_data.write().items = items;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("ensure_items", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      if guard.items.is_empty() {
        info!("Nothing to check out.");
        guard.halt = Some(CheckoutHalt::EmptyCart);
        return Ok(PipelineControl::Stop);
      }
      if let Some(bad) = guard
        .items
        .iter()
        .find(|item| item.quantity < 1 || item.quantity > MAX_LINE_QUANTITY)
      {
        let reason = format!("Invalid quantity for {}.", bad.name);
        guard.halt = Some(CheckoutHalt::Rejected(reason));
        return Ok(PipelineControl::Stop);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("price_order", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let Some(breakdown) = pricing::checked_price(&guard.items).map(|p| p.rounded()) else {
        warn!("Order total out of range.");
        guard.halt = Some(CheckoutHalt::Rejected("Order total is too large.".to_string()));
        return Ok(PipelineControl::Stop);
      };
      info!(subtotal = %breakdown.subtotal, tax = %breakdown.tax, total = %breakdown.total, "Order priced.");
      guard.pricing = Some(breakdown);
      guard.enter(CheckoutPhase::Submitting);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("authorize_payment", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (payments, attempt_id, method, total) = {
        let guard = ctx_data.read();
        (
          guard.app_state.payments.clone(),
          guard.attempt_id,
          guard.payment_method.clone(),
          guard.pricing.map(|p| p.total),
        )
      };
      let (Some(method), Some(total)) = (method, total) else {
        return Err(AppError::Internal("Payment authorized before pricing.".to_string()));
      };

      let authorization = payments.authorize(attempt_id, &method, total).await?;
      info!(reference = %authorization.reference, "Payment authorized.");
      ctx_data.write().authorization = Some(authorization);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.compensate_root("authorize_payment", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (payments, authorization) = {
        let guard = ctx_data.read();
        (guard.app_state.payments.clone(), guard.authorization.clone())
      };
      if let Some(authorization) = authorization {
        warn!(reference = %authorization.reference, "Voiding payment authorization.");
        payments.void(&authorization).await?;
      }
      Ok::<_, AppError>(())
    })
  });

  p.on_root("create_order", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (user, method, total, gateway) = {
        let mut guard = ctx_data.write();
        guard.enter(CheckoutPhase::CreateOrder);
        (
          guard.user,
          guard.payment_method.clone(),
          guard.pricing.map(|p| p.total),
          guard.app_state.gateway.clone(),
        )
      };
      let (Some(user), Some(method), Some(total)) = (user, method, total) else {
        return Err(AppError::Internal("Order creation reached without validated input.".to_string()));
      };

      let new_order = NewOrder {
        user_id: user.user_id,
        total_amount: total,
        payment_method: method.display_name(),
        payment_status: method.payment_status().to_string(),
        status: OrderStatus::Processing,
      };
      let row = gateway.insert_one("orders", encode_row("orders", &new_order)?).await?;
      let order: Order = decode_row("orders", row)?;
      info!(order_id = %order.id, total = %order.total_amount, "Order header created.");

      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.compensate_root("create_order", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (order_id, gateway) = {
        let guard = ctx_data.read();
        (guard.order.as_ref().map(|o| o.id), guard.app_state.gateway.clone())
      };
      if let Some(order_id) = order_id {
        warn!(%order_id, "Removing order header of a failed checkout.");
        gateway.delete("orders", &[Filter::id(order_id)]).await?;
      }
      Ok::<_, AppError>(())
    })
  });

  p.on_root("create_order_items", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (order_id, items, gateway) = {
        let mut guard = ctx_data.write();
        guard.enter(CheckoutPhase::CreateOrderItems);
        (guard.order.as_ref().map(|o| o.id), guard.items.clone(), guard.app_state.gateway.clone())
      };
      let order_id = order_id.ok_or_else(|| AppError::Internal("Order items created before the order.".to_string()))?;

      let rows = items
        .iter()
        .map(|item| {
          encode_row(
            "order_items",
            &NewOrderItem {
              order_id,
              product_id: item.product_id,
              quantity: item.quantity,
              price: item.unit_price,
            },
          )
        })
        .collect::<Result<Vec<_>, _>>()?;
      let stored = gateway.insert("order_items", rows).await?;
      let order_items: Vec<OrderItem> = decode_rows("order_items", stored)?;
      info!(%order_id, lines = order_items.len(), "Order items created.");

      ctx_data.write().order_items = order_items;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.compensate_root("create_order_items", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (order_id, gateway) = {
        let guard = ctx_data.read();
        (guard.order.as_ref().map(|o| o.id), guard.app_state.gateway.clone())
      };
      if let Some(order_id) = order_id {
        warn!(%order_id, "Removing order items of a failed checkout.");
        gateway.delete("order_items", &[Filter::eq("order_id", order_id.to_string())]).await?;
      }
      Ok::<_, AppError>(())
    })
  });

  p.on_root("clear_cart", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (user, gateway) = {
        let mut guard = ctx_data.write();
        guard.enter(CheckoutPhase::ClearCart);
        (guard.user, guard.app_state.gateway.clone())
      };
      let user = user.ok_or_else(|| AppError::Unauthenticated("Sign in to continue.".to_string()))?;

      match gateway
        .delete("cart_items", &[Filter::eq("user_id", user.user_id.to_string())])
        .await
      {
        Ok(removed) => {
          info!(removed, "Cart cleared after order.");
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        Err(e) => {
          error!(error = %e, "Cart could not be cleared; the order will be rolled back.");
          Err(e.into())
        }
      }
    })
  });

  registry.register_pipeline(p);
  info!("Checkout pipeline registered.");
}
