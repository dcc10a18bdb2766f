// app/src/services/order_history.rs

use crate::errors::{AppError, Result as AppResult};
use crate::gateway::{decode_row, take_embedded, take_embedded_many, Filter, Join, OrderBy, Row, Select};
use crate::models::{Order, OrderItem, OrderStatus, Product};
use crate::session::RequestContext;
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub const LOAD_FAILED: &str = "Failed to load orders";
pub const CANCELLED: &str = "Order cancelled successfully";
pub const CANCEL_FAILED: &str = "Failed to cancel order";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderFilter {
  /// Case-insensitive match against the names of the ordered products.
  #[serde(default)]
  pub search: Option<String>,
  #[serde(default)]
  pub status: Option<OrderStatus>,
  #[serde(default)]
  pub payment_status: Option<String>,
}

impl OrderFilter {
  fn admits(&self, view: &OrderView) -> bool {
    if self.status.is_some_and(|s| s != view.order.status) {
      return false;
    }
    if let Some(wanted) = self.payment_status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
      if !view.order.payment_status.eq_ignore_ascii_case(wanted) {
        return false;
      }
    }
    match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      Some(term) => {
        let term = term.to_lowercase();
        view
          .items
          .iter()
          .any(|line| line.product.as_ref().is_some_and(|p| p.name.to_lowercase().contains(&term)))
      }
      None => true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
  #[serde(flatten)]
  pub item: OrderItem,
  pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderLine>,
}

/// The caller's orders with their items and products, newest first.
#[instrument(name = "orders::list", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn list_orders(state: &AppState, rctx: &RequestContext, filter: &OrderFilter) -> AppResult<Vec<OrderView>> {
  let user = rctx.require_user()?;
  let query = Select::from("orders")
    .eq("user_id", user.user_id.to_string())
    .order_by(OrderBy::desc("created_at"))
    .join(
      Join::has_many("order_items", "order_items", "order_id")
        .order_by(OrderBy::asc("created_at"))
        .with(Join::belongs_to("product", "products", "product_id")),
    );

  let rows = match state.gateway.select(&query).await {
    Ok(rows) => rows,
    Err(e) => {
      error!(error = %e, "Loading orders failed.");
      rctx.error(LOAD_FAILED);
      return Err(e.into());
    }
  };

  let mut views = Vec::with_capacity(rows.len());
  for row in rows {
    let view = decode_order_view(row)?;
    if filter.admits(&view) {
      views.push(view);
    }
  }
  Ok(views)
}

fn decode_order_view(mut row: Row) -> AppResult<OrderView> {
  let mut items = Vec::new();
  for mut item_row in take_embedded_many(&mut row, "order_items") {
    let product: Option<Product> = take_embedded(&mut item_row, "product", "products")?;
    items.push(OrderLine {
      item: decode_row("order_items", item_row)?,
      product,
    });
  }
  Ok(OrderView {
    order: decode_row("orders", row)?,
    items,
  })
}

/// Marks one of the caller's orders as cancelled, unless it is already
/// cancelled or delivered.
#[instrument(name = "orders::cancel", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn cancel_order(state: &AppState, rctx: &RequestContext, order_id: Uuid) -> AppResult<Order> {
  match try_cancel(state, rctx, order_id).await {
    Ok(order) => {
      info!(%order_id, "Order cancelled.");
      rctx.success(CANCELLED);
      Ok(order)
    }
    Err(e) => {
      warn!(error = %e, "Order cancellation refused or failed.");
      match &e {
        AppError::Validation(m) => rctx.error(m),
        _ => rctx.error(CANCEL_FAILED),
      }
      Err(e)
    }
  }
}

async fn try_cancel(state: &AppState, rctx: &RequestContext, order_id: Uuid) -> AppResult<Order> {
  let user = rctx.require_user()?;
  let owned = [Filter::id(order_id), Filter::eq("user_id", user.user_id.to_string())];

  let Some(row) = state.gateway.find_one("orders", &owned).await? else {
    return Err(AppError::NotFound(format!("Order {} not found.", order_id)));
  };
  let mut order: Order = decode_row("orders", row)?;
  if !order.status.is_cancellable() {
    return Err(AppError::Validation(format!(
      "Order is already {} and cannot be cancelled.",
      order.status.as_str()
    )));
  }

  let mut patch = Row::new();
  patch.insert("status".to_string(), OrderStatus::Cancelled.as_str().into());
  state.gateway.update("orders", patch, &owned).await?;
  order.status = OrderStatus::Cancelled;
  Ok(order)
}
