// app/src/services/reviews.rs

use crate::errors::{AppError, Result as AppResult};
use crate::gateway::{decode_row, decode_rows, encode_row, Filter, GatewayError, OrderBy, Select};
use crate::models::{NewReview, Review};
use crate::session::RequestContext;
use crate::state::AppState;
use serde::Deserialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

pub const SUBMITTED: &str = "Review submitted successfully";
pub const SUBMIT_FAILED: &str = "Failed to submit review";
pub const ALREADY_REVIEWED: &str = "You have already reviewed this product for this order";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewInput {
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub rating: i32,
  #[serde(default)]
  pub review_text: Option<String>,
}

/// The caller's reviews, newest first.
#[instrument(name = "reviews::list", skip(state, rctx), fields(user = ?rctx.user))]
pub async fn list_reviews(state: &AppState, rctx: &RequestContext) -> AppResult<Vec<Review>> {
  let user = rctx.require_user()?;
  let query = Select::from("reviews")
    .eq("user_id", user.user_id.to_string())
    .order_by(OrderBy::desc("created_at"));
  let rows = state.gateway.select(&query).await?;
  Ok(decode_rows("reviews", rows)?)
}

/// The caller's review of a product within one order. No review is `Ok(None)`.
pub async fn find_review(
  state: &AppState,
  rctx: &RequestContext,
  order_id: Uuid,
  product_id: Uuid,
) -> AppResult<Option<Review>> {
  let user = rctx.require_user()?;
  let filters = [
    Filter::eq("order_id", order_id.to_string()),
    Filter::eq("product_id", product_id.to_string()),
    Filter::eq("user_id", user.user_id.to_string()),
  ];
  match state.gateway.find_one("reviews", &filters).await? {
    Some(row) => Ok(Some(decode_row("reviews", row)?)),
    None => Ok(None),
  }
}

#[instrument(name = "reviews::submit", skip(state, rctx, input), fields(user = ?rctx.user, order_id = %input.order_id, product_id = %input.product_id))]
pub async fn submit_review(state: &AppState, rctx: &RequestContext, input: ReviewInput) -> AppResult<Review> {
  match try_submit(state, rctx, input).await {
    Ok(review) => {
      info!(review_id = %review.id, "Review stored.");
      rctx.success(SUBMITTED);
      Ok(review)
    }
    Err(e) => {
      error!(error = %e, "Review submission failed.");
      match &e {
        AppError::Validation(m) => rctx.error(m),
        _ => rctx.error(SUBMIT_FAILED),
      }
      Err(e)
    }
  }
}

async fn try_submit(state: &AppState, rctx: &RequestContext, input: ReviewInput) -> AppResult<Review> {
  let user = rctx.require_user()?;
  if !(1..=5).contains(&input.rating) {
    return Err(AppError::Validation("Rating must be between 1 and 5.".to_string()));
  }

  let owned_order = [Filter::id(input.order_id), Filter::eq("user_id", user.user_id.to_string())];
  if state.gateway.find_one("orders", &owned_order).await?.is_none() {
    return Err(AppError::NotFound(format!("Order {} not found.", input.order_id)));
  }
  if find_review(state, rctx, input.order_id, input.product_id).await?.is_some() {
    return Err(AppError::Validation(ALREADY_REVIEWED.to_string()));
  }

  let review_text = input.review_text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
  let row = encode_row(
    "reviews",
    &NewReview {
      user_id: user.user_id,
      product_id: input.product_id,
      order_id: input.order_id,
      rating: input.rating,
      review_text,
    },
  )?;

  match state.gateway.insert_one("reviews", row).await {
    Ok(row) => Ok(decode_row("reviews", row)?),
    Err(GatewayError::Conflict { .. }) => Err(AppError::Validation(ALREADY_REVIEWED.to_string())),
    Err(e) => Err(e.into()),
  }
}
