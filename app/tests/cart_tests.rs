// tests/cart_tests.rs
mod common;

use common::*;
use std::time::Duration;
use uuid::Uuid;
use wanderkart::errors::AppError;
use wanderkart::gateway::memory::{MemoryGateway, Op};
use wanderkart::services::cart_store;

#[tokio::test]
async fn test_adding_same_product_twice_merges_into_one_row() {
  let h = Harness::new();
  let product = h.product("Backpack", "100.00");
  let (rctx, notices) = h.user();
  let user_id = rctx.user.unwrap().user_id;

  cart_store::add_to_cart(&h.state, &rctx, product.id, 2).await.unwrap();
  let cart = cart_store::add_to_cart(&h.state, &rctx, product.id, 3).await.unwrap();

  assert_eq!(cart.len(), 1);
  assert_eq!(cart[0].quantity, 5);
  let rows = h.rows_for("cart_items", "user_id", &user_id.to_string());
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["quantity"], 5);
  assert_eq!(notices.messages(), vec![cart_store::ADDED, cart_store::ADDED]);
}

#[tokio::test]
async fn test_zero_quantity_removes_the_line() {
  let h = Harness::new();
  let keep = h.product("Pillow", "20.00");
  let drop = h.product("Adapter", "30.00");
  let (rctx, _) = h.user();

  cart_store::add_to_cart(&h.state, &rctx, keep.id, 1).await.unwrap();
  cart_store::add_to_cart(&h.state, &rctx, drop.id, 2).await.unwrap();
  let cart = cart_store::update_quantity(&h.state, &rctx, drop.id, 0).await.unwrap();

  assert_eq!(cart.len(), 1);
  assert_eq!(cart[0].product_id, keep.id);
  let fetched = cart_store::fetch_cart(&h.state, &rctx).await;
  assert!(fetched.iter().all(|line| line.product_id != drop.id));
  assert_eq!(h.count("cart_items"), 1);
}

#[tokio::test]
async fn test_update_quantity_overwrites_stored_value() {
  let h = Harness::new();
  let product = h.product("Lock", "15.00");
  let (rctx, _) = h.user();

  cart_store::add_to_cart(&h.state, &rctx, product.id, 4).await.unwrap();
  let cart = cart_store::update_quantity(&h.state, &rctx, product.id, 1).await.unwrap();

  assert_eq!(cart[0].quantity, 1);
}

#[tokio::test]
async fn test_negative_quantity_is_rejected() {
  let h = Harness::new();
  let product = h.product("Lock", "15.00");
  let (rctx, notices) = h.user();
  cart_store::add_to_cart(&h.state, &rctx, product.id, 2).await.unwrap();

  let err = cart_store::update_quantity(&h.state, &rctx, product.id, -1).await.unwrap_err();

  assert!(matches!(err, AppError::Validation(_)));
  assert_eq!(notices.messages().last().unwrap(), cart_store::UPDATE_FAILED);
  assert_eq!(h.gateway.rows("cart_items")[0]["quantity"], 2);
}

#[tokio::test]
async fn test_anonymous_add_is_refused_before_any_write() {
  let h = Harness::new();
  let product = h.product("Backpack", "100.00");
  let (rctx, notices) = h.anonymous();

  let err = cart_store::add_to_cart(&h.state, &rctx, product.id, 1).await.unwrap_err();

  assert!(matches!(err, AppError::Unauthenticated(_)));
  assert_eq!(notices.messages(), vec![cart_store::SIGN_IN_TO_ADD]);
  assert_eq!(h.count("cart_items"), 0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
  let h = Harness::new();
  let (rctx, notices) = h.user();

  let err = cart_store::add_to_cart(&h.state, &rctx, Uuid::new_v4(), 1).await.unwrap_err();

  assert!(matches!(err, AppError::NotFound(_)));
  assert_eq!(notices.messages(), vec![cart_store::ADD_FAILED]);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_snapshot() {
  let h = Harness::new();
  let first = h.product("Backpack", "100.00");
  let second = h.product("Pillow", "20.00");
  let (rctx, notices) = h.user();

  let before = cart_store::add_to_cart(&h.state, &rctx, first.id, 1).await.unwrap();
  h.gateway.fail_next("cart_items", Op::Select);
  let cart = cart_store::fetch_cart(&h.state, &rctx).await;

  assert_eq!(cart, before);
  assert_eq!(notices.messages().last().unwrap(), cart_store::LOAD_FAILED);

  // The write itself still lands when only the reload after it fails:
  // the first cart read is the merge lookup, the second is the reload.
  notices.take();
  h.gateway.fail_nth("cart_items", Op::Select, 2);
  let after_add = cart_store::add_to_cart(&h.state, &rctx, second.id, 1).await.unwrap();
  assert_eq!(after_add, before);
  assert_eq!(notices.messages(), vec![cart_store::ADDED.to_string(), cart_store::LOAD_FAILED.to_string()]);
  assert_eq!(h.count("cart_items"), 2);
}

#[tokio::test]
async fn test_concurrent_first_adds_settle_into_one_row() {
  let h = Harness::with_gateway(MemoryGateway::with_latency(Duration::from_millis(20)));
  let product = h.product("Backpack", "100.00");
  let user_id = Uuid::new_v4();
  let (tab_a, _) = h.user_with_id(user_id);
  let (tab_b, _) = h.user_with_id(user_id);

  let (a, b) = tokio::join!(
    cart_store::add_to_cart(&h.state, &tab_a, product.id, 1),
    cart_store::add_to_cart(&h.state, &tab_b, product.id, 2),
  );
  a.unwrap();
  b.unwrap();

  let cart = cart_store::fetch_cart(&h.state, &tab_a).await;
  assert_eq!(cart.len(), 1);
  assert_eq!(cart[0].quantity, 3);
  assert_eq!(h.rows_for("cart_items", "user_id", &user_id.to_string()).len(), 1);
}

#[tokio::test]
async fn test_quantity_past_the_line_limit_is_rejected() {
  let h = Harness::new();
  let product = h.product("Socks", "5.00");
  let (rctx, notices) = h.user();
  let user_id = rctx.user.unwrap().user_id;

  let err = cart_store::add_to_cart(&h.state, &rctx, product.id, i32::MAX).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  assert_eq!(h.count("cart_items"), 0);

  h.cart_row(user_id, product.id, i32::MAX);
  notices.take();
  let err = cart_store::add_to_cart(&h.state, &rctx, product.id, 1).await.unwrap_err();

  assert!(matches!(err, AppError::Validation(ref m) if m == "Quantity too large."));
  assert_eq!(notices.messages(), vec!["Quantity too large."]);
  assert_eq!(h.gateway.rows("cart_items")[0]["quantity"], i32::MAX);
}

#[tokio::test]
async fn test_updating_a_product_not_in_the_cart_fails() {
  let h = Harness::new();
  let in_cart = h.product("Lock", "15.00");
  let absent = h.product("Strap", "8.00");
  let (rctx, notices) = h.user();
  cart_store::add_to_cart(&h.state, &rctx, in_cart.id, 1).await.unwrap();
  notices.take();

  let err = cart_store::update_quantity(&h.state, &rctx, absent.id, 3).await.unwrap_err();

  assert!(matches!(err, AppError::NotFound(_)));
  assert_eq!(notices.messages(), vec![cart_store::UPDATE_FAILED]);
  assert_eq!(h.count("cart_items"), 1);
}

#[tokio::test]
async fn test_emptied_cart_drops_its_snapshot() {
  let h = Harness::new();
  let product = h.product("Pillow", "20.00");
  let (rctx, _) = h.user();
  let user_id = rctx.user.unwrap().user_id;

  cart_store::add_to_cart(&h.state, &rctx, product.id, 1).await.unwrap();
  assert!(h.state.carts.is_tracked(user_id));

  let cart = cart_store::update_quantity(&h.state, &rctx, product.id, 0).await.unwrap();
  assert!(cart.is_empty());
  assert!(!h.state.carts.is_tracked(user_id));
  assert!(h.state.carts.is_empty());
}
