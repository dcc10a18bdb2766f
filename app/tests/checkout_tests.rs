// tests/checkout_tests.rs
mod common;

use common::*;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;
use wanderkart::gateway::memory::Op;
use wanderkart::gateway::{Filter, Gateway};
use wanderkart::models::{LineItem, OrderStatus};
use wanderkart::services::cart_store;
use wanderkart::services::checkout::{self, CheckoutOutcome, CheckoutPhase, CheckoutRequest, NavigateTo};
use wanderkart::services::payment_gateway::{PaymentSelection, INVALID_UPI_MESSAGE};

#[tokio::test]
async fn test_cod_checkout_from_cart_places_order_and_empties_cart() {
  let h = Harness::new();
  let product = h.product("Backpack", "100.00");
  let (rctx, notices) = h.user();
  let user_id = rctx.user.unwrap().user_id;
  h.cart_row(user_id, product.id, 2);

  let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::cod())).await;

  let CheckoutOutcome::Placed {
    order,
    items,
    pricing,
    navigate_to,
  } = report.outcome
  else {
    panic!("expected a placed order, got {:?}", report.outcome);
  };
  assert_eq!(order.total_amount, dec("210.00"));
  assert_eq!(order.payment_method, "Cash on Delivery");
  assert_eq!(order.payment_status, "Cash on Delivery");
  assert_eq!(order.status, OrderStatus::Processing);
  assert_eq!(pricing.subtotal, dec("200.00"));
  assert_eq!(pricing.tax, dec("10.00"));
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].product_id, product.id);
  assert_eq!(items[0].quantity, 2);
  assert_eq!(items[0].price, dec("100.00"));
  assert_eq!(navigate_to, NavigateTo::OrderHistory);
  assert_eq!(
    report.phases,
    vec![
      CheckoutPhase::Idle,
      CheckoutPhase::Validating,
      CheckoutPhase::Submitting,
      CheckoutPhase::CreateOrder,
      CheckoutPhase::CreateOrderItems,
      CheckoutPhase::ClearCart,
      CheckoutPhase::Done,
    ]
  );

  assert!(cart_store::fetch_cart(&h.state, &rctx).await.is_empty());
  assert!(h.payments.voided().is_empty());
  assert_eq!(
    notices.messages(),
    vec!["Your order has been placed with Cash on Delivery!"]
  );
}

#[tokio::test]
async fn test_direct_buy_with_upi_leaves_persisted_cart_alone() {
  let h = Harness::new();
  let in_cart = h.product("Pillow", "20.00");
  let bought = h.product("Tent", "250.00");
  let (rctx, notices) = h.user();
  let user_id = rctx.user.unwrap().user_id;
  h.cart_row(user_id, in_cart.id, 1);

  let request = CheckoutRequest::direct_buy(PaymentSelection::upi("bob@ybl"), LineItem::from_product(&bought, 1));
  let report = checkout::place_order(&h.state, &rctx, request).await;

  let CheckoutOutcome::Placed { order, items, .. } = report.outcome else {
    panic!("expected a placed order, got {:?}", report.outcome);
  };
  assert_eq!(order.total_amount, dec("262.50"));
  assert_eq!(order.payment_method, "UPI (bob@ybl)");
  assert_eq!(order.payment_status, "Paid via UPI");
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].product_id, bought.id);
  assert!(!report.phases.contains(&CheckoutPhase::ClearCart));
  assert_eq!(report.phases.last(), Some(&CheckoutPhase::Done));

  let cart = cart_store::fetch_cart(&h.state, &rctx).await;
  assert_eq!(cart.len(), 1);
  assert_eq!(cart[0].product_id, in_cart.id);
  assert_eq!(notices.messages(), vec!["Payment successful! Your order has been placed."]);
}

#[tokio::test]
async fn test_order_total_matches_items_plus_tax() {
  let h = Harness::new();
  let socks = h.product("Socks", "19.99");
  let tape = h.product("Tape", "5.50");
  let (rctx, _) = h.user();
  let user_id = rctx.user.unwrap().user_id;
  h.cart_row(user_id, socks.id, 3);
  h.cart_row(user_id, tape.id, 1);

  let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::cod())).await;
  let CheckoutOutcome::Placed { order, items, .. } = report.outcome else {
    panic!("expected a placed order, got {:?}", report.outcome);
  };

  let items_sum: Decimal = items.iter().map(|i| i.line_total()).sum();
  let expected = (items_sum * dec("1.05")).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  assert_eq!(order.total_amount, expected);
  assert_eq!(order.total_amount, dec("68.74"));
}

#[tokio::test]
async fn test_invalid_upi_is_rejected_without_side_effects() {
  let h = Harness::new();
  let product = h.product("Backpack", "100.00");
  let (rctx, notices) = h.user();
  let user_id = rctx.user.unwrap().user_id;
  h.cart_row(user_id, product.id, 1);

  for bad in ["alice smith@upi", "@upi", "alice@"] {
    notices.take();
    let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::upi(bad))).await;

    assert_eq!(
      report.outcome,
      CheckoutOutcome::Rejected {
        reason: INVALID_UPI_MESSAGE.to_string()
      }
    );
    assert_eq!(report.phases, vec![CheckoutPhase::Idle, CheckoutPhase::Validating]);
    assert_eq!(notices.messages(), vec![INVALID_UPI_MESSAGE]);
  }
  assert_eq!(h.count("orders"), 0);
  assert_eq!(h.count("cart_items"), 1);
}

#[tokio::test]
async fn test_anonymous_checkout_asks_for_sign_in() {
  let h = Harness::new();
  let (rctx, notices) = h.anonymous();

  let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::cod())).await;

  assert_eq!(
    report.outcome,
    CheckoutOutcome::SignInRequired {
      navigate_to: NavigateTo::SignIn
    }
  );
  assert_eq!(notices.messages(), vec![cart_store::SIGN_IN_REQUIRED]);
  assert_eq!(h.count("orders"), 0);
}

#[tokio::test]
async fn test_empty_cart_offers_catalog() {
  let h = Harness::new();
  let (rctx, _) = h.user();

  let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::cod())).await;

  assert_eq!(
    report.outcome,
    CheckoutOutcome::EmptyCart {
      navigate_to: NavigateTo::Catalog
    }
  );
  assert_eq!(h.count("orders"), 0);
}

#[tokio::test]
async fn test_order_items_failure_rolls_back_order_and_voids_payment() {
  let h = Harness::new();
  let product = h.product("Backpack", "100.00");
  let (rctx, notices) = h.user();
  let user_id = rctx.user.unwrap().user_id;
  h.cart_row(user_id, product.id, 1);
  h.gateway.fail_next("order_items", Op::Insert);

  let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::upi("alice@okbank"))).await;

  assert!(matches!(report.outcome, CheckoutOutcome::Failed { .. }));
  assert_eq!(report.phases.last(), Some(&CheckoutPhase::Failed));
  assert!(report.phases.contains(&CheckoutPhase::CreateOrderItems));
  assert_eq!(h.count("orders"), 0);
  assert_eq!(h.count("order_items"), 0);
  assert_eq!(h.payments.voided().len(), 1);
  assert_eq!(h.count("cart_items"), 1);
  assert_eq!(notices.messages(), vec![checkout::ORDER_FAILED]);
}

#[tokio::test]
async fn test_cart_clear_failure_undoes_the_whole_order() {
  let h = Harness::new();
  let product = h.product("Backpack", "100.00");
  let (rctx, _) = h.user();
  let user_id = rctx.user.unwrap().user_id;
  h.cart_row(user_id, product.id, 2);
  h.gateway.fail_next("cart_items", Op::Delete);

  let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::cod())).await;

  assert!(matches!(report.outcome, CheckoutOutcome::Failed { .. }));
  assert!(report.phases.contains(&CheckoutPhase::ClearCart));
  assert_eq!(h.count("orders"), 0);
  assert_eq!(h.count("order_items"), 0);
  assert_eq!(cart_store::fetch_cart(&h.state, &rctx).await.len(), 1);
}

#[tokio::test]
async fn test_second_concurrent_checkout_is_refused() {
  let h = Harness::new();
  let product = h.product("Backpack", "100.00");
  let (rctx, _) = h.user();
  let user_id = rctx.user.unwrap().user_id;
  h.cart_row(user_id, product.id, 1);

  let (first, second) = tokio::join!(
    checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::upi("alice@okbank"))),
    checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::upi("alice@okbank"))),
  );

  let busy = CheckoutOutcome::Rejected {
    reason: checkout::ALREADY_IN_PROGRESS.to_string(),
  };
  let outcomes = [first.outcome, second.outcome];
  assert_eq!(outcomes.iter().filter(|o| matches!(o, CheckoutOutcome::Placed { .. })).count(), 1);
  assert_eq!(outcomes.iter().filter(|o| **o == busy).count(), 1);
  assert_eq!(h.count("orders"), 1);
  assert!(!h.state.checkouts_in_flight.is_busy(user_id));
}

#[tokio::test]
async fn test_placed_order_drops_the_cart_snapshot() {
  let h = Harness::new();
  let product = h.product("Backpack", "100.00");
  let (rctx, _) = h.user();
  let user_id = rctx.user.unwrap().user_id;
  cart_store::add_to_cart(&h.state, &rctx, product.id, 1).await.unwrap();
  assert!(h.state.carts.is_tracked(user_id));

  let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::from_cart(PaymentSelection::cod())).await;

  assert!(matches!(report.outcome, CheckoutOutcome::Placed { .. }));
  assert!(!h.state.carts.is_tracked(user_id));
  assert!(h.state.carts.is_empty());
}

#[tokio::test]
async fn test_direct_buy_product_is_resolved_inside_checkout() {
  let h = Harness::new();
  let tent = h.product("Tent", "250.00");
  let (rctx, _) = h.user();

  let request = CheckoutRequest::direct_buy_product(PaymentSelection::upi("bob@ybl"), tent.id, 1);
  let report = checkout::place_order(&h.state, &rctx, request).await;

  let CheckoutOutcome::Placed { order, items, .. } = report.outcome else {
    panic!("expected a placed order, got {:?}", report.outcome);
  };
  assert_eq!(order.total_amount, dec("262.50"));
  assert_eq!(items[0].product_id, tent.id);

  let missing = CheckoutRequest::direct_buy_product(PaymentSelection::cod(), Uuid::new_v4(), 1);
  let report = checkout::place_order(&h.state, &rctx, missing).await;
  assert!(matches!(report.outcome, CheckoutOutcome::Rejected { ref reason } if reason.ends_with("not found.")));
  assert_eq!(h.count("orders"), 1);
}

#[tokio::test]
async fn test_invalid_upi_direct_buy_never_reads_the_catalog() {
  let h = Harness::new();
  let tent = h.product("Tent", "250.00");
  let (rctx, _) = h.user();
  h.gateway.fail_next("products", Op::Select);

  let request = CheckoutRequest::direct_buy_product(PaymentSelection::upi("alice@"), tent.id, 1);
  let report = checkout::place_order(&h.state, &rctx, request).await;

  assert_eq!(
    report.outcome,
    CheckoutOutcome::Rejected {
      reason: INVALID_UPI_MESSAGE.to_string()
    }
  );
  // The armed failure is still pending, so the next catalog read fails.
  assert!(h.gateway.find_one("products", &[Filter::id(tent.id)]).await.is_err());
}

#[tokio::test]
async fn test_oversized_lines_are_rejected_before_any_write() {
  let h = Harness::new();
  let tent = h.product("Tent", "250.00");
  let (rctx, _) = h.user();

  let report = checkout::place_order(
    &h.state,
    &rctx,
    CheckoutRequest::direct_buy_product(PaymentSelection::cod(), tent.id, 1000),
  )
  .await;
  assert!(matches!(report.outcome, CheckoutOutcome::Rejected { .. }));

  let mut priceless = LineItem::from_product(&tent, 999);
  priceless.unit_price = Decimal::MAX;
  let report = checkout::place_order(&h.state, &rctx, CheckoutRequest::direct_buy(PaymentSelection::cod(), priceless)).await;
  assert_eq!(
    report.outcome,
    CheckoutOutcome::Rejected {
      reason: "Order total is too large.".to_string()
    }
  );
  assert_eq!(h.count("orders"), 0);
}
