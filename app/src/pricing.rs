// app/src/pricing.rs

//! Subtotal, tax and total for a set of line items. Pure and exact: values are
//! rounded only when persisted or displayed, via `PriceBreakdown::rounded`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::LineItem;

/// Flat 5% GST.
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
  pub subtotal: Decimal,
  pub tax: Decimal,
  pub total: Decimal,
}

impl PriceBreakdown {
  /// Two decimal places, midpoint away from zero.
  pub fn rounded(&self) -> Self {
    let round = |d: Decimal| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Self {
      subtotal: round(self.subtotal),
      tax: round(self.tax),
      total: round(self.total),
    }
  }
}

pub fn subtotal(items: &[LineItem]) -> Decimal {
  items.iter().map(LineItem::line_total).fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn tax(subtotal: Decimal) -> Decimal {
  subtotal.saturating_mul(TAX_RATE)
}

pub fn total(subtotal: Decimal, tax: Decimal) -> Decimal {
  subtotal.saturating_add(tax)
}

/// Breakdown for display. Amounts beyond `Decimal`'s range saturate.
pub fn price(items: &[LineItem]) -> PriceBreakdown {
  let subtotal = subtotal(items);
  let tax = tax(subtotal);
  PriceBreakdown {
    subtotal,
    tax,
    total: total(subtotal, tax),
  }
}

/// Breakdown for an order; `None` if any amount overflows.
pub fn checked_price(items: &[LineItem]) -> Option<PriceBreakdown> {
  let subtotal = items.iter().try_fold(Decimal::ZERO, |acc, item| {
    item
      .unit_price
      .checked_mul(Decimal::from(item.quantity))
      .and_then(|line| acc.checked_add(line))
  })?;
  let tax = subtotal.checked_mul(TAX_RATE)?;
  Some(PriceBreakdown {
    subtotal,
    tax,
    total: subtotal.checked_add(tax)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn item(price: Decimal, quantity: i32) -> LineItem {
    LineItem {
      product_id: Uuid::new_v4(),
      name: "item".to_string(),
      unit_price: price,
      quantity,
      image_url: String::new(),
    }
  }

  #[test]
  fn total_is_subtotal_plus_five_percent() {
    let items = vec![item(Decimal::new(1999, 2), 3), item(Decimal::from(250), 1), item(Decimal::new(5, 1), 7)];
    let p = price(&items);
    assert_eq!(p.subtotal, Decimal::new(31347, 2));
    assert_eq!(p.total, p.subtotal + p.subtotal * Decimal::new(5, 2));
  }

  #[test]
  fn independent_of_item_order() {
    let mut items = vec![item(Decimal::new(1234, 2), 2), item(Decimal::new(99, 0), 5), item(Decimal::new(1, 2), 9)];
    let forward = price(&items);
    items.reverse();
    assert_eq!(price(&items), forward);
  }

  #[test]
  fn empty_set_prices_to_zero() {
    let p = price(&[]);
    assert_eq!(p.total, Decimal::ZERO);
  }

  #[test]
  fn rounding_applies_only_on_request() {
    // 0.10 * 0.05 = 0.005 exactly, which rounds half away from zero.
    let p = price(&[item(Decimal::new(10, 2), 1)]);
    assert_eq!(p.tax, Decimal::new(5, 3));
    assert_eq!(p.rounded().tax, Decimal::new(1, 2));
    assert_eq!(p.rounded().total, Decimal::new(11, 2));
  }

  #[test]
  fn overflowing_amounts_are_refused_for_orders() {
    let items = vec![item(Decimal::MAX, 2)];
    assert_eq!(checked_price(&items), None);
    assert_eq!(price(&items).total, Decimal::MAX);

    let fine = vec![item(Decimal::from(100), 2)];
    assert_eq!(checked_price(&fine), Some(price(&fine)));
  }

  #[test]
  fn scenario_totals() {
    assert_eq!(price(&[item(Decimal::from(100), 2)]).rounded().total, Decimal::new(21000, 2));
    assert_eq!(price(&[item(Decimal::from(250), 1)]).rounded().total, Decimal::new(26250, 2));
  }
}
