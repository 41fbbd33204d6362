//! # Line Item Calculator & Totals Aggregator
//!
//! Pure functions turning line items into amounts.
//!
//! ## Formula (exact order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  gross           = quantity × rate                                      │
//! │  discount_amount = gross × discount% / 100                              │
//! │  taxable         = gross − discount_amount                              │
//! │  tax_amount      = taxable × tax% / 100                                 │
//! │  line_total      = taxable + tax_amount                                 │
//! │                                                                         │
//! │  No rounding here. aggregate() rounds each sum once, then               │
//! │  total = taxable + tax on the rounded values.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use invoicer_core::calc::{aggregate, compute};
//! use invoicer_core::LineItem;
//! use rust_decimal::Decimal;
//!
//! let item = LineItem::new("Panel", Decimal::from(2), Decimal::from(100))
//!     .with_discount(Decimal::from(10));
//! let computed = compute(&item);
//! assert_eq!(computed.line_total.to_string(), "212.40");
//!
//! let totals = aggregate(&[computed]);
//! assert_eq!(totals.total_amount.to_string(), "212.40");
//! ```

use crate::money::Money;
use crate::types::{ComputedLineItem, LineItem, Totals};

/// Computes derived amounts for one line item.
///
/// Total function: inputs are assumed range-checked by the caller.
pub fn compute(item: &LineItem) -> ComputedLineItem {
    let gross = item.rate * item.quantity;
    let discount_amount = gross.percent(item.discount_percent);
    let taxable = gross - discount_amount;
    let tax_amount = taxable.percent(item.tax_percent);
    let line_total = taxable + tax_amount;

    ComputedLineItem {
        item: item.clone(),
        gross,
        discount_amount,
        taxable,
        tax_amount,
        line_total,
    }
}

/// Computes every item, preserving order.
pub fn compute_all(items: &[LineItem]) -> Vec<ComputedLineItem> {
    items.iter().map(compute).collect()
}

/// Sums computed items into invoice totals.
///
/// An empty slice yields all-zero totals.
pub fn aggregate(items: &[ComputedLineItem]) -> Totals {
    let taxable_value = items.iter().map(|c| c.taxable).sum::<Money>().rounded();
    let gst_amount = items.iter().map(|c| c.tax_amount).sum::<Money>().rounded();

    Totals {
        taxable_value,
        gst_amount,
        total_amount: taxable_value + gst_amount,
    }
}

/// Total discount across items, rounded to 2 places.
pub fn total_discount(items: &[ComputedLineItem]) -> Money {
    items
        .iter()
        .map(|c| c.discount_amount)
        .sum::<Money>()
        .rounded()
}

// =============================================================================
// Unit Tests
// =============================================================================
