//! Voucher totals

use crate::types::{Item, Money};

/// Sum of the item amounts; `0.00` for a voucher without items
pub fn compute_total(items: &[Item]) -> Money {
    if items.is_empty() {
        return Money::zero();
    }
    items.iter().map(|item| &item.amount).sum()
}
