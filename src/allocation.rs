//! Exact-sum allocation primitives.
//!
//! Two rules in the engine distribute one value across several cart lines
//! and must come out exact despite per-line rounding or per-line quantity
//! caps. Both use the same policy: every line but the last gets its own
//! computed portion, and the tail absorbs whatever is left.

use crate::money::Money;

/// One cart line participating in an allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationLine {
    /// Adjusted per-unit price of the line.
    pub unit_price: Money,
    /// Quantity owned by the line.
    pub quantity: i64,
}

impl AllocationLine {
    pub fn new(unit_price: Money, quantity: i64) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// Line subtotal in cents.
    fn subtotal_cents(&self) -> i64 {
        self.unit_price.amount_cents * self.quantity
    }
}

/// Split `value` across `lines` proportionally to each line's share of the
/// eligible subtotal, such that the shares sum to exactly `value`.
///
/// For every line except the last, the per-unit portion is rounded to the
/// cent first and then scaled by the quantity. The last line does not use
/// the proportional formula at all: it receives `value` minus everything
/// already handed out, absorbing the accumulated rounding error.
///
/// A zero eligible subtotal yields all-zero shares rather than an error.
pub fn allocate_proportionally(value: Money, lines: &[AllocationLine]) -> Vec<Money> {
    let currency = value.currency;

    if lines.is_empty() {
        return Vec::new();
    }

    let total: i64 = lines.iter().map(AllocationLine::subtotal_cents).sum();
    if total == 0 {
        return vec![Money::zero(currency); lines.len()];
    }

    let mut shares = Vec::with_capacity(lines.len());
    let mut handed_out = 0i64;

    for line in &lines[..lines.len() - 1] {
        let unit = (line.unit_price.amount_cents as f64 / total as f64
            * value.amount_cents as f64)
            .round() as i64;
        let share = unit * line.quantity;
        handed_out += share;
        shares.push(Money::new(share, currency));
    }

    shares.push(Money::new(value.amount_cents - handed_out, currency));
    shares
}

/// Total free quantity granted by a buy-N-get-M rule over `total_quantity`
/// eligible units: `floor(Q / N) * M`.
pub fn free_quantity(total_quantity: i64, purchase_number: i64, offer_number: i64) -> i64 {
    if purchase_number <= 0 {
        return 0;
    }
    (total_quantity / purchase_number) * offer_number
}

/// Distribute `total_free` units across lines with the given capacities,
/// in order. Each line is capped at its capacity and the shortfall is
/// carried forward to the lines after it.
///
/// Returns the per-line grants and the quantity no line could absorb.
/// The grants plus the remainder always sum to `total_free`.
pub fn distribute_free_units(total_free: i64, capacities: &[i64]) -> (Vec<i64>, i64) {
    let mut remaining = total_free.max(0);
    let mut grants = Vec::with_capacity(capacities.len());

    for &capacity in capacities {
        let grant = remaining.min(capacity.max(0));
        grants.push(grant);
        remaining -= grant;
    }

    (grants, remaining)
}
