//! Collaborator records the adjusters read, and the price quoting rule.
//!
//! These are the engine's view of externally-owned domain objects:
//! coupons, discount campaigns, interval prices, payment and shipping
//! methods, stored-balance cards. Validation and storage of these
//! records live outside the engine; only the few typed fields each
//! adjuster reads appear here.

use crate::ids::{
    CardId, CouponId, DiscountId, IntervalId, PaymentMethodId, ProductId, ShippingMethodId,
};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a discount value is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRule {
    /// Percentage off the basis (0.0 - 100.0).
    Percent(f64),
    /// Fixed amount off, capped at the basis.
    Fixed(Money),
}

/// Result of quoting a rule against a basis price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price after the discount.
    pub price: Money,
    /// Discount taken off the basis. Never exceeds the basis.
    pub discount: Money,
}

impl PriceRule {
    /// Quote this rule against a basis price, rounding to the cent.
    pub fn quote(&self, basis: Money) -> PriceQuote {
        let discount = match self {
            PriceRule::Percent(percent) => basis.percentage(*percent),
            PriceRule::Fixed(amount) => amount.min(&basis),
        };
        PriceQuote {
            price: basis.subtract(&discount),
            discount,
        }
    }
}

/// A coupon record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub name: String,
    pub value: PriceRule,
    /// Number of free products granted by a free-product coupon.
    pub gift_count: i64,
    /// Products selectable as gifts.
    pub gift_product_ids: Vec<ProductId>,
    /// Items total required before gifts unlock.
    pub gift_min_purchase: Option<Money>,
}

impl Coupon {
    pub fn new(id: CouponId, code: impl Into<String>, name: impl Into<String>, value: PriceRule) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            value,
            gift_count: 0,
            gift_product_ids: Vec::new(),
            gift_min_purchase: None,
        }
    }

    pub fn with_gifts(mut self, count: i64, product_ids: Vec<ProductId>) -> Self {
        self.gift_count = count;
        self.gift_product_ids = product_ids;
        self
    }

    pub fn with_gift_min_purchase(mut self, threshold: Money) -> Self {
        self.gift_min_purchase = Some(threshold);
        self
    }
}

/// A discount campaign record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    pub value: PriceRule,
    /// Buy-N-get-M: units that must be purchased.
    pub purchase_number: i64,
    /// Buy-N-get-M: units granted per purchased group.
    pub offer_number: i64,
    /// Tiered percentage levels, in ascending order.
    pub levels: Vec<f64>,
    /// Products selectable as gifts.
    pub gift_product_ids: Vec<ProductId>,
}

impl Discount {
    pub fn new(id: DiscountId, name: impl Into<String>, value: PriceRule) -> Self {
        Self {
            id,
            name: name.into(),
            value,
            purchase_number: 0,
            offer_number: 0,
            levels: Vec::new(),
            gift_product_ids: Vec::new(),
        }
    }

    /// A buy-N-get-M-free campaign.
    pub fn buy_n_get_m(
        id: DiscountId,
        name: impl Into<String>,
        purchase_number: i64,
        offer_number: i64,
    ) -> Self {
        let mut discount = Self::new(id, name, PriceRule::Percent(100.0));
        discount.purchase_number = purchase_number;
        discount.offer_number = offer_number;
        discount
    }

    /// A campaign with scalable percentage levels.
    pub fn tiered(id: DiscountId, name: impl Into<String>, levels: Vec<f64>) -> Self {
        let first = levels.first().copied().unwrap_or(0.0);
        let mut discount = Self::new(id, name, PriceRule::Percent(first));
        discount.levels = levels;
        discount
    }

    pub fn with_gifts(mut self, product_ids: Vec<ProductId>) -> Self {
        self.gift_product_ids = product_ids;
        self
    }
}

/// A quantity-interval price record for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalPrice {
    pub id: IntervalId,
    pub rule: PriceRule,
}

/// The engine's view of a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    /// Product-owned promotional rule, if any.
    pub direct_rule: Option<PriceRule>,
}

/// How a payment method charges its fee.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Flat(Money),
    /// Percentage of the adjustable's total.
    Percent(f64),
}

/// A payment method record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    pub fee: FeeKind,
}

/// A shipping method record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub name: String,
    pub price: Money,
    /// Subtotal at/above which shipping is free.
    pub free_threshold: Option<Money>,
}

/// A stored-balance client card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCard {
    pub id: CardId,
    pub balance: Money,
}

/// Caller-chosen gift selections, keyed by the originating coupon or
/// discount id. Read-only from the engine's perspective; passed
/// explicitly into the adjusters that persist gift bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GiftSelections {
    selections: HashMap<String, Vec<ProductId>>,
}

impl GiftSelections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, origin: impl Into<String>, product_ids: Vec<ProductId>) {
        self.selections.insert(origin.into(), product_ids);
    }

    pub fn selected_for(&self, origin: &str) -> &[ProductId] {
        self.selections
            .get(origin)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn eur(cents: i64) -> Money {
        Money::new(cents, Currency::EUR)
    }

    #[test]
    fn test_percent_quote() {
        let quote = PriceRule::Percent(10.0).quote(eur(2500));
        assert_eq!(quote.discount, eur(250));
        assert_eq!(quote.price, eur(2250));
    }

    #[test]
    fn test_fixed_quote_capped_at_basis() {
        let quote = PriceRule::Fixed(eur(5000)).quote(eur(3000));
        assert_eq!(quote.discount, eur(3000));
        assert!(quote.price.is_zero());
    }

    #[test]
    fn test_percent_quote_rounds_to_cent() {
        // 33.33% of 0.10 = 0.0333 -> 0.03
        let quote = PriceRule::Percent(33.33).quote(eur(10));
        assert_eq!(quote.discount, eur(3));
    }

    #[test]
    fn test_gift_selections() {
        let mut gifts = GiftSelections::new();
        gifts.select("coupon-1", vec![ProductId::new("prod-9")]);

        assert_eq!(gifts.selected_for("coupon-1").len(), 1);
        assert!(gifts.selected_for("coupon-2").is_empty());
    }
}
