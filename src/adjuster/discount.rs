//! Discount-type adjusters: store, interval, direct, campaign and
//! cart-value rules. All of them yield charges (negative amounts).

use crate::adjustable::{Adjustable, LineView};
use crate::adjuster::{
    data_f64, data_str, Adjuster, AdjusterKind, AdjusterScope,
};
use crate::adjustment::{Adjustment, AdjustmentType};
use crate::catalog::{Discount, IntervalPrice, PriceRule};
use crate::error::AdjustmentError;
use crate::ids::{IntervalId, ProductId};
use crate::money::Money;
use crate::resolver::ReproductionContext;
use serde_json::json;
use tracing::debug;

/// Storewide percentage discount on one cart line.
#[derive(Debug, Clone)]
pub struct StoreDiscount {
    value: f64,
    single_amount: Money,
    amount: Money,
    title: String,
    description: Option<String>,
}

impl StoreDiscount {
    pub fn new(line: &LineView, value: f64) -> Self {
        let quote = PriceRule::Percent(value).quote(line.unit_price);
        debug!(
            product = %line.product_name,
            value,
            per_unit = %quote.discount,
            "applying store discount"
        );
        Self {
            value,
            single_amount: quote.discount,
            amount: quote.discount.multiply(line.quantity),
            title: "Store".to_string(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let line = ctx.line(adjustment.adjustable_ref())?;
        let value = data_f64(adjustment.data(), "value", "store_discount")?;
        Ok(Self::new(line, value))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }
}

impl Adjuster for StoreDiscount {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::StoreDiscount
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::StoreDiscount
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::LineItem
    }

    fn origin(&self) -> Option<String> {
        Some("store".to_string())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({
            "value": self.value,
            "single_amount": self.single_amount.to_decimal(),
            "amount": self.amount.to_decimal(),
        })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount.negate()
    }
}

/// Quantity-interval price discount on one cart line.
#[derive(Debug, Clone)]
pub struct IntervalDiscount {
    interval_id: IntervalId,
    single_amount: Money,
    amount: Money,
    title: String,
    description: Option<String>,
}

impl IntervalDiscount {
    pub fn new(line: &LineView, interval: &IntervalPrice) -> Self {
        let quote = interval.rule.quote(line.unit_price);
        debug!(
            product = %line.product_name,
            interval = %interval.id,
            per_unit = %quote.discount,
            "applying interval discount"
        );
        Self {
            interval_id: interval.id.clone(),
            single_amount: quote.discount,
            amount: quote.discount.multiply(line.quantity),
            title: "Interval".to_string(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let line = ctx.line(adjustment.adjustable_ref())?;
        let interval_id = data_str(adjustment.data(), "interval_id", "interval_discount")?;
        let interval = ctx.interval_price(interval_id)?;
        Ok(Self::new(line, &interval))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for IntervalDiscount {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::IntervalDiscount
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::IntervalDiscount
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::LineItem
    }

    fn origin(&self) -> Option<String> {
        Some("interval".to_string())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({
            "single_amount": self.single_amount.to_decimal(),
            "amount": self.amount.to_decimal(),
            "interval_id": self.interval_id.as_str(),
        })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount.negate()
    }
}

/// A product's own promotional price cut on one cart line.
#[derive(Debug, Clone)]
pub struct DirectDiscount {
    product_id: ProductId,
    single_amount: Money,
    amount: Money,
    title: String,
    description: Option<String>,
}

impl DirectDiscount {
    pub fn new(line: &LineView, rule: PriceRule) -> Self {
        let quote = rule.quote(line.unit_price);
        debug!(
            product = %line.product_name,
            per_unit = %quote.discount,
            "applying direct discount"
        );
        Self {
            product_id: line.product_id.clone(),
            single_amount: quote.discount,
            amount: quote.discount.multiply(line.quantity),
            title: "Direct".to_string(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let line = ctx.line(adjustment.adjustable_ref())?;
        let product = ctx.product(line.product_id.as_str())?;
        let rule = product
            .direct_rule
            .ok_or(AdjustmentError::MissingReference {
                kind: "product promotion",
                id: product.id.as_str().to_string(),
            })?;
        Ok(Self::new(line, rule))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for DirectDiscount {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::DirectDiscount
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::DirectDiscount
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::LineItem
    }

    fn origin(&self) -> Option<String> {
        Some(self.product_id.as_str().to_string())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({
            "single_amount": self.single_amount.to_decimal(),
            "amount": self.amount.to_decimal(),
        })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount.negate()
    }
}

/// Campaign discount (percentage or fixed value) on one cart line.
#[derive(Debug, Clone)]
pub struct PercentOrFixedDiscount {
    discount_id: String,
    single_amount: Money,
    amount: Money,
    title: String,
    description: Option<String>,
}

impl PercentOrFixedDiscount {
    pub fn new(line: &LineView, discount: &Discount) -> Self {
        let quote = discount.value.quote(line.unit_price);
        debug!(
            product = %line.product_name,
            discount = %discount.name,
            per_unit = %quote.discount,
            "applying campaign discount"
        );
        Self {
            discount_id: discount.id.as_str().to_string(),
            single_amount: quote.discount,
            amount: quote.discount.multiply(line.quantity),
            title: discount.name.clone(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let line = ctx.line(adjustment.adjustable_ref())?;
        let discount = ctx.discount(adjustment.origin())?;
        Ok(Self::new(line, &discount))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }
}

impl Adjuster for PercentOrFixedDiscount {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::PercentOrFixedDiscount
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::PercentOrFixedDiscount
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::LineItem
    }

    fn origin(&self) -> Option<String> {
        Some(self.discount_id.clone())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({
            "single_amount": self.single_amount.to_decimal(),
            "amount": self.amount.to_decimal(),
        })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount.negate()
    }
}

/// Cart-level discount granted once the items total qualifies.
#[derive(Debug, Clone)]
pub struct CartValueGift {
    discount_id: String,
    single_amount: Money,
    amount: Money,
    title: String,
    description: Option<String>,
}

impl CartValueGift {
    pub fn new(discount: &Discount, items_total: Money) -> Self {
        let quote = discount.value.quote(items_total);
        debug!(
            discount = %discount.name,
            basis = %items_total,
            applied = %quote.discount,
            "applying cart value discount"
        );
        Self {
            discount_id: discount.id.as_str().to_string(),
            single_amount: quote.discount,
            amount: quote.discount,
            title: discount.name.clone(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let discount = ctx.discount(adjustment.origin())?;
        Ok(Self::new(&discount, ctx.cart.items_total()))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for CartValueGift {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::CartValueGift
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::CartValueGift
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::Cart
    }

    fn origin(&self) -> Option<String> {
        Some(self.discount_id.clone())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({
            "single_amount": self.single_amount.to_decimal(),
            "amount": self.amount.to_decimal(),
        })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustable::CartView;
    use crate::ids::{CartId, DiscountId, LineItemId};
    use crate::money::Currency;

    fn line(cents: i64, quantity: i64) -> LineView {
        LineView::new(
            LineItemId::new("item-1"),
            ProductId::new("prod-1"),
            "Product A",
            "SKU-A",
            Money::new(cents, Currency::EUR),
            quantity,
        )
    }

    fn cart() -> CartView {
        let mut cart = CartView::new(CartId::new("cart-1"), Currency::EUR);
        cart.push_line(line(2000, 2));
        cart
    }

    #[test]
    fn test_store_discount_is_a_charge() {
        let line = line(2000, 2);
        let adjuster = StoreDiscount::new(&line, 10.0);
        let adjustment = adjuster.create_adjustment(&line).unwrap();

        // 10% of 20.00 = 2.00 per unit, x2
        assert_eq!(adjustment.amount().amount_cents, -400);
        assert!(adjustment.is_charge());
        assert_eq!(adjustment.adjustment_type(), AdjustmentType::StoreDiscount);
        assert_eq!(adjustment.origin(), Some("store"));
    }

    #[test]
    fn test_store_discount_rejects_cart_target() {
        let line = line(2000, 2);
        let adjuster = StoreDiscount::new(&line, 10.0);
        let err = adjuster.create_adjustment(&cart()).unwrap_err();
        assert!(matches!(err, AdjustmentError::UnsupportedAdjustable { .. }));
    }

    #[test]
    fn test_fixed_campaign_discount_capped_at_unit_price() {
        let line = line(300, 1);
        let discount = Discount::new(
            DiscountId::new("d-1"),
            "Five off",
            PriceRule::Fixed(Money::new(500, Currency::EUR)),
        );
        let adjuster = PercentOrFixedDiscount::new(&line, &discount);
        let adjustment = adjuster.create_adjustment(&line).unwrap();
        assert_eq!(adjustment.amount().amount_cents, -300);
    }

    #[test]
    fn test_cart_value_gift_targets_cart() {
        let cart = cart();
        let discount = Discount::new(
            DiscountId::new("d-2"),
            "Cart promo",
            PriceRule::Percent(5.0),
        );
        let adjuster = CartValueGift::new(&discount, cart.items_total());
        let adjustment = adjuster.create_adjustment(&cart).unwrap();

        // 5% of 40.00
        assert_eq!(adjustment.amount().amount_cents, -200);
        assert_eq!(adjustment.adjustment_type(), AdjustmentType::CartValueGift);
    }
}
