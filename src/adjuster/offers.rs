//! Quantity-driven offers: scalable percentage levels, buy-N-get-M-free
//! with remainder carry-over, identical-item gifts and product gifts.

use crate::adjustable::{Adjustable, LineView};
use crate::adjuster::{data_i64, Adjuster, AdjusterKind, AdjusterScope};
use crate::adjustment::{Adjustment, AdjustmentType};
use crate::allocation::{distribute_free_units, free_quantity};
use crate::catalog::{Discount, GiftSelections};
use crate::error::AdjustmentError;
use crate::ids::ProductId;
use crate::money::Money;
use crate::resolver::ReproductionContext;
use serde_json::json;
use tracing::debug;

/// One level of a scalable percentage campaign, applied to the quantity
/// that reached it. The engine does not pick the level; the caller does.
/// Several instances per item may coexist, one adjustment per level.
#[derive(Debug, Clone)]
pub struct TieredPercentOffer {
    discount_id: String,
    level: i64,
    levels: i64,
    discount_value: f64,
    quantity: i64,
    single_amount: Money,
    amount: Money,
    title: String,
    description: Option<String>,
}

impl TieredPercentOffer {
    /// `level` is 1-based; `quantity` is the quantity priced at that level.
    pub fn new(
        line: &LineView,
        discount: &Discount,
        level: i64,
        quantity: i64,
    ) -> Result<Self, AdjustmentError> {
        let levels = discount.levels.len() as i64;
        let discount_value = discount
            .levels
            .get((level - 1).max(0) as usize)
            .copied()
            .filter(|_| level >= 1)
            .ok_or_else(|| AdjustmentError::MalformedData {
                adjuster: "tiered_percent_offer",
                detail: format!("level {level} out of range ({levels} levels)"),
            })?;

        let single_amount = line.unit_price.percentage(discount_value);
        debug!(
            product = %line.product_name,
            discount = %discount.name,
            level,
            quantity,
            per_unit = %single_amount,
            "applying tiered percent offer"
        );

        Ok(Self {
            discount_id: discount.id.as_str().to_string(),
            level,
            levels,
            discount_value,
            quantity,
            single_amount,
            amount: single_amount.multiply(quantity),
            title: discount.name.clone(),
            description: None,
        })
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let line = ctx.line(adjustment.adjustable_ref())?;
        let discount = ctx.discount(adjustment.origin())?;
        let level = data_i64(adjustment.data(), "level", "tiered_percent_offer")?;
        let quantity = data_i64(adjustment.data(), "quantity", "tiered_percent_offer")?;
        Self::new(line, &discount, level, quantity)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for TieredPercentOffer {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::TieredPercentOffer
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::TieredPercentOffer
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
            "level": self.level,
            "levels": self.levels,
            "discount_value": self.discount_value,
            "quantity": self.quantity,
        })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount.negate()
    }
}

/// Buy-N-get-M-free applied to the cheapest eligible item.
///
/// The free quantity earned by the whole discount group may exceed what
/// this line owns; the grant is capped at the line quantity and the
/// shortfall is recorded so the caller can carry it to the next eligible
/// line of the same group.
#[derive(Debug, Clone)]
pub struct CheapestItemFree {
    discount_id: String,
    single_amount: Money,
    amount: Money,
    granted_quantity: i64,
    remainder_quantity: i64,
    title: String,
    description: Option<String>,
}

impl CheapestItemFree {
    /// Fresh application: the group's total eligible quantity earns the
    /// free units, this line absorbs what it can.
    pub fn new(line: &LineView, discount: &Discount, group_quantity: i64) -> Self {
        let earned = free_quantity(
            group_quantity,
            discount.purchase_number,
            discount.offer_number,
        );
        Self::build(line, discount, earned)
    }

    /// Continuation on the next line of the group, satisfying a
    /// remainder a previous line could not absorb.
    pub fn with_carried(line: &LineView, discount: &Discount, carried: i64) -> Self {
        Self::build(line, discount, carried)
    }

    fn build(line: &LineView, discount: &Discount, earned: i64) -> Self {
        let (grants, remainder) = distribute_free_units(earned, &[line.quantity]);
        let granted = grants[0];
        let single_amount = line.unit_price;

        debug!(
            product = %line.product_name,
            discount = %discount.name,
            earned,
            granted,
            remainder,
            "applying cheapest item free offer"
        );

        Self {
            discount_id: discount.id.as_str().to_string(),
            single_amount,
            amount: single_amount.multiply(granted),
            granted_quantity: granted,
            remainder_quantity: remainder,
            title: discount.name.clone(),
            description: None,
        }
    }

    /// Free units this line could not absorb, to be satisfied by other
    /// lines in the same discount group.
    pub fn remainder_quantity(&self) -> i64 {
        self.remainder_quantity
    }

    pub fn granted_quantity(&self) -> i64 {
        self.granted_quantity
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let line = ctx.line(adjustment.adjustable_ref())?;
        let discount = ctx.discount(adjustment.origin())?;
        let granted = data_i64(adjustment.data(), "quantity", "cheapest_item_free")?;
        let remainder = data_i64(adjustment.data(), "remainder_quantity", "cheapest_item_free")?;
        // The persisted grant plus remainder is the earned quantity this
        // instance originally saw.
        Ok(Self::build(line, &discount, granted + remainder))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for CheapestItemFree {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::CheapestItemFree
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::CheapestItemFree
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
            "quantity": self.granted_quantity,
            "remainder_quantity": self.remainder_quantity,
        })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount.negate()
    }
}

/// Gift line for "buy this product, get the same product free".
///
/// The granted units ride along as a zero-amount gift line; the gift
/// items themselves are added to the cart by the caller.
#[derive(Debug, Clone)]
pub struct IdenticalItemFree {
    discount_id: String,
    single_amount: Money,
    free_quantity: i64,
    sku: String,
    title: String,
    description: Option<String>,
}

impl IdenticalItemFree {
    pub fn new(line: &LineView, discount: &Discount) -> Self {
        debug!(
            product = %line.product_name,
            discount = %discount.name,
            quantity = line.quantity,
            "applying identical item free offer"
        );
        Self {
            discount_id: discount.id.as_str().to_string(),
            single_amount: line.unit_price,
            free_quantity: line.quantity,
            sku: line.sku.clone(),
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
}

impl Adjuster for IdenticalItemFree {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::IdenticalItemFree
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::IdenticalItemFree
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
            "amount": 0.0,
            "quantity": self.free_quantity,
            "sku": self.sku,
        })
    }

    fn calculate_amount(&self, adjustable: &dyn Adjustable) -> Money {
        Money::zero(adjustable.currency())
    }
}

/// Cart-level gift grant from a discount campaign. Zero-amount; persists
/// which gifts are available and which the caller selected.
#[derive(Debug, Clone)]
pub struct ProductGift {
    discount_id: String,
    nr_possible_gifts: i64,
    possible_gifts: Vec<ProductId>,
    selected_gifts: Vec<ProductId>,
    title: String,
    description: Option<String>,
}

impl ProductGift {
    pub fn new(discount: &Discount, nr_possible_gifts: i64, gifts: &GiftSelections) -> Self {
        Self {
            discount_id: discount.id.as_str().to_string(),
            nr_possible_gifts,
            possible_gifts: discount.gift_product_ids.clone(),
            selected_gifts: gifts.selected_for(discount.id.as_str()).to_vec(),
            title: discount.name.clone(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let discount = ctx.discount(adjustment.origin())?;
        let nr = data_i64(adjustment.data(), "nr_possible_gifts", "product_gift")?;
        Ok(Self::new(&discount, nr, ctx.gifts))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for ProductGift {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::ProductGift
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::ProductGift
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
            "single_amount": 0.0,
            "amount": 0.0,
            "nr_possible_gifts": self.nr_possible_gifts,
            "possible_gifts": self.possible_gifts,
            "selected_gifts": self.selected_gifts,
        })
    }

    fn calculate_amount(&self, adjustable: &dyn Adjustable) -> Money {
        Money::zero(adjustable.currency())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PriceRule;
    use crate::ids::{DiscountId, LineItemId};
    use crate::money::Currency;

    fn line(id: &str, cents: i64, quantity: i64) -> LineView {
        LineView::new(
            LineItemId::new(id),
            ProductId::new("prod-1"),
            "Product",
            "SKU-1",
            Money::new(cents, Currency::EUR),
            quantity,
        )
    }

    #[test]
    fn test_tiered_offer_isolated_level_amount() {
        let line = line("item-1", 1000, 4);
        let discount = Discount::tiered(
            DiscountId::new("d-1"),
            "Tiered",
            vec![10.0, 15.0, 20.0],
        );

        let adjuster = TieredPercentOffer::new(&line, &discount, 2, 4).unwrap();
        let adjustment = adjuster.create_adjustment(&line).unwrap();

        // 15% of 10.00 = 1.50 per unit, x4
        assert_eq!(adjustment.amount().amount_cents, -600);
        let data = adjustment.data();
        assert_eq!(data["level"], 2);
        assert_eq!(data["levels"], 3);
        assert_eq!(data["discount_value"], 15.0);
    }

    #[test]
    fn test_tiered_offer_rejects_bad_level() {
        let line = line("item-1", 1000, 1);
        let discount = Discount::tiered(DiscountId::new("d-1"), "Tiered", vec![10.0]);
        assert!(TieredPercentOffer::new(&line, &discount, 2, 1).is_err());
        assert!(TieredPercentOffer::new(&line, &discount, 0, 1).is_err());
    }

    #[test]
    fn test_cheapest_item_free_uncapped() {
        // buy 3 get 1, group quantity 7 -> 2 free, line owns 7
        let line = line("item-1", 500, 7);
        let discount = Discount::buy_n_get_m(DiscountId::new("d-2"), "3+1", 3, 1);

        let adjuster = CheapestItemFree::new(&line, &discount, 7);
        assert_eq!(adjuster.granted_quantity(), 2);
        assert_eq!(adjuster.remainder_quantity(), 0);

        let adjustment = adjuster.create_adjustment(&line).unwrap();
        assert_eq!(adjustment.amount().amount_cents, -1000);
    }

    #[test]
    fn test_cheapest_item_free_caps_and_carries() {
        // 2 free units earned, target line owns only 1
        let target = line("item-1", 500, 1);
        let discount = Discount::buy_n_get_m(DiscountId::new("d-2"), "3+1", 3, 1);

        let adjuster = CheapestItemFree::new(&target, &discount, 7);
        assert_eq!(adjuster.granted_quantity(), 1);
        assert_eq!(adjuster.remainder_quantity(), 1);

        // the next line of the group absorbs the carried remainder
        let next = line("item-2", 700, 3);
        let carried = CheapestItemFree::with_carried(&next, &discount, adjuster.remainder_quantity());
        assert_eq!(carried.granted_quantity(), 1);
        assert_eq!(carried.remainder_quantity(), 0);
        assert_eq!(
            carried.create_adjustment(&next).unwrap().amount().amount_cents,
            -700
        );
    }

    #[test]
    fn test_identical_item_free_is_zero_amount() {
        let line = line("item-1", 900, 2);
        let discount = Discount::new(
            DiscountId::new("d-3"),
            "Same free",
            PriceRule::Percent(100.0),
        );
        let adjuster = IdenticalItemFree::new(&line, &discount);
        let adjustment = adjuster.create_adjustment(&line).unwrap();

        assert!(adjustment.amount().is_zero());
        assert_eq!(adjustment.data()["quantity"], 2);
        assert_eq!(adjustment.data()["sku"], "SKU-1");
        assert!(adjustment.adjustment_type().is_visual_separator());
    }
}
