//! Coupon-driven adjusters: value coupons in their three application
//! modes, shipping waivers, and free-product grants.

use crate::adjustable::{Adjustable, CartView, LineView};
use crate::adjuster::{data_i64, data_str, Adjuster, AdjusterKind, AdjusterScope};
use crate::adjustment::{Adjustment, AdjustmentType};
use crate::allocation::{allocate_proportionally, AllocationLine};
use crate::catalog::{Coupon, GiftSelections, PriceRule};
use crate::error::AdjustmentError;
use crate::ids::ProductId;
use crate::money::Money;
use crate::resolver::ReproductionContext;
use serde_json::json;
use tracing::debug;

/// How a value coupon was applied, persisted so reconstruction can
/// rebuild the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CouponMode {
    /// Per-unit discount on one line.
    Item,
    /// One line's share of a fixed value split across the whole cart.
    Allocated,
    /// Single cart-level adjustment against the items total.
    Cart,
}

impl CouponMode {
    fn as_str(&self) -> &'static str {
        match self {
            CouponMode::Item => "item",
            CouponMode::Allocated => "allocated",
            CouponMode::Cart => "cart",
        }
    }

    fn from_str(s: &str) -> Result<Self, AdjustmentError> {
        match s {
            "item" => Ok(CouponMode::Item),
            "allocated" => Ok(CouponMode::Allocated),
            "cart" => Ok(CouponMode::Cart),
            other => Err(AdjustmentError::MalformedData {
                adjuster: "coupon_percent_or_fixed",
                detail: format!("unknown coupon mode `{other}`"),
            }),
        }
    }
}

/// A percent-or-fixed value coupon.
///
/// Percent coupons discount each unit of a line. Fixed coupons are split
/// across the cart's lines proportionally to their subtotals, with the
/// split summing to exactly the coupon value, capped at the items total.
/// Either rule can instead be applied once at cart level.
#[derive(Debug, Clone)]
pub struct CouponPercentOrFixed {
    coupon_id: String,
    mode: CouponMode,
    value: f64,
    single_amount: Money,
    amount: Money,
    title: String,
    description: Option<String>,
}

impl CouponPercentOrFixed {
    /// Apply the coupon's rule per unit of one line.
    pub fn for_item(coupon: &Coupon, line: &LineView) -> Self {
        let quote = coupon.value.quote(line.unit_price);
        debug!(
            coupon = %coupon.code,
            product = %line.product_name,
            per_unit = %quote.discount,
            "applying coupon per item"
        );
        Self {
            coupon_id: coupon.id.as_str().to_string(),
            mode: CouponMode::Item,
            value: rule_value(&coupon.value),
            single_amount: quote.discount,
            amount: quote.discount.multiply(line.quantity),
            title: coupon.name.clone(),
            description: None,
        }
    }

    /// Split a fixed coupon across `lines`, one adjuster per line.
    ///
    /// The coupon value is capped at the eligible subtotal before the
    /// split, so the shares never exceed what the lines are worth.
    pub fn allocate(coupon: &Coupon, lines: &[LineView]) -> Result<Vec<Self>, AdjustmentError> {
        let shares = Self::allocate_shares(coupon, lines)?;
        Ok(lines
            .iter()
            .zip(shares)
            .map(|(line, share)| Self {
                coupon_id: coupon.id.as_str().to_string(),
                mode: CouponMode::Allocated,
                value: rule_value(&coupon.value),
                single_amount: Money::zero(line.unit_price.currency),
                amount: share,
                title: coupon.name.clone(),
                description: None,
            })
            .collect())
    }

    /// Apply the coupon once against a cart's items total.
    pub fn for_cart(coupon: &Coupon, items_total: Money) -> Self {
        let quote = coupon.value.quote(items_total);
        Self {
            coupon_id: coupon.id.as_str().to_string(),
            mode: CouponMode::Cart,
            value: rule_value(&coupon.value),
            single_amount: Money::zero(items_total.currency),
            amount: quote.discount,
            title: coupon.name.clone(),
            description: None,
        }
    }

    fn allocate_shares(
        coupon: &Coupon,
        lines: &[LineView],
    ) -> Result<Vec<Money>, AdjustmentError> {
        let PriceRule::Fixed(value) = coupon.value else {
            return Err(AdjustmentError::MalformedData {
                adjuster: "coupon_percent_or_fixed",
                detail: "allocation requires a fixed coupon value".to_string(),
            });
        };
        let participants: Vec<AllocationLine> = lines
            .iter()
            .map(|l| AllocationLine::new(l.unit_price, l.quantity))
            .collect();
        let subtotal = lines
            .iter()
            .fold(Money::zero(value.currency), |acc, l| acc.add(&l.subtotal()));
        Ok(allocate_proportionally(value.min(&subtotal), &participants))
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let coupon = ctx.coupon(adjustment.origin())?;
        let mode = CouponMode::from_str(data_str(
            adjustment.data(),
            "mode",
            "coupon_percent_or_fixed",
        )?)?;

        match mode {
            CouponMode::Item => {
                let line = ctx.line(adjustment.adjustable_ref())?;
                Ok(Self::for_item(&coupon, line))
            }
            CouponMode::Allocated => {
                let shares = Self::allocate_shares(&coupon, &ctx.cart.lines)?;
                let position = ctx
                    .cart
                    .lines
                    .iter()
                    .position(|l| l.id.as_str() == adjustment.adjustable_ref().id)
                    .ok_or_else(|| AdjustmentError::MissingReference {
                        kind: "cart item",
                        id: adjustment.adjustable_ref().id.clone(),
                    })?;
                Ok(Self {
                    coupon_id: coupon.id.as_str().to_string(),
                    mode: CouponMode::Allocated,
                    value: rule_value(&coupon.value),
                    single_amount: Money::zero(ctx.cart.currency),
                    amount: shares[position],
                    title: coupon.name.clone(),
                    description: None,
                })
            }
            CouponMode::Cart => Ok(Self::for_cart(&coupon, ctx.cart.items_total())),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

fn rule_value(rule: &PriceRule) -> f64 {
    match rule {
        PriceRule::Percent(p) => *p,
        PriceRule::Fixed(m) => m.to_decimal(),
    }
}

impl Adjuster for CouponPercentOrFixed {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::CouponPercentOrFixed
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::CouponPercentOrFixed
    }

    fn scope(&self) -> AdjusterScope {
        match self.mode {
            CouponMode::Cart => AdjusterScope::Cart,
            _ => AdjusterScope::LineItem,
        }
    }

    fn origin(&self) -> Option<String> {
        Some(self.coupon_id.clone())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({
            "mode": self.mode.as_str(),
            "value": self.value,
            "single_amount": self.single_amount.to_decimal(),
            "amount": self.amount.to_decimal(),
        })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount.negate()
    }
}

/// Waives a cart's shipping fee, in full or up to a fixed cap.
///
/// The waiver reads the shipping fee adjustment already attached to the
/// cart, so it must run after the shipping adjuster.
#[derive(Debug, Clone)]
pub struct CouponFreeShipping {
    coupon_id: String,
    cap: Option<Money>,
    shipping_amount: Money,
    title: String,
    description: Option<String>,
}

impl CouponFreeShipping {
    pub fn new(coupon: &Coupon, cart: &CartView) -> Self {
        let cap = match coupon.value {
            PriceRule::Fixed(v) if v.is_positive() => Some(v),
            _ => None,
        };
        Self {
            coupon_id: coupon.id.as_str().to_string(),
            cap,
            shipping_amount: current_shipping(cart),
            title: coupon.name.clone(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let coupon = ctx.coupon(adjustment.origin())?;
        Ok(Self::new(&coupon, ctx.cart))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

fn current_shipping(cart: &CartView) -> Money {
    cart.adjustments
        .by_type(AdjustmentType::ShippingFee)
        .first()
        .map(|a| a.amount())
        .unwrap_or_else(|| Money::zero(cart.currency))
}

impl Adjuster for CouponFreeShipping {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::CouponFreeShipping
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::CouponFreeShipping
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::Cart
    }

    fn origin(&self) -> Option<String> {
        Some(self.coupon_id.clone())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        let waived = match self.cap {
            Some(cap) => self.shipping_amount.min(&cap),
            None => self.shipping_amount,
        };
        json!({
            "shipping_amount": self.shipping_amount.to_decimal(),
            "amount": waived.to_decimal(),
        })
    }

    fn calculate_amount(&self, adjustable: &dyn Adjustable) -> Money {
        let shipping = adjustable
            .adjustments()
            .by_type(AdjustmentType::ShippingFee)
            .first()
            .map(|a| a.amount())
            .unwrap_or_else(|| Money::zero(adjustable.currency()));
        let waived = match self.cap {
            Some(cap) => shipping.min(&cap),
            None => shipping,
        };
        waived.negate()
    }
}

/// Zero-amount gift grant from a free-product coupon. The gift items
/// themselves are added to the cart by the caller; this line persists
/// which products may be chosen and which were chosen.
#[derive(Debug, Clone)]
pub struct CouponFreeProduct {
    coupon_id: String,
    nr_possible_gifts: i64,
    possible_gifts: Vec<ProductId>,
    selected_gifts: Vec<ProductId>,
    title: String,
    description: Option<String>,
}

impl CouponFreeProduct {
    pub fn new(coupon: &Coupon, gifts: &GiftSelections) -> Self {
        Self {
            coupon_id: coupon.id.as_str().to_string(),
            nr_possible_gifts: coupon.gift_count,
            possible_gifts: coupon.gift_product_ids.clone(),
            selected_gifts: gifts.selected_for(coupon.id.as_str()).to_vec(),
            title: coupon.name.clone(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let coupon = ctx.coupon(adjustment.origin())?;
        Ok(Self::new(&coupon, ctx.gifts))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for CouponFreeProduct {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::CouponFreeProduct
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::CouponFreeProduct
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::Cart
    }

    fn origin(&self) -> Option<String> {
        Some(self.coupon_id.clone())
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

/// Threshold-gated freebie: gifts unlock once the items total reaches the
/// coupon's minimum purchase. Zero-amount like the other gift lines.
#[derive(Debug, Clone)]
pub struct FreebieOffer {
    coupon_id: String,
    nr_possible_gifts: i64,
    free_threshold: Option<Money>,
    possible_gifts: Vec<ProductId>,
    selected_gifts: Vec<ProductId>,
    title: String,
    description: Option<String>,
}

impl FreebieOffer {
    pub fn new(coupon: &Coupon, cart: &CartView, gifts: &GiftSelections) -> Self {
        let unlocked = coupon
            .gift_min_purchase
            .map(|threshold| cart.items_total().amount_cents >= threshold.amount_cents)
            .unwrap_or(true);
        Self {
            coupon_id: coupon.id.as_str().to_string(),
            nr_possible_gifts: if unlocked { coupon.gift_count } else { 0 },
            free_threshold: coupon.gift_min_purchase,
            possible_gifts: coupon.gift_product_ids.clone(),
            selected_gifts: gifts.selected_for(coupon.id.as_str()).to_vec(),
            title: coupon.name.clone(),
            description: None,
        }
    }

    pub fn nr_possible_gifts(&self) -> i64 {
        self.nr_possible_gifts
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let coupon = ctx.coupon(adjustment.origin())?;
        // Sanity-read the persisted count so malformed payloads surface
        // during reconstruction rather than later.
        data_i64(adjustment.data(), "nr_possible_gifts", "freebie_offer")?;
        Ok(Self::new(&coupon, ctx.cart, ctx.gifts))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for FreebieOffer {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::FreebieOffer
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::FreebieOffer
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::Cart
    }

    fn origin(&self) -> Option<String> {
        Some(self.coupon_id.clone())
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
            "free_threshold": self.free_threshold.map(|m| m.to_decimal()),
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
    use crate::ids::{CartId, CouponId, LineItemId};
    use crate::money::Currency;

    fn eur(cents: i64) -> Money {
        Money::new(cents, Currency::EUR)
    }

    fn line(id: &str, cents: i64, quantity: i64) -> LineView {
        LineView::new(
            LineItemId::new(id),
            ProductId::new("prod-1"),
            "Product",
            "SKU-1",
            eur(cents),
            quantity,
        )
    }

    fn cart_with_lines(lines: Vec<LineView>) -> CartView {
        let mut cart = CartView::new(CartId::new("cart-1"), Currency::EUR);
        for l in lines {
            cart.push_line(l);
        }
        cart
    }

    #[test]
    fn test_percent_coupon_per_item() {
        let coupon = Coupon::new(
            CouponId::new("c-1"),
            "TEN",
            "Ten percent",
            PriceRule::Percent(10.0),
        );
        let line = line("item-1", 2000, 2);

        let adjuster = CouponPercentOrFixed::for_item(&coupon, &line);
        let adjustment = adjuster.create_adjustment(&line).unwrap();

        assert_eq!(adjustment.amount().amount_cents, -400);
        assert_eq!(adjustment.data()["mode"], "item");
    }

    #[test]
    fn test_fixed_coupon_allocation_sums_exactly() {
        let coupon = Coupon::new(
            CouponId::new("c-2"),
            "FIVE",
            "Five off",
            PriceRule::Fixed(eur(500)),
        );
        let lines = vec![line("item-1", 1000, 3), line("item-2", 700, 2)];

        let adjusters = CouponPercentOrFixed::allocate(&coupon, &lines).unwrap();
        let amounts: Vec<i64> = adjusters
            .iter()
            .zip(&lines)
            .map(|(a, l)| a.create_adjustment(l).unwrap().amount().amount_cents)
            .collect();

        assert_eq!(amounts, vec![-342, -158]);
        assert_eq!(amounts.iter().sum::<i64>(), -500);
    }

    #[test]
    fn test_allocation_rejects_percent_coupon() {
        let coupon = Coupon::new(
            CouponId::new("c-3"),
            "TEN",
            "Ten percent",
            PriceRule::Percent(10.0),
        );
        assert!(CouponPercentOrFixed::allocate(&coupon, &[line("item-1", 1000, 1)]).is_err());
    }

    #[test]
    fn test_allocated_reproduction_picks_own_share() {
        let coupon = Coupon::new(
            CouponId::new("c-2"),
            "FIVE",
            "Five off",
            PriceRule::Fixed(eur(500)),
        );
        let cart = cart_with_lines(vec![line("item-1", 1000, 3), line("item-2", 700, 2)]);

        let adjusters = CouponPercentOrFixed::allocate(&coupon, &cart.lines).unwrap();
        let persisted = adjusters[1].create_adjustment(&cart.lines[1]).unwrap();

        let mut resolver = crate::resolver::InMemoryResolver::new();
        resolver.add_coupon(coupon);
        let gifts = GiftSelections::new();
        let ctx = ReproductionContext::new(&resolver, &cart, &gifts);

        let rebuilt = CouponPercentOrFixed::reproduce(&persisted, &ctx).unwrap();
        assert_eq!(
            rebuilt.calculate_amount(&cart.lines[1]).amount_cents,
            -158
        );
    }

    #[test]
    fn test_free_shipping_waives_in_full() {
        let coupon = Coupon::new(
            CouponId::new("c-4"),
            "SHIPFREE",
            "Free shipping",
            PriceRule::Fixed(eur(0)),
        );
        let cart = cart_with_lines(vec![line("item-1", 1000, 1)]);

        let adjuster = CouponFreeShipping::new(&coupon, &cart);
        // no shipping fee attached yet
        assert!(adjuster.calculate_amount(&cart).is_zero());
    }

    #[test]
    fn test_freebie_offer_respects_threshold() {
        let coupon = Coupon::new(
            CouponId::new("c-5"),
            "GIFT",
            "Freebie",
            PriceRule::Fixed(eur(0)),
        )
        .with_gifts(1, vec![ProductId::new("prod-9")])
        .with_gift_min_purchase(eur(5000));

        let below = cart_with_lines(vec![line("item-1", 1000, 1)]);
        let above = cart_with_lines(vec![line("item-1", 3000, 2)]);
        let gifts = GiftSelections::new();

        assert_eq!(FreebieOffer::new(&coupon, &below, &gifts).nr_possible_gifts(), 0);
        assert_eq!(FreebieOffer::new(&coupon, &above, &gifts).nr_possible_gifts(), 1);
    }

    #[test]
    fn test_coupon_free_product_records_selection() {
        let coupon = Coupon::new(
            CouponId::new("c-6"),
            "GIFT2",
            "Pick a gift",
            PriceRule::Fixed(eur(0)),
        )
        .with_gifts(2, vec![ProductId::new("prod-8"), ProductId::new("prod-9")]);

        let mut gifts = GiftSelections::new();
        gifts.select("c-6", vec![ProductId::new("prod-9")]);

        let cart = cart_with_lines(vec![line("item-1", 1000, 1)]);
        let adjuster = CouponFreeProduct::new(&coupon, &gifts);
        let adjustment = adjuster.create_adjustment(&cart).unwrap();

        assert!(adjustment.amount().is_zero());
        assert_eq!(adjustment.data()["nr_possible_gifts"], 2);
        assert_eq!(adjustment.data()["selected_gifts"][0], "prod-9");
    }
}
