//! Fee adjusters. Fees are owed on top of the items total, so their
//! amounts are positive, unlike the discount and coupon charges.

use crate::adjustable::Adjustable;
use crate::adjuster::{data_opt_f64, Adjuster, AdjusterKind, AdjusterScope};
use crate::adjustment::{Adjustment, AdjustmentType};
use crate::catalog::{FeeKind, PaymentMethod, ShippingMethod};
use crate::error::AdjustmentError;
use crate::money::Money;
use crate::resolver::ReproductionContext;
use serde_json::json;
use tracing::debug;

/// Shipping charge for a chosen method, waived above the method's
/// free-shipping threshold.
///
/// The threshold is compared against the sub total plus any coupon
/// charges already attached, so a value coupon can push a cart below
/// the free-shipping line.
#[derive(Debug, Clone)]
pub struct ShippingFee {
    method_id: String,
    price: Money,
    free_threshold: Option<Money>,
    title: String,
    description: Option<String>,
}

impl ShippingFee {
    pub fn new(method: &ShippingMethod) -> Self {
        Self {
            method_id: method.id.as_str().to_string(),
            price: method.price,
            free_threshold: method.free_threshold,
            title: method.name.clone(),
            description: None,
        }
    }

    /// Sub total adjusted by coupon charges, the basis for the
    /// free-shipping comparison. Line-attached coupon shares count via
    /// [`Adjustable::coupon_charges`].
    fn eligible_total(adjustable: &dyn Adjustable) -> Money {
        adjustable.sub_total().add(&adjustable.coupon_charges())
    }

    fn is_free(&self, adjustable: &dyn Adjustable) -> bool {
        match self.free_threshold {
            Some(threshold) => {
                Self::eligible_total(adjustable).amount_cents >= threshold.amount_cents
            }
            None => false,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let method = ctx.shipping_method(adjustment.origin())?;
        Ok(Self::new(&method))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for ShippingFee {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::ShippingFee
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::ShippingFee
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::Cart
    }

    fn origin(&self) -> Option<String> {
        Some(self.method_id.clone())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({
            "amount": self.price.to_decimal(),
            "free_threshold": self.free_threshold.map(|m| m.to_decimal()),
        })
    }

    fn calculate_amount(&self, adjustable: &dyn Adjustable) -> Money {
        if self.is_free(adjustable) {
            debug!(
                method = %self.method_id,
                eligible = %Self::eligible_total(adjustable),
                "shipping waived above free threshold"
            );
            Money::zero(adjustable.currency())
        } else {
            self.price
        }
    }
}

/// Payment processing fee, flat or a percentage of the payable total.
///
/// The percentage basis excludes payment fee adjustments already
/// attached, so recalculating an existing fee converges instead of
/// compounding.
#[derive(Debug, Clone)]
pub struct PaymentFee {
    method_id: String,
    fee: FeeKind,
    title: String,
    description: Option<String>,
}

impl PaymentFee {
    pub fn new(method: &PaymentMethod) -> Self {
        Self {
            method_id: method.id.as_str().to_string(),
            fee: method.fee,
            title: method.name.clone(),
            description: None,
        }
    }

    fn basis(adjustable: &dyn Adjustable) -> Money {
        let own_fees = adjustable
            .adjustments()
            .by_type(AdjustmentType::PaymentFee)
            .iter()
            .fold(Money::zero(adjustable.currency()), |acc, a| {
                acc.add(&a.amount())
            });
        adjustable.total().subtract(&own_fees)
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let method = ctx.payment_method(adjustment.origin())?;
        Ok(Self::new(&method))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for PaymentFee {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::PaymentFee
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::PaymentFee
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::Cart
    }

    fn origin(&self) -> Option<String> {
        Some(self.method_id.clone())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        match self.fee {
            FeeKind::Flat(amount) => json!({
                "fee_type": "flat",
                "value": amount.to_decimal(),
            }),
            FeeKind::Percent(percent) => json!({
                "fee_type": "percent",
                "value": percent,
            }),
        }
    }

    fn calculate_amount(&self, adjustable: &dyn Adjustable) -> Money {
        match self.fee {
            FeeKind::Flat(amount) => amount,
            FeeKind::Percent(percent) => Self::basis(adjustable).percentage(percent),
        }
    }
}

/// Flat packaging surcharge. Not tied to any catalog record; the amount
/// itself is the persisted state.
#[derive(Debug, Clone)]
pub struct PackagingFee {
    amount: Money,
    title: String,
    description: Option<String>,
}

impl PackagingFee {
    pub fn new(amount: Money) -> Self {
        Self {
            amount,
            title: "Packaging".to_string(),
            description: None,
        }
    }

    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let amount = data_opt_f64(adjustment.data(), "amount").ok_or_else(|| {
            AdjustmentError::MalformedData {
                adjuster: "packaging_fee",
                detail: "missing numeric field `amount`".to_string(),
            }
        })?;
        let mut fee = Self::new(Money::from_decimal(amount, ctx.cart.currency));
        fee.title = adjustment.title().to_string();
        Ok(fee)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for PackagingFee {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::PackagingFee
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::PackagingFee
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::Cart
    }

    fn origin(&self) -> Option<String> {
        None
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({ "amount": self.amount.to_decimal() })
    }

    fn calculate_amount(&self, _adjustable: &dyn Adjustable) -> Money {
        self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustable::{CartView, LineView};
    use crate::catalog::{Coupon, PriceRule};
    use crate::ids::{
        CartId, CouponId, LineItemId, PaymentMethodId, ProductId, ShippingMethodId,
    };
    use crate::money::Currency;

    fn eur(cents: i64) -> Money {
        Money::new(cents, Currency::EUR)
    }

    fn cart_totalling(cents: i64) -> CartView {
        let mut cart = CartView::new(CartId::new("cart-1"), Currency::EUR);
        cart.push_line(LineView::new(
            LineItemId::new("item-1"),
            ProductId::new("prod-1"),
            "Product",
            "SKU-1",
            eur(cents),
            1,
        ));
        cart
    }

    fn shipping_method(price: i64, threshold: Option<i64>) -> ShippingMethod {
        ShippingMethod {
            id: ShippingMethodId::new("ship-1"),
            name: "Standard".to_string(),
            price: eur(price),
            free_threshold: threshold.map(eur),
        }
    }

    #[test]
    fn test_shipping_fee_threshold_boundaries() {
        let fee = ShippingFee::new(&shipping_method(490, Some(5000)));

        assert_eq!(fee.calculate_amount(&cart_totalling(4999)).amount_cents, 490);
        assert!(fee.calculate_amount(&cart_totalling(5000)).is_zero());
        assert!(fee.calculate_amount(&cart_totalling(5001)).is_zero());
    }

    #[test]
    fn test_shipping_fee_counts_coupon_charges() {
        // 50.00 cart with a 1.00 coupon charge drops below the threshold
        let mut cart = cart_totalling(5000);
        let coupon = Coupon::new(
            CouponId::new("c-1"),
            "ONE",
            "One off",
            PriceRule::Fixed(eur(100)),
        );
        let coupon_adjustment =
            crate::adjuster::CouponPercentOrFixed::for_cart(&coupon, cart.items_total())
                .create_adjustment(&cart)
                .unwrap();
        cart.adjustments.add(coupon_adjustment);

        let fee = ShippingFee::new(&shipping_method(490, Some(5000)));
        assert_eq!(fee.calculate_amount(&cart).amount_cents, 490);
    }

    #[test]
    fn test_percent_payment_fee() {
        let method = PaymentMethod {
            id: PaymentMethodId::new("pay-1"),
            name: "Card".to_string(),
            fee: FeeKind::Percent(2.5),
        };
        let fee = PaymentFee::new(&method);
        let cart = cart_totalling(12000);

        // 2.5% of 120.00
        assert_eq!(fee.calculate_amount(&cart).amount_cents, 300);
    }

    #[test]
    fn test_percent_payment_fee_recalculate_converges() {
        let method = PaymentMethod {
            id: PaymentMethodId::new("pay-1"),
            name: "Card".to_string(),
            fee: FeeKind::Percent(2.5),
        };
        let fee = PaymentFee::new(&method);
        let mut cart = cart_totalling(12000);

        let mut adjustment = fee.create_adjustment(&cart).unwrap();
        cart.adjustments.add(adjustment.clone());

        // recalculating against the cart that already carries the fee
        // must not compound it
        fee.recalculate(&mut adjustment, &cart).unwrap();
        assert_eq!(adjustment.amount().amount_cents, 300);
    }

    #[test]
    fn test_packaging_fee_is_positive_flat() {
        let fee = PackagingFee::new(eur(150));
        let cart = cart_totalling(1000);
        let adjustment = fee.create_adjustment(&cart).unwrap();

        assert_eq!(adjustment.amount().amount_cents, 150);
        assert!(adjustment.is_credit());
        assert!(adjustment.origin().is_none());
    }
}
