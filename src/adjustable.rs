//! The `Adjustable` capability and the cart views the engine consumes.
//!
//! The engine never owns a cart. Callers hand it either a whole-cart view
//! or a single line view; both can carry adjustments and report totals.
//! Line unit prices are already adjusted prices, i.e. whatever base price
//! the surrounding pricing pipeline considers current for the line.

use crate::adjustment::AdjustmentCollection;
use crate::ids::{CartId, LineItemId, ProductId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// What kind of aggregate an adjustment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustableKind {
    Cart,
    LineItem,
}

impl AdjustableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustableKind::Cart => "cart",
            AdjustableKind::LineItem => "line_item",
        }
    }
}

/// Polymorphic reference to the aggregate an adjustment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdjustableRef {
    pub kind: AdjustableKind,
    pub id: String,
}

impl AdjustableRef {
    pub fn cart(id: &CartId) -> Self {
        Self {
            kind: AdjustableKind::Cart,
            id: id.as_str().to_string(),
        }
    }

    pub fn line_item(id: &LineItemId) -> Self {
        Self {
            kind: AdjustableKind::LineItem,
            id: id.as_str().to_string(),
        }
    }
}

/// Anything that can own adjustments and report totals.
pub trait Adjustable {
    /// Polymorphic attachment reference.
    fn adjustable_ref(&self) -> AdjustableRef;

    /// Currency all totals are reported in.
    fn currency(&self) -> Currency;

    /// Sum of line subtotals, before adjustments.
    fn items_total(&self) -> Money;

    /// Items total; kept distinct so order-like adjustables can diverge.
    fn sub_total(&self) -> Money {
        self.items_total()
    }

    /// Payable total: items total plus the adjustment sum.
    fn total(&self) -> Money {
        self.items_total().add(&self.adjustments().total())
    }

    /// The adjustments currently attached to this aggregate.
    fn adjustments(&self) -> &AdjustmentCollection;

    /// Sum of coupon-typed charges visible to this aggregate. Carts
    /// include their lines' collections, since an allocated fixed
    /// coupon attaches its shares there.
    fn coupon_charges(&self) -> Money {
        self.adjustments()
            .iter()
            .filter(|a| a.adjustment_type().is_coupon())
            .fold(Money::zero(self.currency()), |acc, a| acc.add(&a.amount()))
    }
}

/// The engine's read view of one cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineView {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    /// Adjusted per-unit price.
    pub unit_price: Money,
    pub quantity: i64,
    /// Adjustments attached to this line.
    pub adjustments: AdjustmentCollection,
}

impl LineView {
    pub fn new(
        id: LineItemId,
        product_id: ProductId,
        product_name: impl Into<String>,
        sku: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        let currency = unit_price.currency;
        Self {
            id,
            product_id,
            product_name: product_name.into(),
            sku: sku.into(),
            unit_price,
            quantity,
            adjustments: AdjustmentCollection::new(currency),
        }
    }

    /// Line subtotal (unit price times quantity).
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

impl Adjustable for LineView {
    fn adjustable_ref(&self) -> AdjustableRef {
        AdjustableRef::line_item(&self.id)
    }

    fn currency(&self) -> Currency {
        self.unit_price.currency
    }

    fn items_total(&self) -> Money {
        self.subtotal()
    }

    fn adjustments(&self) -> &AdjustmentCollection {
        &self.adjustments
    }
}

/// The engine's read view of a whole cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub id: CartId,
    pub currency: Currency,
    pub lines: Vec<LineView>,
    /// Cart-level adjustments.
    pub adjustments: AdjustmentCollection,
}

impl CartView {
    pub fn new(id: CartId, currency: Currency) -> Self {
        Self {
            id,
            currency,
            lines: Vec::new(),
            adjustments: AdjustmentCollection::new(currency),
        }
    }

    /// Append a line, preserving insertion order.
    pub fn push_line(&mut self, line: LineView) {
        self.lines.push(line);
    }

    /// Find a line by its item id.
    pub fn line(&self, id: &LineItemId) -> Option<&LineView> {
        self.lines.iter().find(|l| &l.id == id)
    }
}

impl Adjustable for CartView {
    fn adjustable_ref(&self) -> AdjustableRef {
        AdjustableRef::cart(&self.id)
    }

    fn currency(&self) -> Currency {
        self.currency
    }

    fn items_total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(self.currency), |acc, l| acc.add(&l.subtotal()))
    }

    fn adjustments(&self) -> &AdjustmentCollection {
        &self.adjustments
    }

    fn coupon_charges(&self) -> Money {
        self.adjustments
            .iter()
            .chain(self.lines.iter().flat_map(|l| l.adjustments.iter()))
            .filter(|a| a.adjustment_type().is_coupon())
            .fold(Money::zero(self.currency), |acc, a| acc.add(&a.amount()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjuster::AdjusterKind;
    use crate::adjustment::{AdjustmentAttributes, AdjustmentType};

    fn coupon_adjustment(adjustable: AdjustableRef, amount_cents: i64) -> crate::adjustment::Adjustment {
        crate::adjustment::Adjustment::from_attributes(AdjustmentAttributes {
            adjustment_type: AdjustmentType::CouponPercentOrFixed,
            adjustable,
            adjuster_kind: AdjusterKind::CouponPercentOrFixed,
            origin: Some("c-1".to_string()),
            title: "Coupon".to_string(),
            description: None,
            data: serde_json::Value::Null,
            amount: Money::new(amount_cents, Currency::EUR),
            is_locked: false,
            is_included: false,
        })
    }

    #[test]
    fn test_coupon_charges_span_cart_and_lines() {
        let mut cart = CartView::new(CartId::new("cart-1"), Currency::EUR);
        cart.push_line(LineView::new(
            LineItemId::new("item-1"),
            ProductId::new("prod-1"),
            "Product A",
            "SKU-A",
            Money::new(1000, Currency::EUR),
            1,
        ));

        cart.adjustments
            .add(coupon_adjustment(AdjustableRef::cart(&cart.id), -200));
        let line_ref = AdjustableRef::line_item(&cart.lines[0].id);
        cart.lines[0]
            .adjustments
            .add(coupon_adjustment(line_ref, -300));

        assert_eq!(cart.coupon_charges().amount_cents, -500);
        // a line on its own only sees its own collection
        assert_eq!(cart.lines[0].coupon_charges().amount_cents, -300);
    }

    #[test]
    fn test_cart_view_totals() {
        let mut cart = CartView::new(CartId::new("cart-1"), Currency::EUR);
        cart.push_line(LineView::new(
            LineItemId::new("item-1"),
            ProductId::new("prod-1"),
            "Product A",
            "SKU-A",
            Money::new(1000, Currency::EUR),
            3,
        ));
        cart.push_line(LineView::new(
            LineItemId::new("item-2"),
            ProductId::new("prod-2"),
            "Product B",
            "SKU-B",
            Money::new(700, Currency::EUR),
            2,
        ));

        assert_eq!(cart.items_total().amount_cents, 4400);
        assert_eq!(cart.sub_total().amount_cents, 4400);
        assert_eq!(cart.total().amount_cents, 4400);
    }

    #[test]
    fn test_line_view_ref() {
        let line = LineView::new(
            LineItemId::new("item-9"),
            ProductId::new("prod-9"),
            "Product",
            "SKU-9",
            Money::new(500, Currency::EUR),
            1,
        );
        let r = line.adjustable_ref();
        assert_eq!(r.kind, AdjustableKind::LineItem);
        assert_eq!(r.id, "item-9");
    }
}
