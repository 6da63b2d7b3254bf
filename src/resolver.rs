//! Re-resolution of persisted references.
//!
//! Reconstructing an adjuster from a persisted adjustment needs the live
//! domain records its origin points at. That lookup is delegated to a
//! `Resolver` capability so it stays testable with an in-memory fake.

use crate::adjustable::{AdjustableRef, CartView, LineView};
use crate::catalog::{
    ClientCard, Coupon, Discount, GiftSelections, IntervalPrice, PaymentMethod, ProductRecord,
    ShippingMethod,
};
use crate::error::AdjustmentError;
use std::collections::HashMap;

/// Synchronous lookup of the records adjusters reference by origin id.
pub trait Resolver {
    fn coupon(&self, id: &str) -> Option<Coupon>;
    fn discount(&self, id: &str) -> Option<Discount>;
    fn interval_price(&self, id: &str) -> Option<IntervalPrice>;
    fn product(&self, id: &str) -> Option<ProductRecord>;
    fn payment_method(&self, id: &str) -> Option<PaymentMethod>;
    fn shipping_method(&self, id: &str) -> Option<ShippingMethod>;
    fn card(&self, id: &str) -> Option<ClientCard>;
}

/// Everything a reconstruction pass needs: the resolver, the current
/// cart view, and the caller's gift selections.
pub struct ReproductionContext<'a> {
    pub resolver: &'a dyn Resolver,
    pub cart: &'a CartView,
    pub gifts: &'a GiftSelections,
}

impl<'a> ReproductionContext<'a> {
    pub fn new(
        resolver: &'a dyn Resolver,
        cart: &'a CartView,
        gifts: &'a GiftSelections,
    ) -> Self {
        Self {
            resolver,
            cart,
            gifts,
        }
    }

    pub fn coupon(&self, origin: Option<&str>) -> Result<Coupon, AdjustmentError> {
        let id = require_origin(origin, "coupon")?;
        self.resolver
            .coupon(id)
            .ok_or_else(|| missing("coupon", id))
    }

    pub fn discount(&self, origin: Option<&str>) -> Result<Discount, AdjustmentError> {
        let id = require_origin(origin, "discount")?;
        self.resolver
            .discount(id)
            .ok_or_else(|| missing("discount", id))
    }

    pub fn interval_price(&self, id: &str) -> Result<IntervalPrice, AdjustmentError> {
        self.resolver
            .interval_price(id)
            .ok_or_else(|| missing("interval price", id))
    }

    pub fn product(&self, id: &str) -> Result<ProductRecord, AdjustmentError> {
        self.resolver
            .product(id)
            .ok_or_else(|| missing("product", id))
    }

    pub fn payment_method(&self, origin: Option<&str>) -> Result<PaymentMethod, AdjustmentError> {
        let id = require_origin(origin, "payment method")?;
        self.resolver
            .payment_method(id)
            .ok_or_else(|| missing("payment method", id))
    }

    pub fn shipping_method(&self, origin: Option<&str>) -> Result<ShippingMethod, AdjustmentError> {
        let id = require_origin(origin, "shipping method")?;
        self.resolver
            .shipping_method(id)
            .ok_or_else(|| missing("shipping method", id))
    }

    pub fn card(&self, origin: Option<&str>) -> Result<ClientCard, AdjustmentError> {
        let id = require_origin(origin, "client card")?;
        self.resolver.card(id).ok_or_else(|| missing("client card", id))
    }

    /// The cart line a line-scoped adjustment is attached to.
    pub fn line(&self, adjustable: &AdjustableRef) -> Result<&LineView, AdjustmentError> {
        self.cart
            .lines
            .iter()
            .find(|l| l.id.as_str() == adjustable.id)
            .ok_or_else(|| missing("cart item", &adjustable.id))
    }
}

fn require_origin<'a>(
    origin: Option<&'a str>,
    kind: &'static str,
) -> Result<&'a str, AdjustmentError> {
    origin.ok_or(AdjustmentError::MissingReference {
        kind,
        id: String::new(),
    })
}

fn missing(kind: &'static str, id: &str) -> AdjustmentError {
    AdjustmentError::MissingReference {
        kind,
        id: id.to_string(),
    }
}

/// In-memory resolver backed by hash maps. Useful for tests and for
/// callers that load all relevant records up front.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    coupons: HashMap<String, Coupon>,
    discounts: HashMap<String, Discount>,
    intervals: HashMap<String, IntervalPrice>,
    products: HashMap<String, ProductRecord>,
    payment_methods: HashMap<String, PaymentMethod>,
    shipping_methods: HashMap<String, ShippingMethod>,
    cards: HashMap<String, ClientCard>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coupon(&mut self, coupon: Coupon) {
        self.coupons.insert(coupon.id.as_str().to_string(), coupon);
    }

    pub fn add_discount(&mut self, discount: Discount) {
        self.discounts
            .insert(discount.id.as_str().to_string(), discount);
    }

    pub fn add_interval_price(&mut self, interval: IntervalPrice) {
        self.intervals
            .insert(interval.id.as_str().to_string(), interval);
    }

    pub fn add_product(&mut self, product: ProductRecord) {
        self.products
            .insert(product.id.as_str().to_string(), product);
    }

    pub fn add_payment_method(&mut self, method: PaymentMethod) {
        self.payment_methods
            .insert(method.id.as_str().to_string(), method);
    }

    pub fn add_shipping_method(&mut self, method: ShippingMethod) {
        self.shipping_methods
            .insert(method.id.as_str().to_string(), method);
    }

    pub fn add_card(&mut self, card: ClientCard) {
        self.cards.insert(card.id.as_str().to_string(), card);
    }
}

impl Resolver for InMemoryResolver {
    fn coupon(&self, id: &str) -> Option<Coupon> {
        self.coupons.get(id).cloned()
    }

    fn discount(&self, id: &str) -> Option<Discount> {
        self.discounts.get(id).cloned()
    }

    fn interval_price(&self, id: &str) -> Option<IntervalPrice> {
        self.intervals.get(id).cloned()
    }

    fn product(&self, id: &str) -> Option<ProductRecord> {
        self.products.get(id).cloned()
    }

    fn payment_method(&self, id: &str) -> Option<PaymentMethod> {
        self.payment_methods.get(id).cloned()
    }

    fn shipping_method(&self, id: &str) -> Option<ShippingMethod> {
        self.shipping_methods.get(id).cloned()
    }

    fn card(&self, id: &str) -> Option<ClientCard> {
        self.cards.get(id).cloned()
    }
}
