//! The strategy abstraction that turns pricing rules into adjustments.
//!
//! Each adjuster encapsulates one rule. It computes a signed amount for
//! an adjustable, builds the attribute set of a new adjustment, refreshes
//! an existing one, and can be reconstructed purely from a persisted
//! adjustment plus a resolver for the records its origin points at.
//!
//! Sign convention: discount, coupon and credit adjusters yield charges
//! as negative amounts; fee adjusters (shipping, payment, packaging)
//! yield the fee as a positive amount owed. The collection total is a
//! plain sum, so the asymmetry is preserved per variant.

mod card;
mod coupon;
mod discount;
mod fees;
mod offers;

pub use card::ClientCardCredit;
pub use coupon::{CouponFreeProduct, CouponFreeShipping, CouponPercentOrFixed, FreebieOffer};
pub use discount::{
    CartValueGift, DirectDiscount, IntervalDiscount, PercentOrFixedDiscount, StoreDiscount,
};
pub use fees::{PackagingFee, PaymentFee, ShippingFee};
pub use offers::{CheapestItemFree, IdenticalItemFree, ProductGift, TieredPercentOffer};

use crate::adjustable::{Adjustable, AdjustableKind};
use crate::adjustment::{Adjustment, AdjustmentAttributes, AdjustmentCollection, AdjustmentType};
use crate::error::AdjustmentError;
use crate::money::Money;
use crate::resolver::ReproductionContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which concrete strategy produced an adjustment. Persisted alongside
/// the adjustment so the strategy can be reconstructed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjusterKind {
    StoreDiscount,
    IntervalDiscount,
    DirectDiscount,
    PercentOrFixedDiscount,
    TieredPercentOffer,
    CheapestItemFree,
    IdenticalItemFree,
    ProductGift,
    CartValueGift,
    ShippingFee,
    PaymentFee,
    PackagingFee,
    CouponPercentOrFixed,
    CouponFreeShipping,
    CouponFreeProduct,
    FreebieOffer,
    ClientCardCredit,
}

impl AdjusterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjusterKind::StoreDiscount => "store_discount",
            AdjusterKind::IntervalDiscount => "interval_discount",
            AdjusterKind::DirectDiscount => "direct_discount",
            AdjusterKind::PercentOrFixedDiscount => "percent_or_fixed_discount",
            AdjusterKind::TieredPercentOffer => "tiered_percent_offer",
            AdjusterKind::CheapestItemFree => "cheapest_item_free",
            AdjusterKind::IdenticalItemFree => "identical_item_free",
            AdjusterKind::ProductGift => "product_gift",
            AdjusterKind::CartValueGift => "cart_value_gift",
            AdjusterKind::ShippingFee => "shipping_fee",
            AdjusterKind::PaymentFee => "payment_fee",
            AdjusterKind::PackagingFee => "packaging_fee",
            AdjusterKind::CouponPercentOrFixed => "coupon_percent_or_fixed",
            AdjusterKind::CouponFreeShipping => "coupon_free_shipping",
            AdjusterKind::CouponFreeProduct => "coupon_free_product",
            AdjusterKind::FreebieOffer => "freebie_offer",
            AdjusterKind::ClientCardCredit => "client_card_credit",
        }
    }
}

impl fmt::Display for AdjusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an adjuster can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjusterScope {
    Cart,
    LineItem,
}

impl AdjusterScope {
    fn matches(&self, kind: AdjustableKind) -> bool {
        match self {
            AdjusterScope::Cart => kind == AdjustableKind::Cart,
            AdjusterScope::LineItem => kind == AdjustableKind::LineItem,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            AdjusterScope::Cart => "cart",
            AdjusterScope::LineItem => "line_item",
        }
    }
}

/// One pricing rule, behind a polymorphic contract.
///
/// `create_adjustment` and `recalculate` are provided methods: they were
/// structurally identical across every concrete strategy, so the shared
/// behavior lives here and the variants supply only their own state.
pub trait Adjuster: fmt::Debug {
    /// The strategy's persisted kind tag.
    fn kind(&self) -> AdjusterKind;

    /// The type tag of the adjustments this strategy produces.
    fn adjustment_type(&self) -> AdjustmentType;

    /// Whether this rule targets a whole cart or a single line.
    fn scope(&self) -> AdjusterScope;

    /// Identifier of the originating domain object, if any.
    fn origin(&self) -> Option<String>;

    fn title(&self) -> String;

    fn description(&self) -> Option<String> {
        None
    }

    /// Strategy-specific payload, sufficient for reconstruction.
    fn data(&self) -> serde_json::Value;

    /// The freshly computed, signed amount for this adjustable.
    fn calculate_amount(&self, adjustable: &dyn Adjustable) -> Money;

    fn is_locked(&self) -> bool {
        false
    }

    fn is_included(&self) -> bool {
        false
    }

    /// Build a new adjustment from the strategy's current state.
    fn create_adjustment(
        &self,
        adjustable: &dyn Adjustable,
    ) -> Result<Adjustment, AdjustmentError> {
        Ok(Adjustment::from_attributes(self.attributes(adjustable)?))
    }

    /// Overwrite an existing adjustment's amount with a fresh value.
    /// Idempotent for unchanged inputs; surfaces the lock error when the
    /// adjustment is locked.
    fn recalculate(
        &self,
        adjustment: &mut Adjustment,
        adjustable: &dyn Adjustable,
    ) -> Result<(), AdjustmentError> {
        self.check_scope(adjustable)?;
        adjustment.set_amount(self.calculate_amount(adjustable))
    }

    /// The full attribute set for a new adjustment on this adjustable.
    fn attributes(
        &self,
        adjustable: &dyn Adjustable,
    ) -> Result<AdjustmentAttributes, AdjustmentError> {
        self.check_scope(adjustable)?;
        Ok(AdjustmentAttributes {
            adjustment_type: self.adjustment_type(),
            adjustable: adjustable.adjustable_ref(),
            adjuster_kind: self.kind(),
            origin: self.origin(),
            title: self.title(),
            description: self.description(),
            data: self.data(),
            amount: self.calculate_amount(adjustable),
            is_locked: self.is_locked(),
            is_included: self.is_included(),
        })
    }

    /// Verify the adjustable is something this rule can target.
    fn check_scope(&self, adjustable: &dyn Adjustable) -> Result<(), AdjustmentError> {
        let got = adjustable.adjustable_ref().kind;
        if self.scope().matches(got) {
            Ok(())
        } else {
            Err(AdjustmentError::UnsupportedAdjustable {
                adjuster: self.kind().as_str(),
                expected: self.scope().as_str(),
                got: got.as_str(),
            })
        }
    }
}

/// Reconstruct the strategy that produced a persisted adjustment.
///
/// Dispatches on the persisted adjuster kind; each strategy re-resolves
/// its domain references through the context's resolver and fails with
/// [`AdjustmentError::MissingReference`] when one is gone.
pub fn reproduce_from_adjustment(
    adjustment: &Adjustment,
    ctx: &ReproductionContext<'_>,
) -> Result<Box<dyn Adjuster>, AdjustmentError> {
    let adjuster: Box<dyn Adjuster> = match adjustment.adjuster_kind() {
        AdjusterKind::StoreDiscount => Box::new(StoreDiscount::reproduce(adjustment, ctx)?),
        AdjusterKind::IntervalDiscount => Box::new(IntervalDiscount::reproduce(adjustment, ctx)?),
        AdjusterKind::DirectDiscount => Box::new(DirectDiscount::reproduce(adjustment, ctx)?),
        AdjusterKind::PercentOrFixedDiscount => {
            Box::new(PercentOrFixedDiscount::reproduce(adjustment, ctx)?)
        }
        AdjusterKind::TieredPercentOffer => {
            Box::new(TieredPercentOffer::reproduce(adjustment, ctx)?)
        }
        AdjusterKind::CheapestItemFree => Box::new(CheapestItemFree::reproduce(adjustment, ctx)?),
        AdjusterKind::IdenticalItemFree => Box::new(IdenticalItemFree::reproduce(adjustment, ctx)?),
        AdjusterKind::ProductGift => Box::new(ProductGift::reproduce(adjustment, ctx)?),
        AdjusterKind::CartValueGift => Box::new(CartValueGift::reproduce(adjustment, ctx)?),
        AdjusterKind::ShippingFee => Box::new(ShippingFee::reproduce(adjustment, ctx)?),
        AdjusterKind::PaymentFee => Box::new(PaymentFee::reproduce(adjustment, ctx)?),
        AdjusterKind::PackagingFee => Box::new(PackagingFee::reproduce(adjustment, ctx)?),
        AdjusterKind::CouponPercentOrFixed => {
            Box::new(CouponPercentOrFixed::reproduce(adjustment, ctx)?)
        }
        AdjusterKind::CouponFreeShipping => {
            Box::new(CouponFreeShipping::reproduce(adjustment, ctx)?)
        }
        AdjusterKind::CouponFreeProduct => Box::new(CouponFreeProduct::reproduce(adjustment, ctx)?),
        AdjusterKind::FreebieOffer => Box::new(FreebieOffer::reproduce(adjustment, ctx)?),
        AdjusterKind::ClientCardCredit => Box::new(ClientCardCredit::reproduce(adjustment, ctx)?),
    };
    Ok(adjuster)
}

/// Reproduce and recalculate every adjustment in a collection.
///
/// Fails loudly on a locked member instead of silently skipping it;
/// callers that want to keep a locked amount must unlock first or leave
/// the adjustment out of the refreshed collection.
pub fn refresh_all(
    collection: &mut AdjustmentCollection,
    adjustable: &dyn Adjustable,
    ctx: &ReproductionContext<'_>,
) -> Result<(), AdjustmentError> {
    for adjustment in collection.iter_mut() {
        if adjustment.is_locked() {
            return Err(AdjustmentError::LockedAdjustment {
                id: adjustment.id().as_str().to_string(),
            });
        }
        let adjuster = reproduce_from_adjustment(adjustment, ctx)?;
        adjuster.recalculate(adjustment, adjustable)?;
    }
    Ok(())
}

/// Read a required numeric field from a persisted data payload.
pub(crate) fn data_f64(
    data: &serde_json::Value,
    key: &str,
    adjuster: &'static str,
) -> Result<f64, AdjustmentError> {
    data.get(key)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| AdjustmentError::MalformedData {
            adjuster,
            detail: format!("missing numeric field `{key}`"),
        })
}

/// Read a required integer field from a persisted data payload.
pub(crate) fn data_i64(
    data: &serde_json::Value,
    key: &str,
    adjuster: &'static str,
) -> Result<i64, AdjustmentError> {
    data.get(key)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| AdjustmentError::MalformedData {
            adjuster,
            detail: format!("missing integer field `{key}`"),
        })
}

/// Read a required string field from a persisted data payload.
pub(crate) fn data_str<'a>(
    data: &'a serde_json::Value,
    key: &str,
    adjuster: &'static str,
) -> Result<&'a str, AdjustmentError> {
    data.get(key)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| AdjustmentError::MalformedData {
            adjuster,
            detail: format!("missing string field `{key}`"),
        })
}

/// Read an optional numeric field from a persisted data payload.
pub(crate) fn data_opt_f64(data: &serde_json::Value, key: &str) -> Option<f64> {
    data.get(key).and_then(serde_json::Value::as_f64)
}
