//! The closed taxonomy of adjustment kinds.

use crate::error::AdjustmentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of adjustment. The engine only needs equality and the
/// classification predicates; grouping and display live in the callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
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
    CouponPercentOrFixed,
    CouponFreeShipping,
    CouponFreeProduct,
    ClientCardCredit,
    PackagingFee,
    PaymentFee,
    FreebieOffer,
}

/// Gift-style types that get rendered apart from regular discount lines.
const VISUAL_SEPARATORS: &[AdjustmentType] = &[
    AdjustmentType::CheapestItemFree,
    AdjustmentType::IdenticalItemFree,
    AdjustmentType::ProductGift,
    AdjustmentType::CouponFreeProduct,
];

/// Discount-campaign types.
const CAMPAIGN_DISCOUNTS: &[AdjustmentType] = &[
    AdjustmentType::PercentOrFixedDiscount,
    AdjustmentType::TieredPercentOffer,
    AdjustmentType::CheapestItemFree,
    AdjustmentType::IdenticalItemFree,
    AdjustmentType::ProductGift,
    AdjustmentType::CartValueGift,
];

/// Coupon-originated types.
const COUPONS: &[AdjustmentType] = &[
    AdjustmentType::CouponPercentOrFixed,
    AdjustmentType::CouponFreeShipping,
    AdjustmentType::CouponFreeProduct,
    AdjustmentType::FreebieOffer,
];

/// Promotion types.
const PROMOTIONS: &[AdjustmentType] = &[
    AdjustmentType::PercentOrFixedDiscount,
    AdjustmentType::TieredPercentOffer,
    AdjustmentType::CheapestItemFree,
    AdjustmentType::IdenticalItemFree,
    AdjustmentType::ProductGift,
    AdjustmentType::CartValueGift,
    AdjustmentType::DirectDiscount,
    AdjustmentType::StoreDiscount,
];

/// Campaign types hidden from enumerable choices.
const HIDDEN_FROM_CHOICES: &[AdjustmentType] = &[AdjustmentType::CartValueGift];

impl AdjustmentType {
    /// Every known type, in declaration order.
    pub const ALL: &'static [AdjustmentType] = &[
        AdjustmentType::StoreDiscount,
        AdjustmentType::IntervalDiscount,
        AdjustmentType::DirectDiscount,
        AdjustmentType::PercentOrFixedDiscount,
        AdjustmentType::TieredPercentOffer,
        AdjustmentType::CheapestItemFree,
        AdjustmentType::IdenticalItemFree,
        AdjustmentType::ProductGift,
        AdjustmentType::CartValueGift,
        AdjustmentType::ShippingFee,
        AdjustmentType::CouponPercentOrFixed,
        AdjustmentType::CouponFreeShipping,
        AdjustmentType::CouponFreeProduct,
        AdjustmentType::ClientCardCredit,
        AdjustmentType::PackagingFee,
        AdjustmentType::PaymentFee,
        AdjustmentType::FreebieOffer,
    ];

    /// The persisted string tag.
    pub fn tag(&self) -> &'static str {
        match self {
            AdjustmentType::StoreDiscount => "store_discount",
            AdjustmentType::IntervalDiscount => "interval_discount",
            AdjustmentType::DirectDiscount => "direct_discount",
            AdjustmentType::PercentOrFixedDiscount => "percent_or_fixed_discount",
            AdjustmentType::TieredPercentOffer => "tiered_percent_offer",
            AdjustmentType::CheapestItemFree => "cheapest_item_free",
            AdjustmentType::IdenticalItemFree => "identical_item_free",
            AdjustmentType::ProductGift => "product_gift",
            AdjustmentType::CartValueGift => "cart_value_gift",
            AdjustmentType::ShippingFee => "shipping_fee",
            AdjustmentType::CouponPercentOrFixed => "coupon_percent_or_fixed",
            AdjustmentType::CouponFreeShipping => "coupon_free_shipping",
            AdjustmentType::CouponFreeProduct => "coupon_free_product",
            AdjustmentType::ClientCardCredit => "client_card_credit",
            AdjustmentType::PackagingFee => "packaging_fee",
            AdjustmentType::PaymentFee => "payment_fee",
            AdjustmentType::FreebieOffer => "freebie_offer",
        }
    }

    /// Parse a persisted tag, failing fast on unknown input.
    pub fn from_tag(tag: &str) -> Result<Self, AdjustmentError> {
        Self::ALL
            .iter()
            .find(|t| t.tag() == tag)
            .copied()
            .ok_or_else(|| AdjustmentError::InvalidTypeTag(tag.to_string()))
    }

    /// Gift lines rendered apart from regular adjustment lines.
    pub fn is_visual_separator(&self) -> bool {
        VISUAL_SEPARATORS.contains(self)
    }

    /// Part of a discount campaign.
    pub fn is_campaign_discount(&self) -> bool {
        CAMPAIGN_DISCOUNTS.contains(self)
    }

    /// Originated from a coupon code.
    pub fn is_coupon(&self) -> bool {
        COUPONS.contains(self)
    }

    /// Any promotional price cut.
    pub fn is_promotion(&self) -> bool {
        PROMOTIONS.contains(self)
    }

    /// Enumerable types, excluding those toggled off for selection.
    pub fn choices() -> Vec<AdjustmentType> {
        Self::ALL
            .iter()
            .filter(|t| !HIDDEN_FROM_CHOICES.contains(t))
            .copied()
            .collect()
    }

    /// Campaign-discount choices only.
    pub fn discount_choices() -> Vec<AdjustmentType> {
        Self::choices()
            .into_iter()
            .filter(|t| t.is_campaign_discount())
            .collect()
    }

    /// Coupon choices only.
    pub fn coupon_choices() -> Vec<AdjustmentType> {
        Self::choices()
            .into_iter()
            .filter(|t| t.is_coupon())
            .collect()
    }
}

impl fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for t in AdjustmentType::ALL {
            assert_eq!(AdjustmentType::from_tag(t.tag()).unwrap(), *t);
        }
    }

    #[test]
    fn test_unknown_tag_fails_fast() {
        let err = AdjustmentType::from_tag("mystery_discount").unwrap_err();
        assert!(matches!(err, AdjustmentError::InvalidTypeTag(_)));
    }

    #[test]
    fn test_classifications() {
        assert!(AdjustmentType::CouponFreeShipping.is_coupon());
        assert!(!AdjustmentType::ShippingFee.is_coupon());
        assert!(AdjustmentType::ProductGift.is_visual_separator());
        assert!(AdjustmentType::CartValueGift.is_campaign_discount());
        assert!(AdjustmentType::StoreDiscount.is_promotion());
        assert!(!AdjustmentType::StoreDiscount.is_campaign_discount());
    }

    #[test]
    fn test_choices_exclude_toggled_off() {
        let choices = AdjustmentType::choices();
        assert!(!choices.contains(&AdjustmentType::CartValueGift));
        assert!(choices.contains(&AdjustmentType::ShippingFee));
        assert_eq!(choices.len(), AdjustmentType::ALL.len() - 1);
    }

    #[test]
    fn test_serde_uses_snake_tags() {
        let json = serde_json::to_string(&AdjustmentType::CouponPercentOrFixed).unwrap();
        assert_eq!(json, "\"coupon_percent_or_fixed\"");
    }
}
