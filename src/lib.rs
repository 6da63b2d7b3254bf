//! Itemized price adjustments for carts and line items.
//!
//! This crate keeps every price modification on a cart as an explicit,
//! typed line instead of folding it into mutated prices:
//!
//! - **Adjustments**: signed monetary lines with a type taxonomy,
//!   lock/include flags and a reconstruction payload
//! - **Adjusters**: the strategies that compute them, from store-wide
//!   discounts through coupons and quantity offers to shipping, payment
//!   and packaging fees and stored-balance card credits
//! - **Allocation**: exact-sum splitting of one value across lines, and
//!   buy-N-get-M free-unit distribution with carry-over
//! - **Reconstruction**: rebuilding any adjuster from its persisted
//!   adjustment plus a [`resolver::Resolver`] for the records it
//!   references
//!
//! # Example
//!
//! ```rust
//! use cart_adjustments::prelude::*;
//!
//! let mut cart = CartView::new(CartId::new("cart-1"), Currency::EUR);
//! cart.push_line(LineView::new(
//!     LineItemId::new("item-1"),
//!     ProductId::new("prod-1"),
//!     "Rust Programming Book",
//!     "RUST-BOOK-001",
//!     Money::new(4999, Currency::EUR),
//!     2,
//! ));
//!
//! // 10% store-wide discount on the line
//! let line = cart.line(&LineItemId::new("item-1")).unwrap();
//! let adjuster = StoreDiscount::new(line, 10.0);
//! let adjustment = adjuster.create_adjustment(line).unwrap();
//! assert_eq!(adjustment.amount(), Money::new(-1000, Currency::EUR));
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod adjustable;
pub mod adjuster;
pub mod adjustment;
pub mod allocation;
pub mod catalog;
pub mod resolver;

pub use error::AdjustmentError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::AdjustmentError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Adjustments
    pub use crate::adjustable::{Adjustable, AdjustableKind, AdjustableRef, CartView, LineView};
    pub use crate::adjustment::{
        Adjustment, AdjustmentAttributes, AdjustmentCollection, AdjustmentType,
    };

    // Adjusters
    pub use crate::adjuster::{
        refresh_all, reproduce_from_adjustment, Adjuster, AdjusterKind, AdjusterScope,
        CartValueGift, CheapestItemFree, ClientCardCredit, CouponFreeProduct,
        CouponFreeShipping, CouponPercentOrFixed, DirectDiscount, FreebieOffer,
        IdenticalItemFree, IntervalDiscount, PackagingFee, PaymentFee,
        PercentOrFixedDiscount, ProductGift, ShippingFee, StoreDiscount,
        TieredPercentOffer,
    };

    // Allocation
    pub use crate::allocation::{
        allocate_proportionally, distribute_free_units, free_quantity, AllocationLine,
    };

    // Collaborator records
    pub use crate::catalog::{
        ClientCard, Coupon, Discount, FeeKind, GiftSelections, IntervalPrice, PaymentMethod,
        PriceQuote, PriceRule, ProductRecord, ShippingMethod,
    };
    pub use crate::resolver::{InMemoryResolver, ReproductionContext, Resolver};
}
