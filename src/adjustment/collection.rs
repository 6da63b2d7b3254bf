//! Ordered collection of adjustments scoped to one adjustable.

use crate::adjustment::{Adjustment, AdjustmentType};
use crate::ids::AdjustmentId;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// An insertion-ordered container of adjustments.
///
/// Order is significant: deterministic display depends on it, and the
/// proportional allocation rule treats the last line specially. The
/// collection never merges entries; callers are responsible for not
/// adding duplicate `(type, origin)` pairs where the type forbids it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentCollection {
    currency: Currency,
    items: Vec<Adjustment>,
}

impl AdjustmentCollection {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            items: Vec::new(),
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Append an adjustment, preserving insertion order.
    pub fn add(&mut self, adjustment: Adjustment) {
        self.items.push(adjustment);
    }

    /// Remove an adjustment by identity. Returns whether anything was removed.
    pub fn remove(&mut self, id: &AdjustmentId) -> bool {
        let before = self.items.len();
        self.items.retain(|a| a.id() != id);
        self.items.len() < before
    }

    /// Sub-view of all adjustments of one type, in insertion order.
    pub fn by_type(&self, adjustment_type: AdjustmentType) -> Vec<&Adjustment> {
        self.items
            .iter()
            .filter(|a| a.adjustment_type() == adjustment_type)
            .collect()
    }

    /// Whether an entry with this `(type, origin)` pair already exists.
    pub fn contains(&self, adjustment_type: AdjustmentType, origin: Option<&str>) -> bool {
        self.items
            .iter()
            .any(|a| a.adjustment_type() == adjustment_type && a.origin() == origin)
    }

    /// Sum of all member amounts. Signs are already correct per member,
    /// so the total is a plain sum.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(self.currency), |acc, a| acc.add(&a.amount()))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_not_empty(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Adjustment> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Adjustment> {
        self.items.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustable::{AdjustableKind, AdjustableRef};
    use crate::adjuster::AdjusterKind;
    use crate::adjustment::AdjustmentAttributes;

    fn adjustment(adjustment_type: AdjustmentType, amount_cents: i64) -> Adjustment {
        Adjustment::from_attributes(AdjustmentAttributes {
            adjustment_type,
            adjustable: AdjustableRef {
                kind: AdjustableKind::Cart,
                id: "cart-1".to_string(),
            },
            adjuster_kind: AdjusterKind::PackagingFee,
            origin: None,
            title: "test".to_string(),
            description: None,
            data: serde_json::Value::Null,
            amount: Money::new(amount_cents, Currency::EUR),
            is_locked: false,
            is_included: false,
        })
    }

    #[test]
    fn test_total_sums_signed_amounts() {
        let mut collection = AdjustmentCollection::new(Currency::EUR);
        collection.add(adjustment(AdjustmentType::StoreDiscount, -300));
        collection.add(adjustment(AdjustmentType::ShippingFee, 500));
        collection.add(adjustment(AdjustmentType::ClientCardCredit, -100));

        assert_eq!(collection.total().amount_cents, 100);
        assert_eq!(collection.len(), 3);
        assert!(collection.is_not_empty());
    }

    #[test]
    fn test_by_type_preserves_order() {
        let mut collection = AdjustmentCollection::new(Currency::EUR);
        collection.add(adjustment(AdjustmentType::StoreDiscount, -100));
        collection.add(adjustment(AdjustmentType::ShippingFee, 500));
        collection.add(adjustment(AdjustmentType::StoreDiscount, -200));

        let discounts = collection.by_type(AdjustmentType::StoreDiscount);
        assert_eq!(discounts.len(), 2);
        assert_eq!(discounts[0].amount().amount_cents, -100);
        assert_eq!(discounts[1].amount().amount_cents, -200);
    }

    #[test]
    fn test_remove_by_identity() {
        let mut collection = AdjustmentCollection::new(Currency::EUR);
        let a = adjustment(AdjustmentType::StoreDiscount, -100);
        let id = a.id().clone();
        collection.add(a);
        collection.add(adjustment(AdjustmentType::ShippingFee, 500));

        assert!(collection.remove(&id));
        assert!(!collection.remove(&id));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_contains_type_origin_pair() {
        let mut collection = AdjustmentCollection::new(Currency::EUR);
        collection.add(adjustment(AdjustmentType::ShippingFee, 500));

        assert!(collection.contains(AdjustmentType::ShippingFee, None));
        assert!(!collection.contains(AdjustmentType::PaymentFee, None));
    }
}
