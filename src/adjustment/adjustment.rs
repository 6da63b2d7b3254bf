//! The adjustment entity: one computed, signed monetary line.

use crate::adjustable::AdjustableRef;
use crate::adjuster::AdjusterKind;
use crate::adjustment::AdjustmentType;
use crate::error::AdjustmentError;
use crate::ids::AdjustmentId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// The full attribute set an adjuster produces for a new adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentAttributes {
    pub adjustment_type: AdjustmentType,
    pub adjustable: AdjustableRef,
    pub adjuster_kind: AdjusterKind,
    pub origin: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// Strategy-specific payload, sufficient to reconstruct the adjuster.
    pub data: serde_json::Value,
    pub amount: Money,
    pub is_locked: bool,
    pub is_included: bool,
}

/// One persisted price adjustment attached to an adjustable.
///
/// Amounts below zero are charges (they reduce the payable total),
/// amounts above zero are credits. The amount is the only field the
/// engine ever mutates after creation, and only through [`set_amount`].
///
/// [`set_amount`]: Adjustment::set_amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    id: AdjustmentId,
    adjustment_type: AdjustmentType,
    adjustable: AdjustableRef,
    adjuster_kind: AdjusterKind,
    origin: Option<String>,
    title: String,
    description: Option<String>,
    amount: Money,
    data: serde_json::Value,
    locked: bool,
    included: bool,
}

impl Adjustment {
    /// Create a new adjustment from an adjuster's attribute set.
    pub fn from_attributes(attrs: AdjustmentAttributes) -> Self {
        Self {
            id: AdjustmentId::generate(),
            adjustment_type: attrs.adjustment_type,
            adjustable: attrs.adjustable,
            adjuster_kind: attrs.adjuster_kind,
            origin: attrs.origin,
            title: attrs.title,
            description: attrs.description,
            amount: attrs.amount,
            data: attrs.data,
            locked: attrs.is_locked,
            included: attrs.is_included,
        }
    }

    pub fn id(&self) -> &AdjustmentId {
        &self.id
    }

    pub fn adjustment_type(&self) -> AdjustmentType {
        self.adjustment_type
    }

    pub fn adjustable_ref(&self) -> &AdjustableRef {
        &self.adjustable
    }

    pub fn adjuster_kind(&self) -> AdjusterKind {
        self.adjuster_kind
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// The strategy-specific payload this adjustment was built with.
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    /// Overwrite the amount. Fails when the adjustment is locked.
    pub fn set_amount(&mut self, amount: Money) -> Result<(), AdjustmentError> {
        if self.locked {
            return Err(AdjustmentError::LockedAdjustment {
                id: self.id.as_str().to_string(),
            });
        }
        self.amount = amount;
        Ok(())
    }

    /// Adjustments with amount < 0 are called "charges".
    pub fn is_charge(&self) -> bool {
        self.amount.is_negative()
    }

    /// Adjustments with amount > 0 are called "credits".
    pub fn is_credit(&self) -> bool {
        self.amount.is_positive()
    }

    /// Whether the amount is folded into a displayed base price.
    pub fn is_included(&self) -> bool {
        self.included
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }
}
