//! Stored-balance card credit.

use crate::adjustable::Adjustable;
use crate::adjuster::{Adjuster, AdjusterKind, AdjusterScope};
use crate::adjustment::{Adjustment, AdjustmentType};
use crate::catalog::ClientCard;
use crate::error::AdjustmentError;
use crate::money::Money;
use crate::resolver::ReproductionContext;
use serde_json::json;
use tracing::debug;

/// Spends a client card's balance against the payable total, never more
/// than either.
///
/// The basis excludes card credit adjustments already attached, so the
/// credit is stable under recalculation. Callers should apply it after
/// every other adjuster so the total it caps against is final.
#[derive(Debug, Clone)]
pub struct ClientCardCredit {
    card_id: String,
    balance: Money,
    title: String,
    description: Option<String>,
}

impl ClientCardCredit {
    pub fn new(card: &ClientCard) -> Self {
        Self {
            card_id: card.id.as_str().to_string(),
            balance: card.balance,
            title: "Client card".to_string(),
            description: None,
        }
    }

    fn basis(adjustable: &dyn Adjustable) -> Money {
        let own_credits = adjustable
            .adjustments()
            .by_type(AdjustmentType::ClientCardCredit)
            .iter()
            .fold(Money::zero(adjustable.currency()), |acc, a| {
                acc.add(&a.amount())
            });
        adjustable.total().subtract(&own_credits)
    }

    /// Reconstruction reads the live balance, so a card spent elsewhere
    /// in the meantime yields a smaller credit on refresh.
    pub fn reproduce(
        adjustment: &Adjustment,
        ctx: &ReproductionContext<'_>,
    ) -> Result<Self, AdjustmentError> {
        let card = ctx.card(adjustment.origin())?;
        let mut credit = Self::new(&card);
        credit.title = adjustment.title().to_string();
        Ok(credit)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Adjuster for ClientCardCredit {
    fn kind(&self) -> AdjusterKind {
        AdjusterKind::ClientCardCredit
    }

    fn adjustment_type(&self) -> AdjustmentType {
        AdjustmentType::ClientCardCredit
    }

    fn scope(&self) -> AdjusterScope {
        AdjusterScope::Cart
    }

    fn origin(&self) -> Option<String> {
        Some(self.card_id.clone())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn data(&self) -> serde_json::Value {
        json!({ "balance": self.balance.to_decimal() })
    }

    fn calculate_amount(&self, adjustable: &dyn Adjustable) -> Money {
        let payable = Self::basis(adjustable);
        let spent = self.balance.min(&payable);
        let spent = if spent.is_negative() {
            Money::zero(adjustable.currency())
        } else {
            spent
        };
        debug!(card = %self.card_id, %spent, "applying client card credit");
        spent.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustable::{CartView, LineView};
    use crate::ids::{CardId, CartId, LineItemId, ProductId};
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

    fn card(balance: i64) -> ClientCard {
        ClientCard {
            id: CardId::new("card-1"),
            balance: eur(balance),
        }
    }

    #[test]
    fn test_credit_capped_at_balance() {
        let credit = ClientCardCredit::new(&card(500));
        let cart = cart_totalling(10000);
        assert_eq!(credit.calculate_amount(&cart).amount_cents, -500);
    }

    #[test]
    fn test_credit_capped_at_total() {
        let credit = ClientCardCredit::new(&card(50000));
        let cart = cart_totalling(10000);
        assert_eq!(credit.calculate_amount(&cart).amount_cents, -10000);
    }

    #[test]
    fn test_credit_recalculate_is_stable() {
        let credit = ClientCardCredit::new(&card(500));
        let mut cart = cart_totalling(10000);

        let mut adjustment = credit.create_adjustment(&cart).unwrap();
        cart.adjustments.add(adjustment.clone());

        credit.recalculate(&mut adjustment, &cart).unwrap();
        assert_eq!(adjustment.amount().amount_cents, -500);
    }

    #[test]
    fn test_credit_never_positive() {
        let credit = ClientCardCredit::new(&card(500));
        let cart = cart_totalling(0);
        assert!(credit.calculate_amount(&cart).is_zero());
    }
}
