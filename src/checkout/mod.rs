//! Checkout: shipping policy, order summary and promo codes.

pub mod promo;

use serde::Serialize;
use crate::domain::aggregates::Cart;
use crate::domain::value_objects::Money;

pub use promo::redeem;

/// Flat-rate shipping, waived when the subtotal is strictly above the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShippingPolicy {
    pub free_over: Money,
    pub flat_fee: Money,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self { free_over: Money::from_units(100), flat_fee: Money::from_units(10) }
    }
}

impl ShippingPolicy {
    pub fn fee_for(&self, subtotal: Money) -> Money {
        if subtotal > self.free_over { Money::ZERO } else { self.flat_fee }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub subtotal: Money,
    pub shipping: Money,
    /// Discount actually granted: the cart's discount bounded to `[0, subtotal]`.
    pub discount: Money,
    pub total: Money,
    pub total_items: u64,
}

impl CheckoutSummary {
    pub fn for_cart(cart: &Cart, policy: &ShippingPolicy) -> Self {
        let subtotal = cart.total_price();
        let shipping = policy.fee_for(subtotal);
        let discount = cart.discount().clamp(Money::ZERO, subtotal.max(Money::ZERO));
        Self { subtotal, shipping, discount, total: subtotal + shipping - discount, total_items: cart.total_items() }
    }
}
