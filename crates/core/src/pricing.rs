//! Pricing rules: shipping charges, coupon eligibility, and order totals.
//!
//! The shipping rule is evaluated against the pre-discount subtotal and is
//! independent of any coupon. The coupon discount is a flat amount off the
//! subtotal, applied once, never prorated across lines. The total is floored
//! at zero before shipping is added.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    AddressId, CartSnapshot, Coupon, CurrencyCode, Money, OrderDraft,
};

/// Default free-shipping threshold, in currency units.
pub const FREE_SHIPPING_THRESHOLD: u32 = 499;

/// Default flat shipping fee charged below the threshold.
pub const FLAT_SHIPPING_FEE: u32 = 30;

/// Why a coupon could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    /// The cart subtotal is below the coupon's minimum.
    #[error("cart subtotal must be at least {minimum} to use this coupon")]
    BelowMinimum { minimum: Money },

    /// The coupon has been deactivated server-side.
    #[error("this coupon is no longer active")]
    Inactive,

    /// The coupon is denominated in a different currency than the cart.
    #[error("coupon currency does not match the cart")]
    CurrencyMismatch,
}

/// Why an order draft could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// There is nothing to price.
    #[error("cart is empty")]
    EmptyCart,

    /// A coupon check failed while building the draft.
    #[error(transparent)]
    Coupon(#[from] CouponError),
}

/// The storefront's pricing configuration.
///
/// Defaults match production (499 / 30); the client config layer can
/// override both via environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Subtotals at or above this ship free.
    pub free_shipping_threshold: Decimal,
    /// Flat fee charged below the threshold.
    pub flat_shipping_fee: Decimal,
    /// Currency the rules are denominated in.
    pub currency: CurrencyCode,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::from(FREE_SHIPPING_THRESHOLD),
            flat_shipping_fee: Decimal::from(FLAT_SHIPPING_FEE),
            currency: CurrencyCode::INR,
        }
    }
}

impl PricingRules {
    /// Shipping charges for a pre-discount subtotal.
    #[must_use]
    pub fn shipping_charges(&self, subtotal: &Money) -> Money {
        if subtotal.amount >= self.free_shipping_threshold {
            Money::zero(subtotal.currency_code)
        } else {
            Money::new(self.flat_shipping_fee, subtotal.currency_code)
        }
    }

    /// Check whether a coupon may be applied to a subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError`] when the coupon is inactive, denominated in a
    /// different currency, or the subtotal is below its minimum.
    pub fn check_eligibility(&self, coupon: &Coupon, subtotal: &Money) -> Result<(), CouponError> {
        if !coupon.active {
            return Err(CouponError::Inactive);
        }
        if coupon.min_cart_value.currency_code != subtotal.currency_code {
            return Err(CouponError::CurrencyMismatch);
        }
        if subtotal.amount < coupon.min_cart_value.amount {
            return Err(CouponError::BelowMinimum {
                minimum: coupon.min_cart_value,
            });
        }
        Ok(())
    }

    /// Order total: `max(0, subtotal - discount) + shipping`.
    #[must_use]
    pub fn order_total(&self, subtotal: &Money, coupon_discount: &Money, shipping: &Money) -> Money {
        let discounted = subtotal
            .saturating_sub(coupon_discount)
            .unwrap_or(*subtotal);
        discounted.checked_add(shipping).unwrap_or(discounted)
    }

    /// Assemble the priced order draft from current cart, address, and
    /// coupon state. Recomputed fresh on every checkout render.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::EmptyCart`] for a cart with no lines, or a
    /// [`CouponError`] when the applied coupon is no longer eligible.
    pub fn build_draft(
        &self,
        cart: &CartSnapshot,
        address_id: AddressId,
        coupon: Option<&Coupon>,
    ) -> Result<OrderDraft, PricingError> {
        let subtotal = cart.subtotal().ok_or(PricingError::EmptyCart)?;

        let coupon_discount = match coupon {
            Some(coupon) => {
                self.check_eligibility(coupon, &subtotal)?;
                coupon.discount_amount
            }
            None => Money::zero(subtotal.currency_code),
        };

        let shipping_charges = self.shipping_charges(&subtotal);
        let total = self.order_total(&subtotal, &coupon_discount, &shipping_charges);

        Ok(OrderDraft {
            lines: cart.lines.clone(),
            address_id,
            subtotal,
            coupon_discount,
            shipping_charges,
            total,
        })
    }
}
