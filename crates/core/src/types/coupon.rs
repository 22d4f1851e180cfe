//! Coupon domain types.
//!
//! Coupons are read-only from the client's perspective. "Applied" is
//! ephemeral checkout-session state, re-derived into the order draft at
//! submit time, never persisted on its own.

use serde::{Deserialize, Serialize};

use super::id::CouponCode;
use super::money::Money;

/// A discount coupon as served by the gateway.
///
/// The discount is a flat amount off the cart subtotal, applied once. It is
/// not a percentage and is not prorated across lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// The redemption code the user enters.
    pub code: CouponCode,
    /// Flat amount taken off the subtotal.
    pub discount_amount: Money,
    /// Minimum cart subtotal required for eligibility.
    pub min_cart_value: Money,
    /// Inactive coupons are rejected regardless of subtotal.
    pub active: bool,
}
