//! Order domain types.
//!
//! The order draft is the ephemeral, client-computed pricing summary
//! assembled at checkout time. A persisted order only exists once the
//! gateway has accepted a submission; its status transitions are
//! server-owned and the client reads only the latest history entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::cart::CartLine;
use super::id::{AddressId, OrderId};
use super::money::Money;

/// Ephemeral checkout-time pricing summary.
///
/// Computed fresh from cart + address + coupon state on every checkout
/// render; it has no identity of its own until submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// The cart lines being purchased.
    pub lines: Vec<CartLine>,
    /// The selected shipping address.
    pub address_id: AddressId,
    /// Sum of line totals, before coupon discount.
    pub subtotal: Money,
    /// Flat coupon discount, zero when no coupon is applied.
    pub coupon_discount: Money,
    /// Evaluated against the pre-discount subtotal.
    pub shipping_charges: Money,
    /// `max(0, subtotal - coupon_discount) + shipping_charges`.
    pub total: Money,
}

/// Lifecycle status of a persisted order. Server-owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    PaymentPending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

/// One entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusEntry {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
}

/// Payment details recorded on a persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayment {
    /// Provider-issued payment id, absent while unpaid.
    pub payment_id: Option<String>,
    /// Amount charged.
    pub amount: Money,
}

/// A persisted order as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier issued by the gateway.
    pub id: OrderId,
    /// Human-facing order code (e.g., "AJ-2024-0042").
    pub code: String,
    /// Ordered status history, oldest first.
    pub status_history: Vec<OrderStatusEntry>,
    /// The purchased lines.
    pub lines: Vec<CartLine>,
    /// The shipping address the order was placed with.
    pub address: Address,
    /// Payment details.
    pub payment: OrderPayment,
}

impl Order {
    /// The current status: the latest entry of the server-owned history.
    #[must_use]
    pub fn current_status(&self) -> Option<OrderStatus> {
        self.status_history.last().map(|entry| entry.status)
    }
}

/// Outcome of a payment-provider handoff.
///
/// A closed tagged union so the checkout state machine's transition logic
/// is a total function over the tag, rather than an object with optional
/// fields inspected at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// The provider charged the customer.
    Success {
        payment_id: String,
        order_id: OrderId,
    },
    /// The payment step failed; the order may exist server-side unpaid.
    Failure {
        message: String,
        order_id: Option<OrderId>,
    },
    /// The user backed out of the provider's flow.
    Cancelled { order_id: Option<OrderId> },
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::money::CurrencyCode;

    #[test]
    fn test_current_status_is_latest_history_entry() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid timestamp");
        let order = Order {
            id: OrderId::new("ord_1"),
            code: "AJ-2024-0001".to_string(),
            status_history: vec![
                OrderStatusEntry {
                    status: OrderStatus::Placed,
                    at,
                },
                OrderStatusEntry {
                    status: OrderStatus::Confirmed,
                    at,
                },
            ],
            lines: vec![],
            address: Address {
                id: crate::AddressId::new("addr_1"),
                name: "Priya".to_string(),
                phone: "9876543210".to_string(),
                street: "12 MG Road".to_string(),
                city: "Bengaluru".to_string(),
                state: "Karnataka".to_string(),
                zip_code: "560001".to_string(),
                country: "India".to_string(),
                kind: crate::AddressKind::Home,
                is_default: true,
            },
            payment: OrderPayment {
                payment_id: None,
                amount: Money::new(Decimal::from(999), CurrencyCode::INR),
            },
        };
        assert_eq!(order.current_status(), Some(OrderStatus::Confirmed));
    }

    #[test]
    fn test_payment_outcome_serde_tag() {
        let outcome = PaymentOutcome::Cancelled {
            order_id: Some(OrderId::new("ord_9")),
        };
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["outcome"], "cancelled");
        assert_eq!(json["order_id"], "ord_9");
    }
}
