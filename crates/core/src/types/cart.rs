//! Cart domain types.
//!
//! A cart line is one product-and-quantity entry, distinct from the catalog
//! product it references. The snapshot is whatever the gateway returned last;
//! the client never keeps a separately maintained item counter.

use serde::{Deserialize, Serialize};

use super::id::{CartLineId, ProductId};
use super::money::Money;

/// Denormalized product data carried on a cart line for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product display name.
    pub name: String,
    /// Image URLs, primary first.
    pub images: Vec<String>,
    /// Category handle (e.g., "rings", "necklaces").
    pub category: String,
}

/// One product-and-quantity entry in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identifier issued by the gateway.
    pub id: CartLineId,
    /// The referenced catalog product.
    pub product_id: ProductId,
    /// Always at least 1; a line at quantity 0 is removed instead.
    pub quantity: u32,
    /// Price per unit at the time the line was fetched.
    pub unit_price: Money,
    /// Per-line discount already applied by the server.
    pub discount: Money,
    /// Display data for the referenced product.
    pub product: ProductSnapshot,
}

impl CartLine {
    /// Line total: unit price times quantity, minus the line discount.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price
            .times(self.quantity)
            .saturating_sub(&self.discount)
            .unwrap_or_else(|| self.unit_price.times(self.quantity))
    }
}

/// The latest fetched state of a user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Cart lines in server order.
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Total item count, always derived by summing line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Cart subtotal: sum of line totals.
    ///
    /// Returns `None` for an empty cart, since there is no currency to
    /// denominate a zero in.
    #[must_use]
    pub fn subtotal(&self) -> Option<Money> {
        let mut lines = self.lines.iter();
        let first = lines.next()?.line_total();
        lines.try_fold(first, |acc, line| acc.checked_add(&line.line_total()))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn line_for_product(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }
}
