//! Navigation seam for the UI shell.
//!
//! The orchestration layer never touches a navigation stack directly; it
//! asks this trait to move the user after the relevant delays have elapsed.

use std::sync::Arc;

use auric_core::OrderId;

/// Navigation requests the stores and checkout flow can make.
pub trait Navigator: Send + Sync {
    /// Open the cart view (after add-to-cart, when requested).
    fn to_cart(&self);

    /// Open the order confirmation view for a placed order.
    fn to_order_confirmation(&self, order_id: &OrderId);
}

/// Shared navigator handle.
pub type SharedNavigator = Arc<dyn Navigator>;

/// Ignores all navigation requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNavigator;

impl Navigator for NullNavigator {
    fn to_cart(&self) {}
    fn to_order_confirmation(&self, _order_id: &OrderId) {}
}
