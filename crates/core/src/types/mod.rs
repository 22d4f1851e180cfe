//! Domain types for the Auric Jewels storefront client.
//!
//! These types provide a clean, ergonomic layer separate from the raw JSON
//! the gateway speaks. Everything is plain data with serde derives.

mod address;
mod cart;
mod coupon;
mod id;
mod money;
mod order;
mod wishlist;

pub use address::{Address, AddressInput, AddressKind};
pub use cart::{CartLine, CartSnapshot, ProductSnapshot};
pub use coupon::Coupon;
pub use id::{AddressId, CartLineId, CouponCode, OrderId, ProductId, UserId};
pub use money::{CurrencyCode, Money};
pub use order::{
    Order, OrderDraft, OrderPayment, OrderStatus, OrderStatusEntry, PaymentOutcome,
};
pub use wishlist::WishlistEntry;
