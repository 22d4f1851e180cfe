//! Wishlist domain types.
//!
//! Wishlist membership has set semantics: a product id appears at most once.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;

/// A product the user has marked as favorited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// The favorited product.
    pub product_id: ProductId,
    /// Product display name.
    pub name: String,
    /// Price at the time the wishlist was fetched.
    pub price: Money,
    /// Image URLs, primary first.
    pub images: Vec<String>,
    /// Whether the product is currently purchasable.
    pub in_stock: bool,
}
