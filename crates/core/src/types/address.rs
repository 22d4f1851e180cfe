//! Shipping address domain types.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// Label for a saved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AddressKind {
    #[default]
    Home,
    Work,
    Other,
}

/// A saved shipping address.
///
/// At most one address per user should have `is_default = true`; demoting
/// the previous default on `set_default` is a server contract, not something
/// the client re-verifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address identifier issued by the gateway.
    pub id: AddressId,
    /// Recipient name.
    pub name: String,
    /// 10-digit mobile number.
    pub phone: String,
    /// Street / house / locality line.
    pub street: String,
    pub city: String,
    pub state: String,
    /// 6-digit postal code.
    pub zip_code: String,
    pub country: String,
    /// Home / Work / Other label.
    pub kind: AddressKind,
    /// Pre-selected at checkout unless the user picks another.
    pub is_default: bool,
}

/// Form input for creating or updating an address.
///
/// Validate with [`crate::validation::validate_address`] before submission;
/// invalid input must never reach the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(default)]
    pub kind: AddressKind,
    #[serde(default)]
    pub is_default: bool,
}
