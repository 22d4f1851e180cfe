//! Auric Core - Domain types and business rules.
//!
//! This crate provides the pure domain layer shared across the Auric Jewels
//! storefront client:
//! - `client` - Orchestration layer (cart, wishlist, addresses, checkout)
//! - `integration-tests` - End-to-end flow tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Everything here is deterministic and unit-testable.
//!
//! # Modules
//!
//! - [`types`] - Money, type-safe IDs, cart/wishlist/address/coupon/order types
//! - [`validation`] - Client-side address form validation
//! - [`pricing`] - Shipping rule, coupon eligibility, order totals
//! - [`checkout`] - The checkout state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod pricing;
pub mod types;
pub mod validation;

pub use types::*;
