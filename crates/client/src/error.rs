//! Error taxonomy for the orchestration layer.
//!
//! Transport problems live in [`ApiError`]; everything a store or the
//! checkout orchestrator can surface to the UI lives in [`StoreError`].
//! Validation failures never reach the network layer, auth and coupon
//! failures are handled locally with a notification, and only payment
//! outcomes move the checkout state machine.

use thiserror::Error;

use auric_core::checkout::TransitionError;
use auric_core::pricing::{CouponError, PricingError};
use auric_core::validation::ValidationErrors;

/// Errors from the remote gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status.
    #[error("gateway returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the gateway.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// An endpoint path could not be joined onto the base URL.
    #[error("invalid endpoint path: {0}")]
    InvalidPath(#[from] url::ParseError),
}

/// Application-level errors surfaced by the stores and the checkout
/// orchestrator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation needs a signed-in user.
    #[error("sign in to continue")]
    AuthRequired,

    /// Client-side field checks failed before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Business-rule rejection of a coupon.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// The order draft could not be assembled.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A gateway request failed, timed out, or returned non-2xx.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Checkout requires a selected delivery address.
    #[error("select a delivery address to place the order")]
    AddressRequired,

    /// The checkout state machine rejected a transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
