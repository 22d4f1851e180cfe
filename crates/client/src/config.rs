//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AURIC_API_BASE_URL` - Base URL of the storefront REST gateway
//! - `AURIC_API_KEY` - API key sent with every request
//!
//! ## Optional
//! - `AURIC_REQUEST_TIMEOUT_MS` - Per-request timeout (default: 15000)
//! - `AURIC_CART_SETTLE_DELAY_MS` - UI settle delay after add-to-cart before
//!   navigating to the cart view (default: 700)
//! - `AURIC_CONFIRMATION_DELAY_MS` - Delay before navigating to the order
//!   confirmation view after a successful payment (default: 1500)
//! - `AURIC_TAP_WINDOW_MS` - Double-tap suppression window (default: 500)
//! - `AURIC_WISHLIST_CACHE_TTL_SECS` - Wishlist membership cache TTL
//!   (default: 60)
//! - `AURIC_FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping is free
//!   (default: 499)
//! - `AURIC_FLAT_SHIPPING_FEE` - Fee charged below the threshold
//!   (default: 30)

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use auric_core::pricing::PricingRules;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct StoreConfig {
    /// Base URL of the REST gateway (e.g., `https://api.auricjewels.in/v1/`).
    pub api_base: Url,
    /// API key sent with every request.
    pub api_key: SecretString,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// UI settle delay after add-to-cart before navigating to the cart view.
    pub cart_settle_delay: Duration,
    /// Delay before navigating to the confirmation view after payment.
    pub confirmation_delay: Duration,
    /// Double-tap suppression window for the tap guard.
    pub tap_window: Duration,
    /// Wishlist membership cache TTL.
    pub wishlist_cache_ttl: Duration,
    /// Shipping threshold and fee.
    pub pricing: PricingRules,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("api_base", &self.api_base.as_str())
            .field("api_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .field("cart_settle_delay", &self.cart_settle_delay)
            .field("confirmation_delay", &self.confirmation_delay)
            .field("tap_window", &self.tap_window)
            .field("wishlist_cache_ttl", &self.wishlist_cache_ttl)
            .field("pricing", &self.pricing)
            .finish()
    }
}

impl StoreConfig {
    /// Create a configuration with production defaults for everything but
    /// the gateway endpoint and key.
    #[must_use]
    pub fn new(api_base: Url, api_key: SecretString) -> Self {
        Self {
            api_base,
            api_key,
            request_timeout: Duration::from_millis(15_000),
            cart_settle_delay: Duration::from_millis(700),
            confirmation_delay: Duration::from_millis(1500),
            tap_window: Duration::from_millis(500),
            wishlist_cache_ttl: Duration::from_secs(60),
            pricing: PricingRules::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base = get_required_env("AURIC_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AURIC_API_BASE_URL".to_string(), e.to_string())
            })?;
        let api_key = SecretString::from(get_required_env("AURIC_API_KEY")?);

        let mut config = Self::new(api_base, api_key);
        config.request_timeout = get_duration_ms("AURIC_REQUEST_TIMEOUT_MS", 15_000)?;
        config.cart_settle_delay = get_duration_ms("AURIC_CART_SETTLE_DELAY_MS", 700)?;
        config.confirmation_delay = get_duration_ms("AURIC_CONFIRMATION_DELAY_MS", 1500)?;
        config.tap_window = get_duration_ms("AURIC_TAP_WINDOW_MS", 500)?;
        config.wishlist_cache_ttl =
            Duration::from_secs(get_parsed("AURIC_WISHLIST_CACHE_TTL_SECS", 60)?);
        config.pricing.free_shipping_threshold = Decimal::from(get_parsed::<u32>(
            "AURIC_FREE_SHIPPING_THRESHOLD",
            auric_core::pricing::FREE_SHIPPING_THRESHOLD,
        )?);
        config.pricing.flat_shipping_fee = Decimal::from(get_parsed::<u32>(
            "AURIC_FLAT_SHIPPING_FEE",
            auric_core::pricing::FLAT_SHIPPING_FEE,
        )?);

        Ok(config)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an optional environment variable, falling back to a default.
fn get_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Parse an optional millisecond duration variable.
fn get_duration_ms(key: &str, default_ms: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_millis(get_parsed(key, default_ms)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StoreConfig {
        StoreConfig::new(
            "https://api.example.test/v1/".parse().unwrap(),
            SecretString::from("k3y-f0r-t3sts"),
        )
    }

    #[test]
    fn test_defaults() {
        let config = test_config();
        assert_eq!(config.request_timeout, Duration::from_millis(15_000));
        assert_eq!(config.cart_settle_delay, Duration::from_millis(700));
        assert_eq!(config.confirmation_delay, Duration::from_millis(1500));
        assert_eq!(config.tap_window, Duration::from_millis(500));
        assert_eq!(
            config.pricing.free_shipping_threshold,
            Decimal::from(499u32)
        );
        assert_eq!(config.pricing.flat_shipping_fee, Decimal::from(30u32));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = test_config();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("api.example.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k3y-f0r-t3sts"));
    }
}
