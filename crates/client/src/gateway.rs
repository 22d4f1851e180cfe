//! REST gateway client.
//!
//! JSON over HTTPS against the storefront's resource paths (`/cart`,
//! `/wishlist`, `/address`, `/order`). Auth is carried as a bearer token
//! plus an explicit user-id header, both taken from the signed-in
//! [`Identity`]; the app-level API key rides along on every request.
//!
//! The endpoint traits ([`CartApi`], [`WishlistApi`], [`AddressApi`],
//! [`OrderApi`]) are the seams the stores are generic over. [`ApiGateway`]
//! implements all four against the real gateway; the integration-test crate
//! provides in-memory fakes.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use auric_core::{
    Address, AddressId, AddressInput, CartLineId, CartSnapshot, Order, OrderDraft, OrderId,
    ProductId, WishlistEntry,
};

use crate::config::StoreConfig;
use crate::error::ApiError;
use crate::session::Identity;

// =============================================================================
// Endpoint traits
// =============================================================================

/// Cart endpoints.
#[allow(async_fn_in_trait)]
pub trait CartApi {
    /// Fetch the user's full cart.
    async fn fetch_cart(&self, identity: &Identity) -> Result<CartSnapshot, ApiError>;

    /// Add a product to the cart.
    async fn add_line(
        &self,
        identity: &Identity,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Change a line's quantity (must be >= 1; zero goes through
    /// [`Self::remove_line`] instead).
    async fn update_line(
        &self,
        identity: &Identity,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Delete a line.
    async fn remove_line(&self, identity: &Identity, line_id: &CartLineId)
    -> Result<(), ApiError>;
}

/// Wishlist endpoints.
#[allow(async_fn_in_trait)]
pub trait WishlistApi {
    /// Fetch the user's wishlist.
    async fn fetch_wishlist(&self, identity: &Identity) -> Result<Vec<WishlistEntry>, ApiError>;

    /// Mark a product as favorited.
    async fn add_entry(&self, identity: &Identity, product_id: &ProductId)
    -> Result<(), ApiError>;

    /// Remove a product from the wishlist.
    async fn remove_entry(
        &self,
        identity: &Identity,
        product_id: &ProductId,
    ) -> Result<(), ApiError>;
}

/// Saved address endpoints.
#[allow(async_fn_in_trait)]
pub trait AddressApi {
    /// List the user's saved addresses (server order).
    async fn list_addresses(&self, identity: &Identity) -> Result<Vec<Address>, ApiError>;

    /// Create a new address.
    async fn create_address(
        &self,
        identity: &Identity,
        input: &AddressInput,
    ) -> Result<Address, ApiError>;

    /// Update an address in place.
    async fn update_address(
        &self,
        identity: &Identity,
        address_id: &AddressId,
        input: &AddressInput,
    ) -> Result<Address, ApiError>;

    /// Delete an address by id.
    async fn delete_address(
        &self,
        identity: &Identity,
        address_id: &AddressId,
    ) -> Result<(), ApiError>;
}

/// Order endpoints.
#[allow(async_fn_in_trait)]
pub trait OrderApi {
    /// Submit an order draft. The idempotency key makes a duplicated
    /// submission return the already-created order instead of a second one.
    async fn create_order(
        &self,
        identity: &Identity,
        draft: &OrderDraft,
        idempotency_key: Uuid,
    ) -> Result<Order, ApiError>;

    /// Fetch a persisted order.
    async fn fetch_order(&self, identity: &Identity, order_id: &OrderId)
    -> Result<Order, ApiError>;
}

// =============================================================================
// ApiGateway
// =============================================================================

/// Client for the storefront REST gateway.
///
/// Cheaply cloneable; all stores share the same underlying
/// `reqwest::Client` connection pool.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: reqwest::Client,
    api_base: Url,
    api_key: SecretString,
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway")
            .field("api_base", &self.inner.api_base.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl ApiGateway {
    /// Create a new gateway client from configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest` error if the client cannot be
    /// constructed with the configured timeout.
    pub fn new(config: &StoreConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(GatewayInner {
                client,
                api_base: config.api_base.clone(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner.api_base.join(path).map_err(ApiError::InvalidPath)
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        identity: &Identity,
    ) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .bearer_auth(identity.access_token.expose_secret())
            .header("X-User-Id", identity.user_id.as_str())
            .header("X-Api-Key", self.inner.api_key.expose_secret())
    }

    /// Send a request and parse a JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let text = self.send_for_text(request).await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&text, 500),
                    "Failed to parse gateway response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    /// Send a request, discarding any response body.
    async fn send_no_content(&self, request: reqwest::RequestBuilder) -> Result<(), ApiError> {
        self.send_for_text(request).await.map(drop)
    }

    async fn send_for_text(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting before anything else
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&text, 500),
                "Gateway returned non-success status"
            );
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(truncate(&text, 200)));
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: truncate(&text, 200),
            });
        }

        Ok(text)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// =============================================================================
// Request payloads
// =============================================================================

#[derive(Debug, Serialize)]
struct AddLinePayload<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct UpdateLinePayload {
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct AddWishlistPayload<'a> {
    product_id: &'a ProductId,
}

// =============================================================================
// Endpoint implementations
// =============================================================================

impl CartApi for ApiGateway {
    #[instrument(skip(self, identity))]
    async fn fetch_cart(&self, identity: &Identity) -> Result<CartSnapshot, ApiError> {
        let url = self.endpoint("cart")?;
        self.send_json(self.request(reqwest::Method::GET, url, identity))
            .await
    }

    #[instrument(skip(self, identity), fields(product_id = %product_id))]
    async fn add_line(
        &self,
        identity: &Identity,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("cart/lines")?;
        let request = self
            .request(reqwest::Method::POST, url, identity)
            .json(&AddLinePayload {
                product_id,
                quantity,
            });
        self.send_no_content(request).await
    }

    #[instrument(skip(self, identity), fields(line_id = %line_id))]
    async fn update_line(
        &self,
        identity: &Identity,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("cart/lines/{line_id}"))?;
        let request = self
            .request(reqwest::Method::PUT, url, identity)
            .json(&UpdateLinePayload { quantity });
        self.send_no_content(request).await
    }

    #[instrument(skip(self, identity), fields(line_id = %line_id))]
    async fn remove_line(
        &self,
        identity: &Identity,
        line_id: &CartLineId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("cart/lines/{line_id}"))?;
        self.send_no_content(self.request(reqwest::Method::DELETE, url, identity))
            .await
    }
}

impl WishlistApi for ApiGateway {
    #[instrument(skip(self, identity))]
    async fn fetch_wishlist(&self, identity: &Identity) -> Result<Vec<WishlistEntry>, ApiError> {
        let url = self.endpoint("wishlist")?;
        self.send_json(self.request(reqwest::Method::GET, url, identity))
            .await
    }

    #[instrument(skip(self, identity), fields(product_id = %product_id))]
    async fn add_entry(
        &self,
        identity: &Identity,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("wishlist")?;
        let request = self
            .request(reqwest::Method::POST, url, identity)
            .json(&AddWishlistPayload { product_id });
        self.send_no_content(request).await
    }

    #[instrument(skip(self, identity), fields(product_id = %product_id))]
    async fn remove_entry(
        &self,
        identity: &Identity,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("wishlist/{product_id}"))?;
        self.send_no_content(self.request(reqwest::Method::DELETE, url, identity))
            .await
    }
}

impl AddressApi for ApiGateway {
    #[instrument(skip(self, identity))]
    async fn list_addresses(&self, identity: &Identity) -> Result<Vec<Address>, ApiError> {
        let url = self.endpoint("address")?;
        self.send_json(self.request(reqwest::Method::GET, url, identity))
            .await
    }

    #[instrument(skip(self, identity, input))]
    async fn create_address(
        &self,
        identity: &Identity,
        input: &AddressInput,
    ) -> Result<Address, ApiError> {
        let url = self.endpoint("address")?;
        let request = self.request(reqwest::Method::POST, url, identity).json(input);
        self.send_json(request).await
    }

    #[instrument(skip(self, identity, input), fields(address_id = %address_id))]
    async fn update_address(
        &self,
        identity: &Identity,
        address_id: &AddressId,
        input: &AddressInput,
    ) -> Result<Address, ApiError> {
        let url = self.endpoint(&format!("address/{address_id}"))?;
        let request = self.request(reqwest::Method::PUT, url, identity).json(input);
        self.send_json(request).await
    }

    #[instrument(skip(self, identity), fields(address_id = %address_id))]
    async fn delete_address(
        &self,
        identity: &Identity,
        address_id: &AddressId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("address/{address_id}"))?;
        self.send_no_content(self.request(reqwest::Method::DELETE, url, identity))
            .await
    }
}

impl OrderApi for ApiGateway {
    #[instrument(skip(self, identity, draft), fields(idempotency_key = %idempotency_key))]
    async fn create_order(
        &self,
        identity: &Identity,
        draft: &OrderDraft,
        idempotency_key: Uuid,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint("order")?;
        let request = self
            .request(reqwest::Method::POST, url, identity)
            .header("Idempotency-Key", idempotency_key.to_string())
            .json(draft);
        self.send_json(request).await
    }

    #[instrument(skip(self, identity), fields(order_id = %order_id))]
    async fn fetch_order(
        &self,
        identity: &Identity,
        order_id: &OrderId,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&format!("order/{order_id}"))?;
        self.send_json(self.request(reqwest::Method::GET, url, identity))
            .await
    }
}
