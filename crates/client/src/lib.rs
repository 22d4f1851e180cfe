//! Client orchestration for the Auric Jewels storefront.
//!
//! This crate sits between the UI shell and the REST gateway: it owns the
//! signed-in session, the cart / wishlist / address stores, and the
//! checkout flow. The stores are generic over the gateway endpoint traits
//! in [`gateway`]; [`Storefront`] wires them all to the real
//! [`gateway::ApiGateway`] from one [`config::StoreConfig`].
//!
//! UI concerns stay behind the [`notify::Notifier`] and [`nav::Navigator`]
//! seams, and payments behind [`checkout::PaymentProvider`], so the whole
//! layer runs headless in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod debounce;
pub mod error;
pub mod gateway;
pub mod nav;
pub mod notify;
pub mod session;
pub mod stores;

pub use checkout::{CheckoutSession, PaymentProvider, PaymentRequest};
pub use config::{ConfigError, StoreConfig};
pub use error::{ApiError, Result, StoreError};
pub use gateway::ApiGateway;
pub use nav::{Navigator, NullNavigator, SharedNavigator};
pub use notify::{NoticeLevel, Notifier, NullNotifier, SharedNotifier};
pub use session::{Identity, Session};
pub use stores::{AddressBook, CartStore, WishlistStore};

use debounce::TapGuard;

/// The fully wired client layer for one app session.
///
/// Everything shares one [`Session`] handle and one gateway connection
/// pool; the payment provider is the only injectable left to the caller at
/// this level, since it wraps a platform SDK.
pub struct Storefront<P: PaymentProvider> {
    session: Session,
    cart: CartStore<ApiGateway>,
    wishlist: WishlistStore<ApiGateway>,
    addresses: AddressBook<ApiGateway>,
    checkout: CheckoutSession<ApiGateway, P>,
}

impl<P: PaymentProvider> Storefront<P> {
    /// Wire the stores and checkout flow to the real gateway.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the HTTP client cannot be constructed.
    pub fn new(
        config: &StoreConfig,
        payments: P,
        notifier: SharedNotifier,
        navigator: SharedNavigator,
    ) -> std::result::Result<Self, ApiError> {
        let gateway = ApiGateway::new(config)?;
        let session = Session::new();

        let cart = CartStore::new(
            gateway.clone(),
            session.clone(),
            SharedNotifier::clone(&notifier),
            SharedNavigator::clone(&navigator),
            config.cart_settle_delay,
        );
        let wishlist = WishlistStore::new(
            gateway.clone(),
            session.clone(),
            SharedNotifier::clone(&notifier),
            config.wishlist_cache_ttl,
        );
        let addresses = AddressBook::new(
            gateway.clone(),
            session.clone(),
            SharedNotifier::clone(&notifier),
        );
        let checkout = CheckoutSession::new(
            gateway,
            payments,
            session.clone(),
            notifier,
            navigator,
            TapGuard::new(config.tap_window),
            config.pricing,
            config.confirmation_delay,
        );

        Ok(Self {
            session,
            cart,
            wishlist,
            addresses,
            checkout,
        })
    }

    /// The shared session handle.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore<ApiGateway> {
        &self.cart
    }

    /// The wishlist store.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore<ApiGateway> {
        &self.wishlist
    }

    /// The address book.
    #[must_use]
    pub fn addresses(&self) -> &AddressBook<ApiGateway> {
        &self.addresses
    }

    /// The checkout flow.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutSession<ApiGateway, P> {
        &self.checkout
    }
}
