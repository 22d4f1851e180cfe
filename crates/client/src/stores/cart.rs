//! Cart state store.
//!
//! Holds the latest fetched cart and coordinates add/update/remove against
//! the gateway. The displayed count is always derived by summing line
//! quantities from the latest snapshot, never tracked incrementally, so the
//! count cannot drift from server state.

use std::sync::RwLock;
use std::time::Duration;

use tracing::instrument;

use auric_core::{CartLineId, CartSnapshot, ProductId};

use crate::error::{Result, StoreError};
use crate::gateway::CartApi;
use crate::nav::SharedNavigator;
use crate::notify::{NoticeLevel, SharedNotifier};
use crate::session::Session;
use crate::stores::ProcessingFlags;

const CART_ERROR_NOTICE: &str = "Couldn't update your bag. Please try again.";
const SIGN_IN_NOTICE: &str = "Sign in to add items to your bag";

/// Client-side cart store.
pub struct CartStore<A: CartApi> {
    api: A,
    session: Session,
    notifier: SharedNotifier,
    navigator: SharedNavigator,
    settle_delay: Duration,
    snapshot: RwLock<CartSnapshot>,
    product_flags: ProcessingFlags<ProductId>,
    line_flags: ProcessingFlags<CartLineId>,
}

impl<A: CartApi> CartStore<A> {
    /// Create a cart store over a gateway.
    pub fn new(
        api: A,
        session: Session,
        notifier: SharedNotifier,
        navigator: SharedNavigator,
        settle_delay: Duration,
    ) -> Self {
        Self {
            api,
            session,
            notifier,
            navigator,
            settle_delay,
            snapshot: RwLock::new(CartSnapshot::default()),
            product_flags: ProcessingFlags::new(),
            line_flags: ProcessingFlags::new(),
        }
    }

    /// The latest fetched cart.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.snapshot
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Displayed item count: the sum of line quantities in the latest
    /// snapshot.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.snapshot
            .read()
            .map(|guard| guard.total_quantity())
            .unwrap_or(0)
    }

    /// Whether an add for this product is outstanding.
    #[must_use]
    pub fn is_adding(&self, product_id: &ProductId) -> bool {
        self.product_flags.is_processing(product_id)
    }

    /// Whether an update or removal for this line is outstanding.
    #[must_use]
    pub fn is_updating(&self, line_id: &CartLineId) -> bool {
        self.line_flags.is_processing(line_id)
    }

    /// Re-read the authoritative cart from the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AuthRequired`] when signed out, or the gateway
    /// error when the fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let identity = self.session.identity().ok_or(StoreError::AuthRequired)?;
        let cart = self.api.fetch_cart(&identity).await?;
        if let Ok(mut guard) = self.snapshot.write() {
            *guard = cart;
        }
        Ok(())
    }

    /// Add a product to the cart.
    ///
    /// Requires a signed-in user; otherwise surfaces a notice and returns
    /// [`StoreError::AuthRequired`] without touching the network. On success
    /// the cart is refetched; with `navigate` set, the navigator is asked to
    /// open the cart view after the settle delay so the UI state has
    /// visibly caught up first.
    ///
    /// # Errors
    ///
    /// Any gateway failure, after the notice has been shown and the
    /// processing flag cleared.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
        navigate: bool,
    ) -> Result<()> {
        let Some(identity) = self.session.identity() else {
            self.notifier.notify(NoticeLevel::Error, SIGN_IN_NOTICE);
            return Err(StoreError::AuthRequired);
        };

        let Some(_guard) = self.product_flags.begin(product_id.clone()) else {
            // An identical add is already outstanding; ignore the duplicate.
            return Ok(());
        };

        match self.api.add_line(&identity, product_id, quantity).await {
            Ok(()) => {
                self.refetch_after_write(&identity).await;
                if navigate {
                    tokio::time::sleep(self.settle_delay).await;
                    self.navigator.to_cart();
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "add to cart failed");
                self.notifier.notify(NoticeLevel::Error, CART_ERROR_NOTICE);
                Err(e.into())
            }
        }
    }

    /// Change a line's quantity.
    ///
    /// A quantity of zero is equivalent to removing the line. The cart is
    /// refetched whether or not the mutation succeeded, keeping the
    /// displayed count authoritative.
    ///
    /// # Errors
    ///
    /// [`StoreError::AuthRequired`] when signed out, or the gateway error.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_quantity(&self, line_id: &CartLineId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove_item(line_id).await;
        }

        let Some(identity) = self.session.identity() else {
            self.notifier.notify(NoticeLevel::Error, SIGN_IN_NOTICE);
            return Err(StoreError::AuthRequired);
        };

        let Some(_guard) = self.line_flags.begin(line_id.clone()) else {
            return Ok(());
        };

        let result = self.api.update_line(&identity, line_id, quantity).await;
        self.refetch_after_write(&identity).await;

        result.map_err(|e| {
            tracing::warn!(error = %e, "cart quantity update failed");
            self.notifier.notify(NoticeLevel::Error, CART_ERROR_NOTICE);
            e.into()
        })
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// [`StoreError::AuthRequired`] when signed out, or the gateway error.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: &CartLineId) -> Result<()> {
        let Some(identity) = self.session.identity() else {
            self.notifier.notify(NoticeLevel::Error, SIGN_IN_NOTICE);
            return Err(StoreError::AuthRequired);
        };

        let Some(_guard) = self.line_flags.begin(line_id.clone()) else {
            return Ok(());
        };

        let result = self.api.remove_line(&identity, line_id).await;
        self.refetch_after_write(&identity).await;

        result.map_err(|e| {
            tracing::warn!(error = %e, "cart line removal failed");
            self.notifier.notify(NoticeLevel::Error, CART_ERROR_NOTICE);
            e.into()
        })
    }

    /// Refetch after a mutation attempt. A failed refetch keeps the previous
    /// snapshot; the next successful fetch overwrites it anyway.
    async fn refetch_after_write(&self, identity: &crate::session::Identity) {
        match self.api.fetch_cart(identity).await {
            Ok(cart) => {
                if let Ok(mut guard) = self.snapshot.write() {
                    *guard = cart;
                }
            }
            Err(e) => tracing::warn!(error = %e, "cart refetch after write failed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use auric_core::{CartLine, CurrencyCode, Money, ProductSnapshot, UserId};

    use super::*;
    use crate::error::ApiError;
    use crate::nav::NullNavigator;
    use crate::notify::Notifier;
    use crate::session::Identity;

    /// In-memory cart server: lines keyed by product, quantities summed.
    #[derive(Default)]
    struct FakeCartApi {
        lines: Mutex<Vec<(ProductId, u32)>>,
        fail_mutations: AtomicBool,
        fetches: AtomicUsize,
    }

    impl FakeCartApi {
        fn line_id_for(product_id: &ProductId) -> CartLineId {
            CartLineId::new(format!("line_{product_id}"))
        }

        fn product_for(line_id: &CartLineId) -> ProductId {
            ProductId::new(line_id.as_str().trim_start_matches("line_"))
        }
    }

    impl CartApi for &FakeCartApi {
        async fn fetch_cart(&self, _identity: &Identity) -> std::result::Result<CartSnapshot, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let lines = self.lines.lock().unwrap();
            Ok(CartSnapshot {
                lines: lines
                    .iter()
                    .map(|(product_id, quantity)| CartLine {
                        id: FakeCartApi::line_id_for(product_id),
                        product_id: product_id.clone(),
                        quantity: *quantity,
                        unit_price: Money::new(Decimal::from(100), CurrencyCode::INR),
                        discount: Money::zero(CurrencyCode::INR),
                        product: ProductSnapshot {
                            name: "Pearl Pendant".to_string(),
                            images: vec![],
                            category: "pendants".to_string(),
                        },
                    })
                    .collect(),
            })
        }

        async fn add_line(
            &self,
            _identity: &Identity,
            product_id: &ProductId,
            quantity: u32,
        ) -> std::result::Result<(), ApiError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let mut lines = self.lines.lock().unwrap();
            if let Some(entry) = lines.iter_mut().find(|(p, _)| p == product_id) {
                entry.1 += quantity;
            } else {
                lines.push((product_id.clone(), quantity));
            }
            Ok(())
        }

        async fn update_line(
            &self,
            _identity: &Identity,
            line_id: &CartLineId,
            quantity: u32,
        ) -> std::result::Result<(), ApiError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let product_id = FakeCartApi::product_for(line_id);
            let mut lines = self.lines.lock().unwrap();
            if let Some(entry) = lines.iter_mut().find(|(p, _)| *p == product_id) {
                entry.1 = quantity;
            }
            Ok(())
        }

        async fn remove_line(
            &self,
            _identity: &Identity,
            line_id: &CartLineId,
        ) -> std::result::Result<(), ApiError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let product_id = FakeCartApi::product_for(line_id);
            let mut lines = self.lines.lock().unwrap();
            lines.retain(|(p, _)| *p != product_id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<(NoticeLevel, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, level: NoticeLevel, message: &str) {
            self.notices
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }

    fn signed_in_session() -> Session {
        let session = Session::new();
        session.sign_in(Identity {
            user_id: UserId::new("usr_1"),
            access_token: SecretString::from("tok"),
        });
        session
    }

    fn store<'a>(
        api: &'a FakeCartApi,
        session: Session,
        notifier: Arc<RecordingNotifier>,
    ) -> CartStore<&'a FakeCartApi> {
        CartStore::new(
            api,
            session,
            notifier,
            Arc::new(NullNavigator),
            Duration::from_millis(0),
        )
    }

    #[tokio::test]
    async fn test_count_equals_sum_of_quantities_after_add() {
        let api = FakeCartApi::default();
        let store = store(&api, signed_in_session(), Arc::default());

        store
            .add_item(&ProductId::new("prod_a"), 2, false)
            .await
            .unwrap();
        store
            .add_item(&ProductId::new("prod_b"), 3, false)
            .await
            .unwrap();

        assert_eq!(store.count(), 5);
        assert_eq!(store.count(), store.snapshot().total_quantity());
    }

    #[tokio::test]
    async fn test_add_requires_auth_and_never_calls_network() {
        let api = FakeCartApi::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let store = store(&api, Session::new(), Arc::clone(&notifier));

        let err = store
            .add_item(&ProductId::new("prod_a"), 1, false)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AuthRequired));
        assert_eq!(api.fetches.load(Ordering::SeqCst), 0);
        assert!(api.lines.lock().unwrap().is_empty());
        let notices = notifier.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_update_to_zero_is_equivalent_to_remove() {
        let api = FakeCartApi::default();
        let store = store(&api, signed_in_session(), Arc::default());
        let product = ProductId::new("prod_a");

        store.add_item(&product, 2, false).await.unwrap();
        let line_id = FakeCartApi::line_id_for(&product);

        store.update_quantity(&line_id, 0).await.unwrap();

        assert_eq!(store.count(), 0);
        assert!(store.snapshot().line_for_product(&product).is_none());
    }

    #[tokio::test]
    async fn test_update_refetches_even_after_failure() {
        let api = FakeCartApi::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let store = store(&api, signed_in_session(), Arc::clone(&notifier));
        let product = ProductId::new("prod_a");

        store.add_item(&product, 2, false).await.unwrap();
        let fetches_before = api.fetches.load(Ordering::SeqCst);

        api.fail_mutations.store(true, Ordering::SeqCst);
        let line_id = FakeCartApi::line_id_for(&product);
        let err = store.update_quantity(&line_id, 5).await.unwrap_err();

        assert!(matches!(err, StoreError::Api(_)));
        // The was-attempted refetch still happened
        assert_eq!(api.fetches.load(Ordering::SeqCst), fetches_before + 1);
        // Count still reflects server truth, and the flag is clear again
        assert_eq!(store.count(), 2);
        assert!(!store.is_updating(&line_id));
        assert!(!notifier.notices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_clears_line_and_flag() {
        let api = FakeCartApi::default();
        let store = store(&api, signed_in_session(), Arc::default());
        let product = ProductId::new("prod_a");

        store.add_item(&product, 1, false).await.unwrap();
        let line_id = FakeCartApi::line_id_for(&product);
        store.remove_item(&line_id).await.unwrap();

        assert_eq!(store.count(), 0);
        assert!(!store.is_updating(&line_id));
    }
}
