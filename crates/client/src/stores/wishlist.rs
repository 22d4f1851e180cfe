//! Wishlist state store.
//!
//! Membership is a cached set of product ids (moka, short TTL) that is
//! invalidated on every toggle rather than patched locally. Toggles for the
//! same product are serialized through a per-product lock, so a second
//! toggle issued before the first resolves waits for it instead of racing
//! the membership check.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use auric_core::{ProductId, UserId, WishlistEntry};

use crate::error::{Result, StoreError};
use crate::gateway::WishlistApi;
use crate::notify::{NoticeLevel, SharedNotifier};
use crate::session::{Identity, Session};
use crate::stores::ProcessingFlags;

const WISHLIST_ERROR_NOTICE: &str = "Couldn't update your wishlist. Please try again.";

/// Client-side wishlist store.
pub struct WishlistStore<A: WishlistApi> {
    api: A,
    session: Session,
    notifier: SharedNotifier,
    membership: Cache<UserId, Arc<HashSet<ProductId>>>,
    toggle_locks: Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>,
    processing: ProcessingFlags<ProductId>,
}

impl<A: WishlistApi> WishlistStore<A> {
    /// Create a wishlist store over a gateway.
    pub fn new(api: A, session: Session, notifier: SharedNotifier, cache_ttl: Duration) -> Self {
        let membership = Cache::builder()
            .max_capacity(16)
            .time_to_live(cache_ttl)
            .build();

        Self {
            api,
            session,
            notifier,
            membership,
            toggle_locks: Mutex::new(HashMap::new()),
            processing: ProcessingFlags::new(),
        }
    }

    /// Whether a toggle for this product is outstanding.
    #[must_use]
    pub fn is_processing(&self, product_id: &ProductId) -> bool {
        self.processing.is_processing(product_id)
    }

    /// Membership check against the cached id set.
    ///
    /// A cache hit is an O(1) set lookup; a miss fetches the wishlist once
    /// and caches the ids for the configured TTL. Signed-out users are never
    /// members of anything.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when a required fetch fails.
    pub async fn is_in_wishlist(&self, product_id: &ProductId) -> Result<bool> {
        let Some(identity) = self.session.identity() else {
            return Ok(false);
        };
        let ids = self.membership_for(&identity).await?;
        Ok(ids.contains(product_id))
    }

    /// The full wishlist, fetched fresh from the gateway.
    ///
    /// # Errors
    ///
    /// [`StoreError::AuthRequired`] when signed out, or the gateway error.
    #[instrument(skip(self))]
    pub async fn entries(&self) -> Result<Vec<WishlistEntry>> {
        let identity = self.session.identity().ok_or(StoreError::AuthRequired)?;
        Ok(self.api.fetch_wishlist(&identity).await?)
    }

    /// Toggle a product's wishlist membership.
    ///
    /// Silently returns when the user is unauthenticated. Toggles for the
    /// same product are serialized; inside the lock the current membership
    /// decides between an add and a remove, and the membership cache is
    /// invalidated afterwards so the next read refetches.
    ///
    /// # Errors
    ///
    /// Any gateway failure, after the notice has been shown and the
    /// processing flag cleared.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle(&self, product_id: &ProductId) -> Result<()> {
        let Some(identity) = self.session.identity() else {
            return Ok(());
        };

        let lock = self.lock_for(product_id);
        let _serialized = lock.lock().await;

        let _guard = self.processing.begin(product_id.clone());

        let result = async {
            let ids = self.membership_for(&identity).await?;
            if ids.contains(product_id) {
                self.api.remove_entry(&identity, product_id).await?;
            } else {
                self.api.add_entry(&identity, product_id).await?;
            }
            Ok(())
        }
        .await;

        // Invalidate even after a failure; the mutation may have landed
        // before the response was lost.
        self.membership.invalidate(&identity.user_id).await;

        result.inspect_err(|e: &StoreError| {
            tracing::warn!(error = %e, "wishlist toggle failed");
            self.notifier.notify(NoticeLevel::Error, WISHLIST_ERROR_NOTICE);
        })
    }

    async fn membership_for(&self, identity: &Identity) -> Result<Arc<HashSet<ProductId>>> {
        if let Some(ids) = self.membership.get(&identity.user_id).await {
            return Ok(ids);
        }

        let entries = self.api.fetch_wishlist(identity).await?;
        let ids: Arc<HashSet<ProductId>> =
            Arc::new(entries.into_iter().map(|entry| entry.product_id).collect());
        self.membership
            .insert(identity.user_id.clone(), Arc::clone(&ids))
            .await;
        Ok(ids)
    }

    fn lock_for(&self, product_id: &ProductId) -> Arc<tokio::sync::Mutex<()>> {
        let Ok(mut locks) = self.toggle_locks.lock() else {
            return Arc::new(tokio::sync::Mutex::new(()));
        };
        Arc::clone(
            locks
                .entry(product_id.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use auric_core::{CurrencyCode, Money};

    use super::*;
    use crate::error::ApiError;
    use crate::notify::NullNotifier;

    #[derive(Default)]
    struct FakeWishlistApi {
        ids: Mutex<HashSet<ProductId>>,
        calls: AtomicUsize,
    }

    impl WishlistApi for &FakeWishlistApi {
        async fn fetch_wishlist(
            &self,
            _identity: &Identity,
        ) -> std::result::Result<Vec<WishlistEntry>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let ids = self.ids.lock().unwrap();
            Ok(ids
                .iter()
                .map(|product_id| WishlistEntry {
                    product_id: product_id.clone(),
                    name: "Ruby Stud".to_string(),
                    price: Money::new(Decimal::from(1200), CurrencyCode::INR),
                    images: vec![],
                    in_stock: true,
                })
                .collect())
        }

        async fn add_entry(
            &self,
            _identity: &Identity,
            product_id: &ProductId,
        ) -> std::result::Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ids.lock().unwrap().insert(product_id.clone());
            Ok(())
        }

        async fn remove_entry(
            &self,
            _identity: &Identity,
            product_id: &ProductId,
        ) -> std::result::Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ids.lock().unwrap().remove(product_id);
            Ok(())
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

    fn store(api: &FakeWishlistApi, session: Session) -> WishlistStore<&FakeWishlistApi> {
        WishlistStore::new(
            api,
            session,
            Arc::new(NullNotifier),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_original_membership() {
        let api = FakeWishlistApi::default();
        let store = store(&api, signed_in_session());
        let product = ProductId::new("prod_a");

        assert!(!store.is_in_wishlist(&product).await.unwrap());

        store.toggle(&product).await.unwrap();
        assert!(store.is_in_wishlist(&product).await.unwrap());

        store.toggle(&product).await.unwrap();
        assert!(!store.is_in_wishlist(&product).await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_signed_out_is_silent_noop() {
        let api = FakeWishlistApi::default();
        let store = store(&api, Session::new());

        store.toggle(&ProductId::new("prod_a")).await.unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert!(api.ids.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_membership_is_cached_between_reads() {
        let api = FakeWishlistApi::default();
        let store = store(&api, signed_in_session());
        let product = ProductId::new("prod_a");

        store.is_in_wishlist(&product).await.unwrap();
        store.is_in_wishlist(&product).await.unwrap();

        // One fetch populated the cache; the second read hit it.
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_serialize_per_product() {
        let api = FakeWishlistApi::default();
        let store = store(&api, signed_in_session());
        let product = ProductId::new("prod_a");

        let (a, b) = tokio::join!(store.toggle(&product), store.toggle(&product));
        a.unwrap();
        b.unwrap();

        // One add then one remove: membership is back where it started.
        assert!(!store.is_in_wishlist(&product).await.unwrap());
    }
}
