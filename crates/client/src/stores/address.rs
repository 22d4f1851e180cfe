//! Saved address manager.
//!
//! CRUD over the user's shipping addresses. Form input is validated client
//! side before any network call; each successful mutation refetches the
//! list rather than patching the local cache. The default address sorts
//! first; demoting the previous default when another is promoted is the
//! server's contract.

use std::sync::RwLock;

use tracing::instrument;

use auric_core::validation::validate_address;
use auric_core::{Address, AddressId, AddressInput};

use crate::error::{Result, StoreError};
use crate::gateway::AddressApi;
use crate::notify::{NoticeLevel, SharedNotifier};
use crate::session::{Identity, Session};

const ADDRESS_ERROR_NOTICE: &str = "Couldn't save your address. Please try again.";

/// Client-side address book.
pub struct AddressBook<A: AddressApi> {
    api: A,
    session: Session,
    notifier: SharedNotifier,
    addresses: RwLock<Vec<Address>>,
}

impl<A: AddressApi> AddressBook<A> {
    /// Create an address book over a gateway.
    pub fn new(api: A, session: Session, notifier: SharedNotifier) -> Self {
        Self {
            api,
            session,
            notifier,
            addresses: RwLock::new(Vec::new()),
        }
    }

    /// The cached list: default address first, stable order otherwise.
    #[must_use]
    pub fn list(&self) -> Vec<Address> {
        self.addresses
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// The current default address, if one exists.
    #[must_use]
    pub fn default_address(&self) -> Option<Address> {
        self.addresses
            .read()
            .ok()
            .and_then(|guard| guard.iter().find(|a| a.is_default).cloned())
    }

    /// Re-read the address list from the gateway.
    ///
    /// # Errors
    ///
    /// [`StoreError::AuthRequired`] when signed out, or the gateway error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let identity = self.session.identity().ok_or(StoreError::AuthRequired)?;
        let mut addresses = self.api.list_addresses(&identity).await?;
        // Stable sort: the default first, server order preserved otherwise
        addresses.sort_by_key(|address| !address.is_default);
        if let Ok(mut guard) = self.addresses.write() {
            *guard = addresses;
        }
        Ok(())
    }

    /// Create a new address.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] with field-level errors before any network
    /// call, [`StoreError::AuthRequired`] when signed out, or the gateway
    /// error.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &AddressInput) -> Result<Address> {
        validate_address(input)?;
        let identity = self.session.identity().ok_or(StoreError::AuthRequired)?;

        match self.api.create_address(&identity, input).await {
            Ok(address) => {
                self.refetch_after_write(&identity).await;
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(error = %e, "address create failed");
                self.notifier.notify(NoticeLevel::Error, ADDRESS_ERROR_NOTICE);
                Err(e.into())
            }
        }
    }

    /// Update an address in place.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::create`].
    #[instrument(skip(self, input), fields(address_id = %address_id))]
    pub async fn update(&self, address_id: &AddressId, input: &AddressInput) -> Result<Address> {
        validate_address(input)?;
        let identity = self.session.identity().ok_or(StoreError::AuthRequired)?;

        match self.api.update_address(&identity, address_id, input).await {
            Ok(address) => {
                self.refetch_after_write(&identity).await;
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(error = %e, "address update failed");
                self.notifier.notify(NoticeLevel::Error, ADDRESS_ERROR_NOTICE);
                Err(e.into())
            }
        }
    }

    /// Delete an address by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::AuthRequired`] when signed out, or the gateway error.
    #[instrument(skip(self), fields(address_id = %address_id))]
    pub async fn delete(&self, address_id: &AddressId) -> Result<()> {
        let identity = self.session.identity().ok_or(StoreError::AuthRequired)?;

        match self.api.delete_address(&identity, address_id).await {
            Ok(()) => {
                self.refetch_after_write(&identity).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "address delete failed");
                self.notifier.notify(NoticeLevel::Error, ADDRESS_ERROR_NOTICE);
                Err(e.into())
            }
        }
    }

    /// Make an address the default.
    ///
    /// Issued as an update with `is_default = true`; the server demotes the
    /// previous default. That single-writer assumption is a documented
    /// server contract, not re-verified here.
    ///
    /// # Errors
    ///
    /// [`StoreError::Api`] wrapping `NotFound` when the id is not in the
    /// cached list, plus the taxonomy of [`Self::update`].
    pub async fn set_default(&self, address_id: &AddressId) -> Result<Address> {
        let current = self
            .list()
            .into_iter()
            .find(|address| &address.id == address_id)
            .ok_or_else(|| {
                StoreError::Api(crate::error::ApiError::NotFound(format!(
                    "address {address_id} is not in the saved list"
                )))
            })?;

        let input = AddressInput {
            name: current.name,
            phone: current.phone,
            street: current.street,
            city: current.city,
            state: current.state,
            zip_code: current.zip_code,
            country: current.country,
            kind: current.kind,
            is_default: true,
        };

        self.update(address_id, &input).await
    }

    /// Refetch after a successful mutation. A failed refetch keeps the
    /// previous list; the next successful fetch overwrites it anyway.
    async fn refetch_after_write(&self, identity: &Identity) {
        match self.api.list_addresses(identity).await {
            Ok(mut addresses) => {
                addresses.sort_by_key(|address| !address.is_default);
                if let Ok(mut guard) = self.addresses.write() {
                    *guard = addresses;
                }
            }
            Err(e) => tracing::warn!(error = %e, "address refetch after write failed"),
        }
    }
}
