//! Signed-in session state.
//!
//! The identity provider is an external collaborator: given a currently
//! signed-in session it produces a token and a user id, or neither. This
//! module only holds whatever the provider last handed over.

use std::sync::{Arc, RwLock};

use secrecy::SecretString;

use auric_core::UserId;

/// A signed-in user as reported by the identity provider.
#[derive(Clone)]
pub struct Identity {
    /// The user the collections are keyed by.
    pub user_id: UserId,
    /// Bearer token for gateway requests.
    pub access_token: SecretString,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Shared handle to the current session.
///
/// Cheaply cloneable; every store holds a clone and reads the identity at
/// the start of each operation, so a sign-out mid-session is observed by
/// the next operation rather than racing in-flight ones.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<Identity>>>,
}

impl Session {
    /// Create a signed-out session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sign-in from the identity provider.
    pub fn sign_in(&self, identity: Identity) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(identity);
        }
    }

    /// Clear the session.
    pub fn sign_out(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }

    /// The current identity, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    /// Whether a user is currently signed in.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.inner.read().is_ok_and(|guard| guard.is_some())
    }
}
