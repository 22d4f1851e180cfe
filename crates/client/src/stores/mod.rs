//! Client-side state stores.
//!
//! Each store owns one server collection (cart, wishlist, addresses) as a
//! provisional local copy, overwritten by the next fetch. Every mutation is
//! followed by a refetch of the owning collection (refetch-after-write);
//! nothing here maintains an optimistic prediction that could drift.

mod address;
mod cart;
mod wishlist;

pub use address::AddressBook;
pub use cart::CartStore;
pub use wishlist::WishlistStore;

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Mutex;

/// Per-entity processing flags.
///
/// A flag marks an outstanding async mutation on one entity; it is used to
/// disable duplicate actions and drive spinners. Beginning an operation on
/// an entity that is already processing is refused, which blocks a second
/// identical operation while one is outstanding.
#[derive(Debug, Default)]
pub struct ProcessingFlags<K: Eq + Hash + Clone> {
    active: Mutex<HashSet<K>>,
}

impl<K: Eq + Hash + Clone> ProcessingFlags<K> {
    /// Create an empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Mark an entity as processing.
    ///
    /// Returns `None` when the entity is already processing; the caller
    /// should skip the duplicate operation. The returned guard clears the
    /// flag on drop, including on error paths.
    pub fn begin(&self, key: K) -> Option<ProcessingGuard<'_, K>> {
        let mut active = self.active.lock().ok()?;
        if !active.insert(key.clone()) {
            return None;
        }
        Some(ProcessingGuard { flags: self, key })
    }

    /// Whether an entity currently has an outstanding mutation.
    #[must_use]
    pub fn is_processing(&self, key: &K) -> bool {
        self.active
            .lock()
            .is_ok_and(|active| active.contains(key))
    }

    fn end(&self, key: &K) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(key);
        }
    }
}

/// Clears a processing flag when dropped.
#[derive(Debug)]
pub struct ProcessingGuard<'a, K: Eq + Hash + Clone> {
    flags: &'a ProcessingFlags<K>,
    key: K,
}

impl<K: Eq + Hash + Clone> Drop for ProcessingGuard<'_, K> {
    fn drop(&mut self) {
        self.flags.end(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_refuses_duplicate() {
        let flags = ProcessingFlags::new();
        let guard = flags.begin("a");
        assert!(guard.is_some());
        assert!(flags.begin("a").is_none());
        assert!(flags.is_processing(&"a"));
    }

    #[test]
    fn test_guard_clears_on_drop() {
        let flags = ProcessingFlags::new();
        {
            let _guard = flags.begin("a");
            assert!(flags.is_processing(&"a"));
        }
        assert!(!flags.is_processing(&"a"));
        assert!(flags.begin("a").is_some());
    }

    #[test]
    fn test_flags_are_per_entity() {
        let flags = ProcessingFlags::new();
        let _a = flags.begin("a");
        assert!(flags.begin("b").is_some());
    }
}
