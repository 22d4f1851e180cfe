//! Double-tap suppression.
//!
//! An injectable debounce service with an explicit lifecycle: constructed
//! once per app session and passed to whatever needs it, so tests get their
//! own instance and nothing leaks through a module-level timestamp.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Suppresses a second tap that lands inside the configured window.
#[derive(Debug)]
pub struct TapGuard {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl TapGuard {
    /// Create a guard with the given suppression window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    /// Try to accept a tap.
    ///
    /// Returns `false` when a previous tap was accepted inside the window;
    /// the caller should ignore the tap outright. An accepted tap starts a
    /// new window.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let Ok(mut last) = self.last.lock() else {
            // A poisoned lock only happens if a holder panicked; accepting
            // the tap is the lesser evil versus wedging every control.
            return true;
        };

        if let Some(previous) = *last
            && now.duration_since(previous) < self.window
        {
            return false;
        }

        *last = Some(now);
        true
    }

    /// The configured suppression window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}
