//! Notification seam for the UI shell.
//!
//! Stores report non-blocking toasts and alerts through this trait instead
//! of owning any rendering. The shell installs its own implementation; tests
//! install a recording one.

use std::sync::Arc;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Toast/alert surface implemented by the UI shell.
pub trait Notifier: Send + Sync {
    /// Show a non-blocking notice to the user.
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Shared notifier handle.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Discards all notices. Useful for headless use and benchmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _level: NoticeLevel, _message: &str) {}
}

/// Emits notices as tracing events instead of UI toasts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!(notice = message),
            NoticeLevel::Error => tracing::warn!(notice = message),
        }
    }
}
