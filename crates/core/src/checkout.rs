//! The checkout state machine.
//!
//! States: `Idle -> Processing -> {Success | Failed | Cancelled}`, with
//! `Failed` and `Cancelled` retryable back to `Idle` only. Landing retries
//! in `Idle` rather than `Processing` forces the user to re-confirm before
//! a new payment attempt, so a retry can never silently re-submit.
//!
//! The transitions here are pure; entry guards that need a signed-in user
//! and a selected address live in the client orchestrator. Settlement is a
//! total function over [`PaymentOutcome`], so adding a provider outcome
//! variant is a compile error until the machine handles it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{OrderId, PaymentOutcome};

/// Where the checkout flow currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    /// Waiting for the user to place the order.
    #[default]
    Idle,
    /// An order submission and payment attempt is in flight.
    Processing,
    /// The provider confirmed payment.
    Success { order_id: OrderId },
    /// The payment step failed. The order may exist server-side unpaid.
    Failed {
        message: String,
        order_id: Option<OrderId>,
    },
    /// The user backed out of the provider's flow.
    Cancelled { order_id: Option<OrderId> },
}

impl CheckoutState {
    /// Short status label for display.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Success { .. } => "success",
            Self::Failed { .. } => "failed",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// Whether a "Try Again" action is currently offered.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Cancelled { .. })
    }
}

/// A transition was requested from a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// `begin` was called while an attempt is already in flight.
    #[error("an order is already being processed")]
    AlreadyProcessing,

    /// `begin` was called from a terminal state without a retry first.
    #[error("checkout is not idle (currently {current})")]
    NotIdle { current: &'static str },

    /// `settle` was called outside `Processing`.
    #[error("no payment attempt is in flight (currently {current})")]
    NotProcessing { current: &'static str },

    /// `retry` was called from a state with nothing to retry.
    #[error("nothing to retry (currently {current})")]
    NotRetryable { current: &'static str },
}

impl CheckoutState {
    /// Enter `Processing` from `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::AlreadyProcessing`] when an attempt is in
    /// flight, or [`TransitionError::NotIdle`] from any terminal state.
    pub fn begin(self) -> Result<Self, TransitionError> {
        match self {
            Self::Idle => Ok(Self::Processing),
            Self::Processing => Err(TransitionError::AlreadyProcessing),
            other => Err(TransitionError::NotIdle {
                current: other.label(),
            }),
        }
    }

    /// Settle a payment attempt with the provider's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotProcessing`] from any state other than
    /// `Processing`.
    pub fn settle(self, outcome: PaymentOutcome) -> Result<Self, TransitionError> {
        if !matches!(self, Self::Processing) {
            return Err(TransitionError::NotProcessing {
                current: self.label(),
            });
        }

        Ok(match outcome {
            PaymentOutcome::Success { order_id, .. } => Self::Success { order_id },
            PaymentOutcome::Failure { message, order_id } => Self::Failed { message, order_id },
            PaymentOutcome::Cancelled { order_id } => Self::Cancelled { order_id },
        })
    }

    /// Reset to `Idle` after a failure or cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotRetryable`] from `Idle`, `Processing`,
    /// or `Success`.
    pub fn retry(self) -> Result<Self, TransitionError> {
        if self.can_retry() {
            Ok(Self::Idle)
        } else {
            Err(TransitionError::NotRetryable {
                current: self.label(),
            })
        }
    }
}
