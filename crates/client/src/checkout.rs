//! Checkout orchestration.
//!
//! Drives the pure state machine in `auric_core::checkout` through a real
//! order placement: entry guards (double-tap suppression, signed-in user,
//! selected address), draft pricing, order submission with an idempotency
//! key, the payment-provider handoff, and settlement. Only the provider's
//! outcome settles the machine; guard failures and pricing rejections abort
//! before the state ever leaves `Idle`.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::instrument;
use uuid::Uuid;

use auric_core::checkout::CheckoutState;
use auric_core::pricing::PricingRules;
use auric_core::{
    Address, CartLine, CartSnapshot, Coupon, Money, Order, OrderDraft, OrderId, PaymentOutcome,
};

use crate::debounce::TapGuard;
use crate::error::{Result, StoreError};
use crate::gateway::OrderApi;
use crate::nav::SharedNavigator;
use crate::notify::{NoticeLevel, SharedNotifier};
use crate::session::Session;

const ORDER_SUCCESS_NOTICE: &str = "Order placed successfully!";
const ORDER_FAILED_NOTICE: &str = "Payment failed. You can try again.";
const ORDER_CANCELLED_NOTICE: &str = "Payment cancelled.";
const SIGN_IN_NOTICE: &str = "Please sign in to continue.";
const ADDRESS_NOTICE: &str = "Please select a delivery address.";
const COUPON_APPLIED_NOTICE: &str = "Coupon applied.";

/// Everything a payment provider needs to collect a payment.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Amount to charge; the order draft's total.
    pub amount: Money,
    /// The gateway-issued order being paid for.
    pub order_id: OrderId,
    /// Client-generated reference, also used as the order idempotency key.
    pub reference: Uuid,
    /// Customer name for provider prefill.
    pub customer_name: String,
    /// Customer phone for provider prefill.
    pub customer_phone: String,
    /// The delivery address the order was placed with.
    pub shipping_address: Address,
    /// The purchased lines.
    pub lines: Vec<CartLine>,
}

/// Hands a payment request to an external provider and reports the outcome.
///
/// `collect` is infallible at the type level: transport and provider errors
/// come back as [`PaymentOutcome::Failure`], so every ending settles the
/// state machine.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Run the provider's payment flow to completion.
    async fn collect(&self, request: &PaymentRequest) -> PaymentOutcome;
}

/// The checkout flow for one app session.
pub struct CheckoutSession<O: OrderApi, P: PaymentProvider> {
    orders: O,
    payments: P,
    session: Session,
    notifier: SharedNotifier,
    navigator: SharedNavigator,
    tap_guard: TapGuard,
    pricing: PricingRules,
    confirmation_delay: Duration,
    state: Mutex<CheckoutState>,
    coupon: Mutex<Option<Coupon>>,
}

impl<O: OrderApi, P: PaymentProvider> CheckoutSession<O, P> {
    /// Wire up a checkout session.
    ///
    /// The tap guard is injected rather than constructed here so the caller
    /// controls its lifecycle and tests control time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: O,
        payments: P,
        session: Session,
        notifier: SharedNotifier,
        navigator: SharedNavigator,
        tap_guard: TapGuard,
        pricing: PricingRules,
        confirmation_delay: Duration,
    ) -> Self {
        Self {
            orders,
            payments,
            session,
            notifier,
            navigator,
            tap_guard,
            pricing,
            confirmation_delay,
            state: Mutex::new(CheckoutState::Idle),
            coupon: Mutex::new(None),
        }
    }

    /// The current checkout state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The applied coupon, if any.
    #[must_use]
    pub fn active_coupon(&self) -> Option<Coupon> {
        self.coupon
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a coupon to the session.
    ///
    /// Eligibility is checked against the current cart subtotal; an
    /// ineligible coupon leaves any previously applied coupon untouched.
    ///
    /// # Errors
    ///
    /// [`StoreError::Pricing`] for an empty cart, or [`StoreError::Coupon`]
    /// when the coupon is rejected.
    #[instrument(skip(self, cart), fields(code = %coupon.code))]
    pub fn apply_coupon(&self, coupon: Coupon, cart: &CartSnapshot) -> Result<()> {
        let subtotal = cart
            .subtotal()
            .ok_or(auric_core::pricing::PricingError::EmptyCart)?;

        if let Err(e) = self.pricing.check_eligibility(&coupon, &subtotal) {
            self.notifier.notify(NoticeLevel::Error, &e.to_string());
            return Err(e.into());
        }

        *self.coupon.lock().unwrap_or_else(PoisonError::into_inner) = Some(coupon);
        self.notifier
            .notify(NoticeLevel::Success, COUPON_APPLIED_NOTICE);
        Ok(())
    }

    /// Remove the applied coupon. A no-op when none is applied.
    pub fn remove_coupon(&self) {
        *self.coupon.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Price the current cart into an order draft without submitting it.
    ///
    /// # Errors
    ///
    /// [`StoreError::Pricing`] for an empty cart or an applied coupon that
    /// is no longer eligible.
    pub fn draft(&self, cart: &CartSnapshot, address: &Address) -> Result<OrderDraft> {
        let coupon = self.active_coupon();
        Ok(self
            .pricing
            .build_draft(cart, address.id.clone(), coupon.as_ref())?)
    }

    /// Place the order and run the payment flow to settlement.
    ///
    /// A tap landing inside the suppression window is ignored outright and
    /// returns `Ok`. The signed-in and address guards run before the state
    /// leaves `Idle`, as does draft pricing; once `Processing` is entered,
    /// every ending settles the machine. An order-submission failure settles
    /// as a payment failure, since the attempt is over either way.
    ///
    /// # Errors
    ///
    /// Guard and pricing errors ([`StoreError::AuthRequired`],
    /// [`StoreError::AddressRequired`], [`StoreError::Pricing`]), a
    /// [`StoreError::Transition`] when checkout is not idle, or the gateway
    /// error from order submission. A settled payment failure or
    /// cancellation is not an error; inspect [`Self::state`].
    #[instrument(skip_all)]
    pub async fn place_order(&self, cart: &CartSnapshot, address: Option<&Address>) -> Result<()> {
        if !self.tap_guard.try_acquire() {
            tracing::debug!("place-order tap suppressed");
            return Ok(());
        }

        if self.session.identity().is_none() {
            self.notifier.notify(NoticeLevel::Error, SIGN_IN_NOTICE);
            return Err(StoreError::AuthRequired);
        }
        let Some(address) = address else {
            self.notifier.notify(NoticeLevel::Error, ADDRESS_NOTICE);
            return Err(StoreError::AddressRequired);
        };

        // Priced before leaving Idle: an empty cart or a lapsed coupon is
        // not a payment attempt.
        let draft = self.draft(cart, address)?;

        self.transition(CheckoutState::begin)?;

        let reference = Uuid::new_v4();
        let order = match self.submit_order(&draft, reference).await {
            Ok(order) => order,
            Err(e) => {
                self.settle(PaymentOutcome::Failure {
                    message: e.to_string(),
                    order_id: None,
                });
                return Err(e);
            }
        };

        let request = PaymentRequest {
            amount: draft.total,
            order_id: order.id.clone(),
            reference,
            customer_name: address.name.clone(),
            customer_phone: address.phone.clone(),
            shipping_address: address.clone(),
            lines: draft.lines,
        };

        let outcome = self.payments.collect(&request).await;
        self.settle(outcome);

        if let CheckoutState::Success { order_id } = self.state() {
            self.remove_coupon();
            tokio::time::sleep(self.confirmation_delay).await;
            self.navigator.to_order_confirmation(&order_id);
        }

        Ok(())
    }

    /// Reset a failed or cancelled checkout back to `Idle`.
    ///
    /// The user must confirm again before a new payment attempt starts;
    /// retry never re-submits on its own.
    ///
    /// # Errors
    ///
    /// [`StoreError::Transition`] from any non-retryable state.
    pub fn retry(&self) -> Result<()> {
        self.transition(CheckoutState::retry)
    }

    async fn submit_order(&self, draft: &OrderDraft, reference: Uuid) -> Result<Order> {
        let identity = self.session.identity().ok_or(StoreError::AuthRequired)?;
        Ok(self.orders.create_order(&identity, draft, reference).await?)
    }

    fn settle(&self, outcome: PaymentOutcome) {
        match &outcome {
            PaymentOutcome::Success { order_id, .. } => {
                tracing::info!(order_id = %order_id, "payment confirmed");
                self.notifier.notify(NoticeLevel::Success, ORDER_SUCCESS_NOTICE);
            }
            PaymentOutcome::Failure { message, .. } => {
                tracing::warn!(message = %message, "payment failed");
                self.notifier.notify(NoticeLevel::Error, ORDER_FAILED_NOTICE);
            }
            PaymentOutcome::Cancelled { .. } => {
                tracing::info!("payment cancelled by user");
                self.notifier.notify(NoticeLevel::Info, ORDER_CANCELLED_NOTICE);
            }
        }

        if let Err(e) = self.transition(|state| state.settle(outcome)) {
            // Unreachable while place_order holds the only path into
            // Processing; log rather than panic if that ever changes.
            tracing::error!(error = %e, "settlement rejected");
        }
    }

    fn transition<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(CheckoutState) -> std::result::Result<CheckoutState, auric_core::checkout::TransitionError>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = apply(state.clone())?;
        *state = next;
        Ok(())
    }
}
