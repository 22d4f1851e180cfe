//! Shared test doubles for exercising the client layer end to end.
//!
//! [`FakeGateway`] is an in-memory stand-in for the REST gateway: it
//! implements all four endpoint traits over mutexed state, honors the
//! order idempotency key, and supports failure injection so tests can
//! observe the stores' refetch-after-write and settlement behavior.
//! [`ScriptedPayments`], [`RecordingNotifier`], and [`RecordingNavigator`]
//! cover the remaining seams.

// Test support: unwrapping mutexes in fakes is fine, a poisoned lock in a
// test double should abort the test anyway.
#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use secrecy::SecretString;
use uuid::Uuid;

use auric_client::checkout::{PaymentProvider, PaymentRequest};
use auric_client::error::ApiError;
use auric_client::gateway::{AddressApi, CartApi, OrderApi, WishlistApi};
use auric_client::nav::Navigator;
use auric_client::notify::{NoticeLevel, Notifier};
use auric_client::session::{Identity, Session};
use auric_core::{
    Address, AddressId, AddressInput, CartLine, CartLineId, CartSnapshot, Coupon, CouponCode,
    CurrencyCode, Money, Order, OrderDraft, OrderId, OrderPayment, OrderStatus, OrderStatusEntry,
    PaymentOutcome, ProductId, ProductSnapshot, UserId, WishlistEntry,
};

// =============================================================================
// Helpers
// =============================================================================

/// Install a tracing subscriber for test output, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call in the process wins.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// INR money literal for tests.
#[must_use]
pub fn inr(amount: i64) -> Money {
    Money::new(Decimal::from(amount), CurrencyCode::INR)
}

/// A session with a signed-in test user.
#[must_use]
pub fn signed_in_session() -> Session {
    let session = Session::new();
    session.sign_in(Identity {
        user_id: UserId::new("usr_test"),
        access_token: SecretString::from("tok_test"),
    });
    session
}

/// A valid address form input.
#[must_use]
pub fn address_input(name: &str, is_default: bool) -> AddressInput {
    AddressInput {
        name: name.to_string(),
        phone: "9876543210".to_string(),
        street: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        zip_code: "560001".to_string(),
        country: "India".to_string(),
        kind: auric_core::AddressKind::Home,
        is_default,
    }
}

/// An active flat-discount coupon.
#[must_use]
pub fn coupon(code: &str, discount: i64, minimum: i64) -> Coupon {
    Coupon {
        code: CouponCode::new(code),
        discount_amount: inr(discount),
        min_cart_value: inr(minimum),
        active: true,
    }
}

// =============================================================================
// FakeGateway
// =============================================================================

/// Catalog data the fake gateway serves for a product.
#[derive(Debug, Clone)]
pub struct ProductSeed {
    pub name: String,
    pub price: Money,
    pub category: String,
}

#[derive(Default)]
struct GatewayState {
    catalog: Mutex<HashMap<ProductId, ProductSeed>>,
    cart: Mutex<Vec<CartLine>>,
    wishlist: Mutex<HashSet<ProductId>>,
    addresses: Mutex<Vec<Address>>,
    orders: Mutex<Vec<Order>>,
    idempotency: Mutex<HashMap<Uuid, OrderId>>,
    next_id: AtomicUsize,
    cart_fetches: AtomicUsize,
    fail_cart_mutations: AtomicBool,
    fail_order_creation: AtomicBool,
}

/// In-memory gateway implementing all four endpoint traits.
///
/// Cheaply cloneable; clones share state, so a test can hand clones to the
/// stores and keep one for inspection.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<GatewayState>,
}

impl FakeGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product the cart and wishlist endpoints can serve.
    pub fn seed_product(&self, product_id: &ProductId, name: &str, price: Money, category: &str) {
        self.state.catalog.lock().unwrap().insert(
            product_id.clone(),
            ProductSeed {
                name: name.to_string(),
                price,
                category: category.to_string(),
            },
        );
    }

    /// Seed a saved address directly, bypassing the create endpoint.
    pub fn seed_address(&self, input: &AddressInput) -> Address {
        let address = self.materialize_address(self.next_id("addr"), input);
        self.state.addresses.lock().unwrap().push(address.clone());
        address
    }

    /// How many times the cart has been fetched.
    #[must_use]
    pub fn cart_fetches(&self) -> usize {
        self.state.cart_fetches.load(Ordering::SeqCst)
    }

    /// How many orders have been persisted.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.state.orders.lock().unwrap().len()
    }

    /// The server-side cart lines, for assertions.
    #[must_use]
    pub fn server_cart(&self) -> Vec<CartLine> {
        self.state.cart.lock().unwrap().clone()
    }

    /// Make every cart mutation fail with a 500 until reset.
    pub fn fail_cart_mutations(&self, fail: bool) {
        self.state.fail_cart_mutations.store(fail, Ordering::SeqCst);
    }

    /// Make order creation fail with a 503 until reset.
    pub fn fail_order_creation(&self, fail: bool) {
        self.state.fail_order_creation.store(fail, Ordering::SeqCst);
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}_{n}")
    }

    fn materialize_address(&self, id: String, input: &AddressInput) -> Address {
        Address {
            id: AddressId::new(id),
            name: input.name.clone(),
            phone: input.phone.clone(),
            street: input.street.clone(),
            city: input.city.clone(),
            state: input.state.clone(),
            zip_code: input.zip_code.clone(),
            country: input.country.clone(),
            kind: input.kind,
            is_default: input.is_default,
        }
    }

    fn seed_for(&self, product_id: &ProductId) -> Result<ProductSeed, ApiError> {
        self.state
            .catalog
            .lock()
            .unwrap()
            .get(product_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("no such product: {product_id}")))
    }

    fn check_cart_mutation(&self) -> Result<(), ApiError> {
        if self.state.fail_cart_mutations.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "injected cart failure".to_string(),
            });
        }
        Ok(())
    }
}

impl CartApi for FakeGateway {
    async fn fetch_cart(&self, _identity: &Identity) -> Result<CartSnapshot, ApiError> {
        self.state.cart_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(CartSnapshot {
            lines: self.state.cart.lock().unwrap().clone(),
        })
    }

    async fn add_line(
        &self,
        _identity: &Identity,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.check_cart_mutation()?;
        let seed = self.seed_for(product_id)?;
        let mut cart = self.state.cart.lock().unwrap();
        if let Some(line) = cart.iter_mut().find(|line| &line.product_id == product_id) {
            // Server merges a repeated add into the existing line
            line.quantity += quantity;
            return Ok(());
        }
        let id = self.next_id("line");
        cart.push(CartLine {
            id: CartLineId::new(id),
            product_id: product_id.clone(),
            quantity,
            unit_price: seed.price,
            discount: Money::zero(seed.price.currency_code),
            product: ProductSnapshot {
                name: seed.name,
                images: vec![],
                category: seed.category,
            },
        });
        Ok(())
    }

    async fn update_line(
        &self,
        _identity: &Identity,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.check_cart_mutation()?;
        let mut cart = self.state.cart.lock().unwrap();
        let line = cart
            .iter_mut()
            .find(|line| &line.id == line_id)
            .ok_or_else(|| ApiError::NotFound(format!("no such line: {line_id}")))?;
        line.quantity = quantity;
        Ok(())
    }

    async fn remove_line(
        &self,
        _identity: &Identity,
        line_id: &CartLineId,
    ) -> Result<(), ApiError> {
        self.check_cart_mutation()?;
        self.state
            .cart
            .lock()
            .unwrap()
            .retain(|line| &line.id != line_id);
        Ok(())
    }
}

impl WishlistApi for FakeGateway {
    async fn fetch_wishlist(&self, _identity: &Identity) -> Result<Vec<WishlistEntry>, ApiError> {
        let ids = self.state.wishlist.lock().unwrap().clone();
        ids.into_iter()
            .map(|product_id| {
                let seed = self.seed_for(&product_id)?;
                Ok(WishlistEntry {
                    product_id,
                    name: seed.name,
                    price: seed.price,
                    images: vec![],
                    in_stock: true,
                })
            })
            .collect()
    }

    async fn add_entry(
        &self,
        _identity: &Identity,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        self.seed_for(product_id)?;
        self.state.wishlist.lock().unwrap().insert(product_id.clone());
        Ok(())
    }

    async fn remove_entry(
        &self,
        _identity: &Identity,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        self.state.wishlist.lock().unwrap().remove(product_id);
        Ok(())
    }
}

impl AddressApi for FakeGateway {
    async fn list_addresses(&self, _identity: &Identity) -> Result<Vec<Address>, ApiError> {
        Ok(self.state.addresses.lock().unwrap().clone())
    }

    async fn create_address(
        &self,
        _identity: &Identity,
        input: &AddressInput,
    ) -> Result<Address, ApiError> {
        let address = self.materialize_address(self.next_id("addr"), input);
        let mut addresses = self.state.addresses.lock().unwrap();
        addresses.push(address.clone());
        if input.is_default {
            demote_others(&mut addresses, &address.id);
        }
        Ok(address)
    }

    async fn update_address(
        &self,
        _identity: &Identity,
        address_id: &AddressId,
        input: &AddressInput,
    ) -> Result<Address, ApiError> {
        let updated = self.materialize_address(address_id.to_string(), input);
        let mut addresses = self.state.addresses.lock().unwrap();
        let slot = addresses
            .iter_mut()
            .find(|a| &a.id == address_id)
            .ok_or_else(|| ApiError::NotFound(format!("no such address: {address_id}")))?;
        *slot = updated.clone();
        if input.is_default {
            demote_others(&mut addresses, address_id);
        }
        Ok(updated)
    }

    async fn delete_address(
        &self,
        _identity: &Identity,
        address_id: &AddressId,
    ) -> Result<(), ApiError> {
        self.state
            .addresses
            .lock()
            .unwrap()
            .retain(|a| &a.id != address_id);
        Ok(())
    }
}

impl OrderApi for FakeGateway {
    async fn create_order(
        &self,
        identity: &Identity,
        draft: &OrderDraft,
        idempotency_key: Uuid,
    ) -> Result<Order, ApiError> {
        if self.state.fail_order_creation.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 503,
                message: "injected order failure".to_string(),
            });
        }

        // A repeated submission with the same key returns the existing order
        if let Some(order_id) = self.state.idempotency.lock().unwrap().get(&idempotency_key) {
            let order_id = order_id.clone();
            return self.fetch_order(identity, &order_id).await;
        }

        let address = self
            .state
            .addresses
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == draft.address_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("no such address: {}", draft.address_id)))?;

        let id = OrderId::new(self.next_id("ord"));
        let order = Order {
            id: id.clone(),
            code: format!("AJ-2026-{:04}", self.order_count()),
            status_history: vec![OrderStatusEntry {
                status: OrderStatus::Placed,
                at: chrono::Utc::now(),
            }],
            lines: draft.lines.clone(),
            address,
            payment: OrderPayment {
                payment_id: None,
                amount: draft.total,
            },
        };

        self.state.orders.lock().unwrap().push(order.clone());
        self.state
            .idempotency
            .lock()
            .unwrap()
            .insert(idempotency_key, id);
        Ok(order)
    }

    async fn fetch_order(
        &self,
        _identity: &Identity,
        order_id: &OrderId,
    ) -> Result<Order, ApiError> {
        self.state
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|order| &order.id == order_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("no such order: {order_id}")))
    }
}

fn demote_others(addresses: &mut [Address], keep: &AddressId) {
    for address in addresses.iter_mut() {
        if &address.id != keep {
            address.is_default = false;
        }
    }
}

// =============================================================================
// Payment, notifier, and navigator doubles
// =============================================================================

#[derive(Default)]
struct PaymentsState {
    outcomes: Mutex<VecDeque<PaymentOutcome>>,
    requests: Mutex<Vec<PaymentRequest>>,
}

/// Payment provider that replays scripted outcomes.
///
/// With nothing scripted, every collection succeeds with a generated
/// payment id for the order being paid.
#[derive(Clone, Default)]
pub struct ScriptedPayments {
    state: Arc<PaymentsState>,
}

impl ScriptedPayments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome for the next collection.
    pub fn script(&self, outcome: PaymentOutcome) {
        self.state.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Every payment request the provider has seen.
    #[must_use]
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl PaymentProvider for ScriptedPayments {
    async fn collect(&self, request: &PaymentRequest) -> PaymentOutcome {
        self.state.requests.lock().unwrap().push(request.clone());
        self.state
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PaymentOutcome::Success {
                payment_id: format!("pay_{}", request.reference),
                order_id: request.order_id.clone(),
            })
    }
}

/// Records every notice shown to the user.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }

    /// Whether any error-level notice was shown.
    #[must_use]
    pub fn saw_error(&self) -> bool {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .any(|(level, _)| *level == NoticeLevel::Error)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

/// Records navigation requests.
#[derive(Default)]
pub struct RecordingNavigator {
    cart_opens: AtomicUsize,
    confirmations: Mutex<Vec<OrderId>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cart_opens(&self) -> usize {
        self.cart_opens.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn confirmations(&self) -> Vec<OrderId> {
        self.confirmations.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn to_cart(&self) {
        self.cart_opens.fetch_add(1, Ordering::SeqCst);
    }

    fn to_order_confirmation(&self, order_id: &OrderId) {
        self.confirmations.lock().unwrap().push(order_id.clone());
    }
}
