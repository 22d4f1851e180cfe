//! End-to-end checkout journeys against the in-memory gateway.

use std::sync::Arc;
use std::time::Duration;

use auric_client::checkout::CheckoutSession;
use auric_client::debounce::TapGuard;
use auric_client::stores::{AddressBook, CartStore};
use auric_client::{NoticeLevel, Session, StoreError};
use auric_core::checkout::CheckoutState;
use auric_core::pricing::PricingRules;
use auric_core::{OrderId, PaymentOutcome, ProductId};
use auric_integration_tests::{
    FakeGateway, RecordingNavigator, RecordingNotifier, ScriptedPayments, address_input, coupon,
    init_test_tracing, inr, signed_in_session,
};

struct Harness {
    gateway: FakeGateway,
    payments: ScriptedPayments,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
    cart: CartStore<FakeGateway>,
    addresses: AddressBook<FakeGateway>,
    checkout: CheckoutSession<FakeGateway, ScriptedPayments>,
}

fn harness(session: Session) -> Harness {
    init_test_tracing();
    let gateway = FakeGateway::new();
    let payments = ScriptedPayments::new();
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::new());

    gateway.seed_product(&ProductId::new("prod_ring"), "Gold Ring", inr(750), "rings");
    gateway.seed_product(
        &ProductId::new("prod_anklet"),
        "Silver Anklet",
        inr(250),
        "anklets",
    );

    let cart = CartStore::new(
        gateway.clone(),
        session.clone(),
        notifier.clone(),
        navigator.clone(),
        Duration::ZERO,
    );
    let addresses = AddressBook::new(gateway.clone(), session.clone(), notifier.clone());
    let checkout = CheckoutSession::new(
        gateway.clone(),
        payments.clone(),
        session,
        notifier.clone(),
        navigator.clone(),
        TapGuard::new(Duration::from_millis(100)),
        PricingRules::default(),
        Duration::ZERO,
    );

    Harness {
        gateway,
        payments,
        notifier,
        navigator,
        cart,
        addresses,
        checkout,
    }
}

#[tokio::test]
async fn test_full_journey_cart_coupon_payment_confirmation() {
    let h = harness(signed_in_session());

    h.cart
        .add_item(&ProductId::new("prod_ring"), 1, false)
        .await
        .unwrap();
    h.cart
        .add_item(&ProductId::new("prod_anklet"), 2, false)
        .await
        .unwrap();
    assert_eq!(h.cart.count(), 3);

    let address = h.addresses.create(&address_input("Priya", true)).await.unwrap();

    let cart = h.cart.snapshot();
    h.checkout
        .apply_coupon(coupon("FESTIVE100", 100, 1000), &cart)
        .unwrap();

    // 750 + 500 = 1250 subtotal, free shipping, minus 100 coupon
    let draft = h.checkout.draft(&cart, &address).unwrap();
    assert_eq!(draft.subtotal, inr(1250));
    assert!(draft.shipping_charges.is_zero());
    assert_eq!(draft.total, inr(1150));

    h.checkout.place_order(&cart, Some(&address)).await.unwrap();

    let CheckoutState::Success { order_id } = h.checkout.state() else {
        panic!("expected success, got {:?}", h.checkout.state());
    };
    assert_eq!(h.gateway.order_count(), 1);
    assert_eq!(h.navigator.confirmations(), vec![order_id]);

    // The provider was asked to charge the discounted total
    let requests = h.payments.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, inr(1150));
    assert_eq!(requests[0].customer_phone, "9876543210");

    assert!(h
        .notifier
        .notices()
        .iter()
        .any(|(level, message)| *level == NoticeLevel::Success && message.contains("Order placed")));
}

#[tokio::test]
async fn test_shipping_fee_charged_below_threshold() {
    let h = harness(signed_in_session());

    h.cart
        .add_item(&ProductId::new("prod_anklet"), 1, false)
        .await
        .unwrap();
    let address = h.addresses.create(&address_input("Priya", true)).await.unwrap();

    let draft = h.checkout.draft(&h.cart.snapshot(), &address).unwrap();
    assert_eq!(draft.subtotal, inr(250));
    assert_eq!(draft.shipping_charges, inr(30));
    assert_eq!(draft.total, inr(280));
}

#[tokio::test]
async fn test_failed_payment_retry_then_success() {
    let h = harness(signed_in_session());

    h.cart
        .add_item(&ProductId::new("prod_ring"), 1, false)
        .await
        .unwrap();
    let address = h.addresses.create(&address_input("Priya", true)).await.unwrap();
    let cart = h.cart.snapshot();

    h.payments.script(PaymentOutcome::Failure {
        message: "card declined".to_string(),
        order_id: None,
    });

    h.checkout.place_order(&cart, Some(&address)).await.unwrap();
    assert!(matches!(h.checkout.state(), CheckoutState::Failed { .. }));
    assert!(h.checkout.state().can_retry());
    assert!(h.notifier.saw_error());

    // Retry only resets; no order is submitted until the user confirms
    h.checkout.retry().unwrap();
    assert_eq!(h.checkout.state(), CheckoutState::Idle);
    assert_eq!(h.payments.requests().len(), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;
    h.checkout.place_order(&cart, Some(&address)).await.unwrap();
    assert!(matches!(h.checkout.state(), CheckoutState::Success { .. }));
    assert_eq!(h.payments.requests().len(), 2);
}

#[tokio::test]
async fn test_cancelled_payment_keeps_unpaid_order_reference() {
    let h = harness(signed_in_session());

    h.cart
        .add_item(&ProductId::new("prod_ring"), 1, false)
        .await
        .unwrap();
    let address = h.addresses.create(&address_input("Priya", true)).await.unwrap();
    let cart = h.cart.snapshot();

    h.payments.script(PaymentOutcome::Cancelled {
        order_id: Some(OrderId::new("ord_0")),
    });

    h.checkout.place_order(&cart, Some(&address)).await.unwrap();

    // The order exists server-side unpaid and the state remembers it
    assert_eq!(
        h.checkout.state(),
        CheckoutState::Cancelled {
            order_id: Some(OrderId::new("ord_0"))
        }
    );
    assert_eq!(h.gateway.order_count(), 1);
    assert!(h.navigator.confirmations().is_empty());
}

#[tokio::test]
async fn test_order_submission_failure_is_retryable() {
    let h = harness(signed_in_session());

    h.cart
        .add_item(&ProductId::new("prod_ring"), 1, false)
        .await
        .unwrap();
    let address = h.addresses.create(&address_input("Priya", true)).await.unwrap();
    let cart = h.cart.snapshot();

    h.gateway.fail_order_creation(true);
    let err = h
        .checkout
        .place_order(&cart, Some(&address))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Api(_)));
    assert!(matches!(h.checkout.state(), CheckoutState::Failed { .. }));
    assert!(h.payments.requests().is_empty());

    h.gateway.fail_order_creation(false);
    h.checkout.retry().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    h.checkout.place_order(&cart, Some(&address)).await.unwrap();
    assert!(matches!(h.checkout.state(), CheckoutState::Success { .. }));
}

#[tokio::test]
async fn test_checkout_requires_signed_in_user_and_address() {
    let signed_out = harness(Session::new());
    signed_out
        .gateway
        .seed_address(&address_input("Priya", true));

    let err = signed_out
        .checkout
        .place_order(&auric_core::CartSnapshot::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AuthRequired));

    let h = harness(signed_in_session());
    h.cart
        .add_item(&ProductId::new("prod_ring"), 1, false)
        .await
        .unwrap();
    let err = h
        .checkout
        .place_order(&h.cart.snapshot(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AddressRequired));
    assert_eq!(h.checkout.state(), CheckoutState::Idle);
    assert_eq!(h.gateway.order_count(), 0);
}

#[tokio::test]
async fn test_lapsed_coupon_blocks_submission_before_processing() {
    let h = harness(signed_in_session());

    h.cart
        .add_item(&ProductId::new("prod_ring"), 2, false)
        .await
        .unwrap();
    let address = h.addresses.create(&address_input("Priya", true)).await.unwrap();

    // Eligible at 1500, then the cart shrinks below the minimum
    h.checkout
        .apply_coupon(coupon("FESTIVE100", 100, 1000), &h.cart.snapshot())
        .unwrap();
    let line_id = h.cart.snapshot().lines[0].id.clone();
    h.cart.update_quantity(&line_id, 1).await.unwrap();

    let cart = h.cart.snapshot();
    let err = h
        .checkout
        .place_order(&cart, Some(&address))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Pricing(_)));
    assert_eq!(h.checkout.state(), CheckoutState::Idle);
    assert_eq!(h.gateway.order_count(), 0);
}
