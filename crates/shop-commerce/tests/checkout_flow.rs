//! Cart to hosted checkout to return page, against a file-backed store.

use serde_json::json;
use shop_commerce::cart::CART_KEY;
use shop_commerce::checkout::{session_token, SESSION_TOKEN_KEY};
use shop_commerce::prelude::*;
use shop_data::{FetchClient, Method, MockTransport};

const CART_SESSION: &str = "/myapp/create-checkout-session/";
const DETAILS: &str = "/myapp/get-session-details/";
const COMMIT: &str = "/myapp/inventory/commit/";
const RELEASE: &str = "/myapp/api/release-checkout-reservation/";

fn api(mock: &MockTransport) -> BackendApi {
    BackendApi::new(FetchClient::with_transport(mock.clone()).with_base_url(DEFAULT_BACKEND_URL))
}

fn p1_black() -> CartLineItem {
    CartLineItem::new(
        ProductId::new("P1"),
        Some(VariantId::new("101")),
        "Phone One",
        Money::new(99900, Currency::USD),
        1,
        "Black",
        "128GB",
    )
}

#[tokio::test]
async fn test_cart_checkout_then_success() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::open_dir(dir.path()).unwrap();
    let mock = MockTransport::new();
    let nav = RecordingNavigator::new();

    CartStore::new(&cache).add(p1_black()).unwrap();

    mock.on_json(
        Method::Post,
        CART_SESSION,
        200,
        &json!({"id": "cs_1", "url": "https://pay/cs_1"}),
    );
    let initiator = CheckoutInitiator::new(
        api(&mock),
        &cache,
        ReturnUrls::for_origin("http://localhost:3000"),
        nav.clone(),
    );
    let started = initiator.checkout_cart().await.unwrap();
    assert_eq!(nav.last().as_deref(), Some("https://pay/cs_1"));
    assert_eq!(started.session_id, Some(CheckoutSessionId::new("cs_1")));

    // The store survives a reopen, as a browser's local storage would
    let reopened = Cache::open_dir(dir.path()).unwrap();
    assert!(reopened.exists(SESSION_TOKEN_KEY).unwrap());
    assert!(reopened.exists(CART_KEY).unwrap());

    mock.on_json(
        Method::Get,
        DETAILS,
        200,
        &json!({"id": "cs_1", "status": "complete", "payment_status": "paid",
                "amount_total": 99900, "currency": "usd",
                "line_items": [{"price_id": "price_p1", "quantity": 1, "amount_total": 99900,
                                "description": "Phone One"}]}),
    );
    mock.on_json(Method::Post, COMMIT, 200, &json!({"success": true}));

    let outcome = Reconciler::new(api(&mock), &reopened)
        .success(Some("cs_1"))
        .await
        .unwrap();

    let SuccessOutcome::Completed { summary, commit, .. } = outcome else {
        panic!("expected a completed outcome");
    };
    assert_eq!(summary.total.display_amount(), "999.00");
    assert_eq!(summary.status, "Confirmed");
    assert_eq!(commit, CommitOutcome::Committed);

    let commits = mock.requests_to(Method::Post, COMMIT);
    assert_eq!(commits.len(), 1);
    let body: serde_json::Value = commits[0].json().unwrap();
    assert_eq!(body["session_id"], "cs_1");

    assert!(CartStore::new(&reopened).load().unwrap().is_empty());
    assert!(session_token(&reopened).get().unwrap().is_none());
}

#[tokio::test]
async fn test_cancel_after_processor_strips_session_id() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::open_dir(dir.path()).unwrap();
    let mock = MockTransport::new();

    CartStore::new(&cache).add(p1_black()).unwrap();
    mock.on_json(
        Method::Post,
        CART_SESSION,
        200,
        &json!({"id": "cs_5", "url": "https://pay/cs_5"}),
    );
    mock.on_json(Method::Post, RELEASE, 200, &json!({"success": true}));

    CheckoutInitiator::new(
        api(&mock),
        &cache,
        ReturnUrls::for_origin("http://localhost:3000"),
        RecordingNavigator::new(),
    )
    .checkout_cart()
    .await
    .unwrap();

    let reconciler = Reconciler::new(api(&mock), &cache);
    let first = reconciler
        .cancel(Some("{CHECKOUT_SESSION_ID}"))
        .await
        .unwrap();
    assert_eq!(first.session_id().map(|s| s.as_str()), Some("cs_5"));
    assert_eq!(
        first.message(),
        "Your checkout has been canceled and items have been returned to inventory."
    );

    let again = reconciler.cancel(None).await.unwrap();
    assert_eq!(again, CancelOutcome::NoSession);

    let releases = mock.requests_to(Method::Post, RELEASE);
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].json::<serde_json::Value>().unwrap()["session_id"], "cs_5");

    // Cancelling the payment leaves the cart for another try
    assert_eq!(CartStore::new(&cache).load().unwrap().len(), 1);
}
