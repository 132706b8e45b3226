//! Starting a hosted checkout.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use shop_cache::{Cache, Slot};
use shop_data::Response;

use crate::backend::BackendApi;
use crate::cart::CartStore;
use crate::checkout::{
    session_token, BuyNowRequest, CartCheckoutRequest, CheckoutItem, CheckoutRedirect, ReturnUrls,
    SessionState,
};
use crate::error::CommerceError;
use crate::ids::{CheckoutSessionId, VariantId};

/// Where the shopper is sent once a session exists.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// Navigator that only remembers the URLs it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visited: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        match self.visited.lock() {
            Ok(v) => v.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<String> {
        self.visited().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        let mut visited = match self.visited.lock() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        visited.push(url.to_string());
    }
}

/// A session that was created and navigated to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckoutStarted {
    pub session_id: Option<CheckoutSessionId>,
    pub url: String,
    pub state: SessionState,
}

/// Creates hosted checkout sessions for the cart or a single variant.
///
/// On success the session token is stored and the navigator is sent to the
/// hosted page. On any failure nothing is stored, nothing is navigated to,
/// and nothing is retried.
pub struct CheckoutInitiator {
    api: BackendApi,
    cart: CartStore,
    token: Slot<CheckoutSessionId>,
    urls: ReturnUrls,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for CheckoutInitiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutInitiator")
            .field("api", &self.api)
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl CheckoutInitiator {
    pub fn new(
        api: BackendApi,
        cache: &Cache,
        urls: ReturnUrls,
        navigator: impl Navigator + 'static,
    ) -> Self {
        Self {
            api,
            cart: CartStore::new(cache),
            token: session_token(cache),
            urls,
            navigator: Arc::new(navigator),
        }
    }

    pub fn return_urls(&self) -> &ReturnUrls {
        &self.urls
    }

    /// Check out every cart line.
    ///
    /// Refuses an empty cart, and a cart holding lines without a variant.
    pub async fn checkout_cart(&self) -> Result<CheckoutStarted, CommerceError> {
        let lines = self.cart.load()?;
        if lines.is_empty() {
            return Err(CommerceError::EmptyCart);
        }

        let missing: Vec<String> = lines
            .iter()
            .filter(|l| l.variant_id.is_none())
            .map(|l| l.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(CommerceError::MissingVariant(missing));
        }

        let items = lines
            .into_iter()
            .filter_map(|l| {
                l.variant_id.map(|variant_id| CheckoutItem {
                    variant_id,
                    quantity: l.quantity,
                })
            })
            .collect();
        let request = CartCheckoutRequest {
            items,
            success_url: self.urls.success.clone(),
            cancel_url: self.urls.cancel.clone(),
        };

        tracing::info!(lines = request.items.len(), "creating cart checkout session");
        let resp = self.api.create_cart_session(&request).await?;
        self.redirect(resp)
    }

    /// Check out one variant without touching the cart.
    pub async fn buy_now(
        &self,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<CheckoutStarted, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::InvalidQuantity(0));
        }
        self.create_session(BuyNowRequest {
            variant_id,
            quantity,
            success_url: self.urls.success.clone(),
            cancel_url: self.urls.cancel.clone(),
        })
        .await
    }

    /// Create a single-variant session with explicit return URLs.
    pub async fn create_session(
        &self,
        request: BuyNowRequest,
    ) -> Result<CheckoutStarted, CommerceError> {
        tracing::info!(variant = %request.variant_id, quantity = request.quantity, "creating buy-now session");
        let resp = self.api.create_buy_now_session(&request).await?;
        self.redirect(resp)
    }

    fn redirect(&self, resp: Response) -> Result<CheckoutStarted, CommerceError> {
        if !resp.is_success() {
            let message = format!("{} {}", resp.status, resp.error_message());
            tracing::warn!(status = resp.status, %message, "checkout session refused");
            return Err(CommerceError::CheckoutFailed(message));
        }

        let redirect: CheckoutRedirect = resp.json()?;
        let url = redirect
            .url
            .filter(|u| !u.is_empty())
            .ok_or(CommerceError::MissingCheckoutUrl)?;

        if let Some(id) = &redirect.id {
            self.token.set(id)?;
        }
        let state = SessionState::Created.transition(SessionState::Redirected)?;

        tracing::info!(session = ?redirect.id, %url, "redirecting to hosted checkout");
        self.navigator.navigate(&url);

        Ok(CheckoutStarted {
            session_id: redirect.id,
            url,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartLineItem, DEFAULT_OPTION};
    use crate::ids::ProductId;
    use crate::money::{Currency, Money};
    use serde_json::json;
    use shop_data::{FetchClient, Method, MockTransport};

    const CART_SESSION: &str = "/myapp/create-checkout-session/";
    const BUY_NOW: &str = "/myapp/api/create-buy-now-session/";

    struct Harness {
        mock: MockTransport,
        cache: Cache,
        nav: RecordingNavigator,
        initiator: CheckoutInitiator,
    }

    fn harness() -> Harness {
        let mock = MockTransport::new();
        let cache = Cache::in_memory();
        let nav = RecordingNavigator::new();
        let api = BackendApi::new(FetchClient::with_transport(mock.clone()).with_base_url("http://api"));
        let initiator = CheckoutInitiator::new(
            api,
            &cache,
            ReturnUrls::for_origin("http://shop"),
            nav.clone(),
        );
        Harness {
            mock,
            cache,
            nav,
            initiator,
        }
    }

    fn phone_line(qty: u32) -> CartLineItem {
        CartLineItem::new(
            ProductId::new("P1"),
            Some(VariantId::new("11")),
            "Phone One",
            Money::new(99900, Currency::USD),
            qty,
            "Black",
            "128GB",
        )
    }

    #[tokio::test]
    async fn test_cart_checkout_stores_token_and_navigates() {
        let h = harness();
        CartStore::new(&h.cache).add(phone_line(2)).unwrap();
        h.mock.on_json(
            Method::Post,
            CART_SESSION,
            200,
            &json!({"id": "cs_1", "url": "https://pay/cs_1"}),
        );

        let started = h.initiator.checkout_cart().await.unwrap();

        assert_eq!(started.url, "https://pay/cs_1");
        assert_eq!(started.state, SessionState::Redirected);
        assert_eq!(h.nav.visited(), vec!["https://pay/cs_1".to_string()]);
        assert_eq!(
            session_token(&h.cache).get().unwrap(),
            Some(CheckoutSessionId::new("cs_1"))
        );

        let sent = h.mock.requests_to(Method::Post, CART_SESSION);
        let body: serde_json::Value = sent[0].json().unwrap();
        assert_eq!(body["items"], json!([{"variant_id": "11", "quantity": 2}]));
        assert!(body["success_url"]
            .as_str()
            .unwrap()
            .ends_with("session_id={CHECKOUT_SESSION_ID}"));
    }

    #[tokio::test]
    async fn test_empty_cart_refused() {
        let h = harness();
        let err = h.initiator.checkout_cart().await.unwrap_err();
        assert!(matches!(err, CommerceError::EmptyCart));
        assert!(h.mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_line_without_variant_refused() {
        let h = harness();
        let store = CartStore::new(&h.cache);
        store.add(phone_line(1)).unwrap();
        store
            .add(CartLineItem::new(
                ProductId::new("A1"),
                None,
                "Charger",
                Money::new(2500, Currency::USD),
                1,
                DEFAULT_OPTION,
                DEFAULT_OPTION,
            ))
            .unwrap();

        let err = h.initiator.checkout_cart().await.unwrap_err();
        assert!(matches!(err, CommerceError::MissingVariant(ref names) if names == &["Charger"]));
        assert!(h.mock.requests().is_empty());
        assert!(h.nav.visited().is_empty());
    }

    #[tokio::test]
    async fn test_backend_refusal_does_not_navigate() {
        let h = harness();
        h.mock.on_json(Method::Post, BUY_NOW, 409, &json!({"error": "Insufficient stock"}));

        let err = h
            .initiator
            .buy_now(VariantId::new("11"), 3)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to create checkout session: 409 Insufficient stock"
        );
        assert!(h.nav.visited().is_empty());
        assert!(session_token(&h.cache).get().unwrap().is_none());
        // Not retried
        assert_eq!(h.mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_url_is_an_error() {
        let h = harness();
        h.mock.on_json(Method::Post, BUY_NOW, 200, &json!({"id": "cs_2"}));

        let err = h
            .initiator
            .buy_now(VariantId::new("11"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::MissingCheckoutUrl));
        assert!(h.nav.visited().is_empty());
        assert!(session_token(&h.cache).get().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_buy_now_sends_single_pair() {
        let h = harness();
        h.mock.on_json(
            Method::Post,
            BUY_NOW,
            200,
            &json!({"id": "cs_3", "url": "https://pay/cs_3"}),
        );

        h.initiator.buy_now(VariantId::new("42"), 2).await.unwrap();

        let sent = h.mock.requests_to(Method::Post, BUY_NOW);
        let body: BuyNowRequest = sent[0].json().unwrap();
        assert_eq!(body.variant_id.as_str(), "42");
        assert_eq!(body.quantity, 2);
        assert_eq!(body.cancel_url, h.initiator.return_urls().cancel);
        // Cart untouched
        assert!(CartStore::new(&h.cache).load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let h = harness();
        h.mock.fail(Method::Post, BUY_NOW, "connection refused");

        let err = h
            .initiator
            .buy_now(VariantId::new("1"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Backend(_)));
        assert!(h.nav.last().is_none());
    }
}
