//! Typed access to the storefront backend.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shop_data::{FetchClient, Response};

use crate::catalog::{Accessory, Listing, Page, Product};
use crate::checkout::{BuyNowRequest, CartCheckoutRequest, SessionDetails};
use crate::error::CommerceError;
use crate::ids::{CheckoutSessionId, ProductId};

/// Backend host used when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

const PRODUCTS: &str = "/myapp/api/products/";
const ACCESSORIES: &str = "/myapp/api/accessories/";
const BUY_NOW_SESSION: &str = "/myapp/api/create-buy-now-session/";
const CART_SESSION: &str = "/myapp/create-checkout-session/";
const SESSION_DETAILS: &str = "/myapp/get-session-details/";
const COMMIT_RESERVATION: &str = "/myapp/inventory/commit/";
const RELEASE_RESERVATION: &str = "/myapp/api/release-checkout-reservation/";

#[derive(Serialize)]
struct SessionRef<'a> {
    session_id: &'a CheckoutSessionId,
}

/// Client for the backend's catalog, checkout and inventory endpoints.
#[derive(Debug, Clone)]
pub struct BackendApi {
    client: FetchClient,
}

impl BackendApi {
    /// API over a prepared client. The client should carry the backend base URL.
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// API over the default transport for `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::new(FetchClient::new().with_base_url(base_url))
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    /// One page of products, optionally filtered by brand.
    pub async fn list_products(
        &self,
        brand: Option<&str>,
        page: Option<u32>,
    ) -> Result<Page<Product>, CommerceError> {
        let mut req = self.client.get(PRODUCTS);
        if let Some(brand) = brand {
            req = req.query("brand", brand);
        }
        if let Some(page) = page {
            req = req.query("page", page);
        }
        match parse::<Listing<Product>>(req.send().await?)? {
            Listing::Paged(page) => Ok(page),
            Listing::Plain(results) => Ok(Page {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            }),
        }
    }

    pub async fn product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        let resp = self.client.get(format!("{}{}/", PRODUCTS, id)).send().await?;
        not_found_as(resp, || CommerceError::ProductNotFound(id.to_string()))
    }

    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, CommerceError> {
        let resp = self
            .client
            .get(format!("{}by-slug/{}/", PRODUCTS, slug))
            .send()
            .await?;
        not_found_as(resp, || CommerceError::ProductNotFound(slug.to_string()))
    }

    /// Look a product up by numeric id or, failing that form, by slug.
    pub async fn lookup_product(&self, id_or_slug: &str) -> Result<Product, CommerceError> {
        let id = ProductId::new(id_or_slug);
        if id.is_numeric() {
            self.product(&id).await
        } else {
            self.product_by_slug(id_or_slug).await
        }
    }

    pub async fn list_accessories(&self) -> Result<Vec<Accessory>, CommerceError> {
        let resp = self.client.get(ACCESSORIES).send().await?;
        Ok(parse::<Listing<Accessory>>(resp)?.into_vec())
    }

    pub async fn accessory(&self, slug: &str) -> Result<Accessory, CommerceError> {
        let resp = self
            .client
            .get(format!("{}{}/", ACCESSORIES, slug))
            .send()
            .await?;
        not_found_as(resp, || CommerceError::ProductNotFound(slug.to_string()))
    }

    /// Start a hosted checkout for a single variant.
    ///
    /// The raw response is returned so the caller can word its own failure.
    pub async fn create_buy_now_session(&self, body: &BuyNowRequest) -> Result<Response, CommerceError> {
        Ok(self.client.post(BUY_NOW_SESSION).json(body)?.send().await?)
    }

    /// Start a hosted checkout for a whole cart.
    pub async fn create_cart_session(
        &self,
        body: &CartCheckoutRequest,
    ) -> Result<Response, CommerceError> {
        Ok(self.client.post(CART_SESSION).json(body)?.send().await?)
    }

    pub async fn session_details(
        &self,
        session_id: &CheckoutSessionId,
    ) -> Result<SessionDetails, CommerceError> {
        let resp = self
            .client
            .get(SESSION_DETAILS)
            .query("session_id", session_id)
            .send()
            .await?;
        parse(resp)
    }

    /// Mark the session's reservation as fulfilled. Idempotent on the backend.
    pub async fn commit_reservation(&self, session_id: &CheckoutSessionId) -> Result<(), CommerceError> {
        self.post_session(COMMIT_RESERVATION, session_id).await
    }

    /// Return the session's reserved stock. Idempotent on the backend.
    pub async fn release_reservation(
        &self,
        session_id: &CheckoutSessionId,
    ) -> Result<(), CommerceError> {
        self.post_session(RELEASE_RESERVATION, session_id).await
    }

    async fn post_session(&self, path: &str, session_id: &CheckoutSessionId) -> Result<(), CommerceError> {
        self.client
            .post(path)
            .json(&SessionRef { session_id })?
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, CommerceError> {
    Ok(resp.error_for_status()?.json()?)
}

fn not_found_as<T: DeserializeOwned>(
    resp: Response,
    err: impl FnOnce() -> CommerceError,
) -> Result<T, CommerceError> {
    if resp.status == 404 {
        return Err(err());
    }
    parse(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shop_data::{Method, MockTransport};

    fn api() -> (MockTransport, BackendApi) {
        let mock = MockTransport::new();
        let client = FetchClient::with_transport(mock.clone()).with_base_url(DEFAULT_BACKEND_URL);
        (mock, BackendApi::new(client))
    }

    fn product_json(id: i64, slug: &str) -> serde_json::Value {
        json!({
            "id": id, "name": "Phone", "slug": slug, "base_price": "499.00",
            "variants": [{"id": 1, "color": "Black", "storage": "128GB", "price": "499.00",
                          "count_in_stock": 3, "reserved_stock": 0}]
        })
    }

    #[tokio::test]
    async fn test_list_products_with_filters() {
        let (mock, api) = api();
        mock.on_json(
            Method::Get,
            PRODUCTS,
            200,
            &json!({"count": 1, "next": null, "previous": null, "results": [product_json(4, "p4")]}),
        );

        let page = api.list_products(Some("Apple"), Some(2)).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].id.as_str(), "4");

        let seen = mock.requests();
        let req = &seen[0];
        assert_eq!(req.query_param("brand"), Some("Apple"));
        assert_eq!(req.query_param("page"), Some("2"));
    }

    #[tokio::test]
    async fn test_lookup_numeric_goes_by_id() {
        let (mock, api) = api();
        mock.on_json(Method::Get, "/myapp/api/products/12/", 200, &product_json(12, "twelve"));

        let product = api.lookup_product("12").await.unwrap();
        assert_eq!(product.handle(), "twelve");
    }

    #[tokio::test]
    async fn test_lookup_slug_goes_by_slug() {
        let (mock, api) = api();
        mock.on_json(
            Method::Get,
            "/myapp/api/products/by-slug/pixel-8/",
            200,
            &product_json(7, "pixel-8"),
        );

        let product = api.lookup_product("pixel-8").await.unwrap();
        assert_eq!(product.id.as_str(), "7");
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let (_, api) = api();
        let err = api.lookup_product("nope").await.unwrap_err();
        assert!(matches!(err, CommerceError::ProductNotFound(ref s) if s == "nope"));
    }

    #[tokio::test]
    async fn test_accessories_plain_list() {
        let (mock, api) = api();
        mock.on_json(
            Method::Get,
            ACCESSORIES,
            200,
            &json!([{"id": 1, "name": "Case", "price": "19.99"}]),
        );
        assert_eq!(api.list_accessories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_details_query() {
        let (mock, api) = api();
        mock.on_json(
            Method::Get,
            SESSION_DETAILS,
            200,
            &json!({"id": "cs_1", "payment_status": "paid", "amount_total": 1000}),
        );

        let details = api.session_details(&CheckoutSessionId::new("cs_1")).await.unwrap();
        assert!(details.is_paid());
        assert_eq!(mock.requests()[0].query_param("session_id"), Some("cs_1"));
    }

    #[tokio::test]
    async fn test_commit_and_release_bodies() {
        let (mock, api) = api();
        mock.on_json(Method::Post, COMMIT_RESERVATION, 200, &json!({"ok": true}));
        mock.on_json(Method::Post, RELEASE_RESERVATION, 200, &json!({"ok": true}));
        let id = CheckoutSessionId::new("cs_9");

        api.commit_reservation(&id).await.unwrap();
        api.release_reservation(&id).await.unwrap();

        let commits = mock.requests_to(Method::Post, COMMIT_RESERVATION);
        let body: serde_json::Value = commits[0].json().unwrap();
        assert_eq!(body, json!({"session_id": "cs_9"}));
        assert_eq!(mock.requests_to(Method::Post, RELEASE_RESERVATION).len(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_message_surfaces() {
        let (mock, api) = api();
        mock.on_json(
            Method::Post,
            RELEASE_RESERVATION,
            500,
            &json!({"error": "reservation table locked"}),
        );

        let err = api
            .release_reservation(&CheckoutSessionId::new("cs_1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reservation table locked"));
    }
}
