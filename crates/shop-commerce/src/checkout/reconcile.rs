//! Landing points for shoppers returning from the hosted checkout.

use serde::Serialize;
use shop_cache::{Cache, Slot};

use crate::backend::BackendApi;
use crate::cart::{summarize, CartLineItem, CartStore};
use crate::checkout::{session_token, SessionDetails, SessionState, SESSION_ID_PLACEHOLDER};
use crate::error::CommerceError;
use crate::ids::CheckoutSessionId;
use crate::money::Money;

pub const STATUS_CONFIRMED: &str = "Confirmed";
pub const STATUS_PENDING: &str = "Pending";

pub const CANCELED_MESSAGE: &str = "Your checkout has been canceled.";
pub const RELEASED_MESSAGE: &str =
    "Your checkout has been canceled and items have been returned to inventory.";
pub const RELEASE_FAILED_MESSAGE: &str =
    "Your checkout has been canceled, but there was an issue updating inventory.";

/// Where an order summary's figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Backend,
    /// Session details were unavailable; built from the cart as it was
    /// before it was cleared.
    CartSnapshot,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub amount: Option<Money>,
}

/// What the success page shows.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderSummary {
    pub session_id: CheckoutSessionId,
    pub status: String,
    pub total: Money,
    pub items: Vec<OrderItem>,
    pub customer_email: Option<String>,
    pub shipping_name: Option<String>,
    pub shipping_address: Option<String>,
    pub source: SummarySource,
}

impl OrderSummary {
    fn from_details(details: &SessionDetails) -> Self {
        let currency = details.currency();
        let items: Vec<OrderItem> = details
            .line_items
            .iter()
            .map(|li| OrderItem {
                name: li.description.clone().unwrap_or_else(|| "Item".to_string()),
                quantity: li.quantity,
                amount: li.amount_total.map(|cents| Money::new(cents, currency)),
            })
            .collect();
        let total = details.total().unwrap_or_else(|| {
            let cents = items
                .iter()
                .filter_map(|i| i.amount.map(|m| m.amount_cents))
                .fold(0_i64, i64::saturating_add);
            Money::new(cents, currency)
        });
        let shipping = details.shipping.as_ref();

        Self {
            session_id: details.id.clone(),
            status: if details.is_paid() {
                STATUS_CONFIRMED
            } else {
                STATUS_PENDING
            }
            .to_string(),
            total,
            items,
            customer_email: details.customer_email.clone(),
            shipping_name: shipping.and_then(|s| s.name.clone()),
            shipping_address: shipping
                .and_then(|s| s.address.as_ref())
                .map(|a| a.one_line())
                .filter(|a| !a.is_empty()),
            source: SummarySource::Backend,
        }
    }

    fn from_snapshot(
        session_id: CheckoutSessionId,
        lines: Vec<CartLineItem>,
    ) -> Result<Self, CommerceError> {
        let summary = summarize(lines)?;
        let items = summary
            .lines
            .iter()
            .map(|l| {
                Ok(OrderItem {
                    name: l.name.clone(),
                    quantity: l.quantity,
                    amount: Some(l.subtotal()?),
                })
            })
            .collect::<Result<Vec<_>, CommerceError>>()?;

        Ok(Self {
            session_id,
            status: STATUS_PENDING.to_string(),
            total: summary.total,
            items,
            customer_email: None,
            shipping_name: None,
            shipping_address: None,
            source: SummarySource::CartSnapshot,
        })
    }
}

/// Result of the best-effort commit on the success page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "error", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed,
    /// Session is not paid; nothing to commit.
    Skipped,
    /// Session details could not be read.
    NotAttempted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SuccessOutcome {
    /// No session token anywhere; generic thank-you.
    NoSession,
    Completed {
        summary: OrderSummary,
        commit: CommitOutcome,
        state: SessionState,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// No session token anywhere; nothing was released.
    NoSession,
    Released {
        session_id: CheckoutSessionId,
    },
    ReleaseFailed {
        session_id: CheckoutSessionId,
        error: String,
    },
}

impl CancelOutcome {
    /// Text shown to the shopper.
    pub fn message(&self) -> &'static str {
        match self {
            CancelOutcome::NoSession => CANCELED_MESSAGE,
            CancelOutcome::Released { .. } => RELEASED_MESSAGE,
            CancelOutcome::ReleaseFailed { .. } => RELEASE_FAILED_MESSAGE,
        }
    }

    pub fn session_id(&self) -> Option<&CheckoutSessionId> {
        match self {
            CancelOutcome::NoSession => None,
            CancelOutcome::Released { session_id } | CancelOutcome::ReleaseFailed { session_id, .. } => {
                Some(session_id)
            }
        }
    }
}

/// Handles the success and cancel return URLs.
///
/// Backend failures here never fail the landing itself; they degrade to a
/// fallback summary or a softer message. Only local storage errors are
/// returned.
#[derive(Debug, Clone)]
pub struct Reconciler {
    api: BackendApi,
    cart: CartStore,
    token: Slot<CheckoutSessionId>,
}

impl Reconciler {
    pub fn new(api: BackendApi, cache: &Cache) -> Self {
        Self {
            api,
            cart: CartStore::new(cache),
            token: session_token(cache),
        }
    }

    /// Token from the return URL, else the stored one. The unsubstituted
    /// placeholder counts as absent, and so does an unreadable stored token.
    fn resolve(&self, from_url: Option<&str>) -> Result<Option<CheckoutSessionId>, CommerceError> {
        let from_url = from_url
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != SESSION_ID_PLACEHOLDER);
        match from_url {
            Some(id) => Ok(Some(CheckoutSessionId::new(id))),
            None => Ok(self.token.get_or_discard()?),
        }
    }

    /// Success landing: clear the cart, summarize the order, and commit the
    /// reservation when the session is paid.
    pub async fn success(&self, session_id: Option<&str>) -> Result<SuccessOutcome, CommerceError> {
        let Some(session_id) = self.resolve(session_id)? else {
            tracing::warn!("success landing without a session id");
            return Ok(SuccessOutcome::NoSession);
        };

        let snapshot = self.cart.load()?;
        self.cart.clear()?;

        let outcome = match self.api.session_details(&session_id).await {
            Ok(details) => {
                let summary = OrderSummary::from_details(&details);
                let mut state = SessionState::Redirected;
                let commit = if details.is_paid() {
                    state = state.transition(SessionState::Paid)?;
                    match self.api.commit_reservation(&session_id).await {
                        Ok(()) => {
                            state = state.transition(SessionState::Committed)?;
                            tracing::info!(session = %session_id, "reservation committed");
                            CommitOutcome::Committed
                        }
                        Err(e) => {
                            tracing::warn!(session = %session_id, error = %e, "reservation commit failed");
                            CommitOutcome::Failed(e.to_string())
                        }
                    }
                } else {
                    tracing::info!(session = %session_id, status = ?details.payment_status, "session not paid, skipping commit");
                    CommitOutcome::Skipped
                };
                SuccessOutcome::Completed {
                    summary,
                    commit,
                    state,
                }
            }
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "session details unavailable, using cart snapshot");
                SuccessOutcome::Completed {
                    summary: OrderSummary::from_snapshot(session_id, snapshot)?,
                    commit: CommitOutcome::NotAttempted,
                    state: SessionState::Redirected,
                }
            }
        };

        self.token.clear()?;
        Ok(outcome)
    }

    /// Cancel landing: forget the stored token, then release the session's
    /// reservation.
    pub async fn cancel(&self, session_id: Option<&str>) -> Result<CancelOutcome, CommerceError> {
        let Some(session_id) = self.resolve(session_id)? else {
            tracing::info!("cancel landing without a session id");
            return Ok(CancelOutcome::NoSession);
        };

        // Cleared before the release so a reload cannot release twice.
        self.token.clear()?;

        match self.api.release_reservation(&session_id).await {
            Ok(()) => {
                tracing::info!(session = %session_id, "reservation released");
                Ok(CancelOutcome::Released { session_id })
            }
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "reservation release failed");
                Ok(CancelOutcome::ReleaseFailed {
                    session_id,
                    error: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ProductId, VariantId};
    use crate::checkout::SESSION_TOKEN_KEY;
    use crate::money::Currency;
    use serde_json::json;
    use shop_data::{FetchClient, Method, MockTransport};

    const DETAILS: &str = "/myapp/get-session-details/";
    const COMMIT: &str = "/myapp/inventory/commit/";
    const RELEASE: &str = "/myapp/api/release-checkout-reservation/";

    fn setup() -> (MockTransport, Cache, Reconciler) {
        let mock = MockTransport::new();
        let cache = Cache::in_memory();
        let api = BackendApi::new(FetchClient::with_transport(mock.clone()).with_base_url("http://api"));
        let reconciler = Reconciler::new(api, &cache);
        (mock, cache, reconciler)
    }

    fn fill_cart(cache: &Cache) {
        CartStore::new(cache)
            .add(CartLineItem::new(
                ProductId::new("P1"),
                Some(VariantId::new("11")),
                "Phone One",
                Money::new(99900, Currency::USD),
                2,
                "Black",
                "128GB",
            ))
            .unwrap();
    }

    fn paid_details(id: &str) -> serde_json::Value {
        json!({
            "id": id, "status": "complete", "payment_status": "paid",
            "amount_total": 199800, "currency": "usd", "customer_email": "ada@example.com",
            "line_items": [{"price_id": "price_1", "quantity": 2, "amount_total": 199800,
                            "description": "Phone One"}],
            "shipping": {"name": "Ada", "address": {"line1": "1 Main St", "city": "Springfield",
                         "postal_code": "62701", "country": "US"}}
        })
    }

    #[tokio::test]
    async fn test_success_paid_commits() {
        let (mock, cache, r) = setup();
        fill_cart(&cache);
        session_token(&cache).set(&CheckoutSessionId::new("cs_1")).unwrap();
        mock.on_json(Method::Get, DETAILS, 200, &paid_details("cs_1"));
        mock.on_json(Method::Post, COMMIT, 200, &json!({"success": true}));

        let outcome = r.success(Some("cs_1")).await.unwrap();

        let SuccessOutcome::Completed { summary, commit, state } = outcome else {
            panic!("expected a completed outcome");
        };
        assert_eq!(summary.status, STATUS_CONFIRMED);
        assert_eq!(summary.total.display(), "$1998.00");
        assert_eq!(summary.items[0].name, "Phone One");
        assert_eq!(summary.shipping_name.as_deref(), Some("Ada"));
        assert_eq!(
            summary.shipping_address.as_deref(),
            Some("1 Main St, Springfield, 62701, US")
        );
        assert_eq!(summary.source, SummarySource::Backend);
        assert_eq!(commit, CommitOutcome::Committed);
        assert_eq!(state, SessionState::Committed);

        let commits = mock.requests_to(Method::Post, COMMIT);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].json::<serde_json::Value>().unwrap()["session_id"], "cs_1");

        assert!(CartStore::new(&cache).load().unwrap().is_empty());
        assert!(session_token(&cache).get().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_success_unpaid_skips_commit() {
        let (mock, _, r) = setup();
        mock.on_json(
            Method::Get,
            DETAILS,
            200,
            &json!({"id": "cs_2", "payment_status": "unpaid", "amount_total": 500}),
        );

        let outcome = r.success(Some("cs_2")).await.unwrap();
        let SuccessOutcome::Completed { summary, commit, .. } = outcome else {
            panic!("expected a completed outcome");
        };
        assert_eq!(summary.status, STATUS_PENDING);
        assert_eq!(commit, CommitOutcome::Skipped);
        assert!(mock.requests_to(Method::Post, COMMIT).is_empty());
    }

    #[tokio::test]
    async fn test_success_commit_failure_is_not_fatal() {
        let (mock, _, r) = setup();
        mock.on_json(Method::Get, DETAILS, 200, &paid_details("cs_1"));
        mock.on_json(Method::Post, COMMIT, 500, &json!({"error": "boom"}));

        let outcome = r.success(Some("cs_1")).await.unwrap();
        let SuccessOutcome::Completed { commit, state, .. } = outcome else {
            panic!("expected a completed outcome");
        };
        assert!(matches!(commit, CommitOutcome::Failed(ref e) if e.contains("boom")));
        assert_eq!(state, SessionState::Paid);
    }

    #[tokio::test]
    async fn test_success_falls_back_to_cart_snapshot() {
        let (mock, cache, r) = setup();
        fill_cart(&cache);
        mock.fail(Method::Get, DETAILS, "connection reset");

        let outcome = r.success(Some("cs_1")).await.unwrap();
        let SuccessOutcome::Completed { summary, commit, .. } = outcome else {
            panic!("expected a completed outcome");
        };
        assert_eq!(summary.source, SummarySource::CartSnapshot);
        assert_eq!(summary.total.amount_cents, 199800);
        assert_eq!(summary.items[0].quantity, 2);
        assert_eq!(commit, CommitOutcome::NotAttempted);
        assert!(CartStore::new(&cache).load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_without_session_is_generic() {
        let (mock, cache, r) = setup();
        fill_cart(&cache);

        let outcome = r.success(None).await.unwrap();
        assert_eq!(outcome, SuccessOutcome::NoSession);
        assert!(mock.requests().is_empty());
        // Cart kept when nothing identifies a finished checkout
        assert_eq!(CartStore::new(&cache).load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_releases_once() {
        let (mock, cache, r) = setup();
        mock.on_json(Method::Post, RELEASE, 200, &json!({"success": true}));
        session_token(&cache).set(&CheckoutSessionId::new("cs_7")).unwrap();

        let first = r.cancel(None).await.unwrap();
        assert_eq!(first.session_id().map(|s| s.as_str()), Some("cs_7"));
        assert_eq!(first.message(), RELEASED_MESSAGE);
        assert!(session_token(&cache).get().unwrap().is_none());

        let second = r.cancel(None).await.unwrap();
        assert_eq!(second, CancelOutcome::NoSession);
        assert_eq!(second.message(), CANCELED_MESSAGE);
        assert_eq!(mock.requests_to(Method::Post, RELEASE).len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_placeholder_uses_stored_token() {
        let (mock, cache, r) = setup();
        mock.on_json(Method::Post, RELEASE, 200, &json!({"success": true}));
        session_token(&cache).set(&CheckoutSessionId::new("cs_8")).unwrap();

        let outcome = r.cancel(Some(SESSION_ID_PLACEHOLDER)).await.unwrap();
        assert_eq!(
            outcome,
            CancelOutcome::Released {
                session_id: CheckoutSessionId::new("cs_8")
            }
        );
        let released = mock.requests_to(Method::Post, RELEASE);
        assert_eq!(released[0].json::<serde_json::Value>().unwrap()["session_id"], "cs_8");
    }

    #[tokio::test]
    async fn test_cancel_release_failure_still_clears_token() {
        let (mock, cache, r) = setup();
        mock.on_json(Method::Post, RELEASE, 500, &json!({"error": "db down"}));
        session_token(&cache).set(&CheckoutSessionId::new("cs_9")).unwrap();

        let outcome = r.cancel(Some("cs_9")).await.unwrap();
        assert_eq!(outcome.message(), RELEASE_FAILED_MESSAGE);
        assert!(session_token(&cache).get().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_without_any_token() {
        let (mock, _, r) = setup();
        let outcome = r.cancel(Some("")).await.unwrap();
        assert_eq!(outcome, CancelOutcome::NoSession);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_stored_token_counts_as_absent() {
        let (mock, cache, r) = setup();
        fill_cart(&cache);
        cache
            .set(SESSION_TOKEN_KEY, &json!({"unexpected": 1}))
            .unwrap();

        assert_eq!(r.cancel(None).await.unwrap(), CancelOutcome::NoSession);
        assert!(!cache.exists(SESSION_TOKEN_KEY).unwrap());

        cache
            .set(SESSION_TOKEN_KEY, &json!({"unexpected": 1}))
            .unwrap();
        assert_eq!(r.success(None).await.unwrap(), SuccessOutcome::NoSession);
        assert!(!cache.exists(SESSION_TOKEN_KEY).unwrap());

        assert!(mock.requests().is_empty());
        assert_eq!(CartStore::new(&cache).load().unwrap().len(), 1);
    }
}
