//! Hosted checkout session types.

use serde::{Deserialize, Serialize};
use shop_cache::{Cache, Slot};

use crate::error::CommerceError;
use crate::ids::{CheckoutSessionId, VariantId};
use crate::money::{Currency, Money};

/// Storage key holding the token of the session the shopper was sent to.
pub const SESSION_TOKEN_KEY: &str = "stripe_checkout_session_id";

/// Placeholder the payment processor replaces with the real session token
/// when it redirects back.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// The stored token of the session in flight.
pub fn session_token(cache: &Cache) -> Slot<CheckoutSessionId> {
    cache.slot(SESSION_TOKEN_KEY)
}

/// One `{variant_id, quantity}` pair of a session request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutItem {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Body of a buy-now session request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuyNowRequest {
    pub variant_id: VariantId,
    pub quantity: u32,
    pub success_url: String,
    pub cancel_url: String,
}

/// Body of a cart session request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartCheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Backend reply to a session request. Either field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutRedirect {
    #[serde(default)]
    pub id: Option<CheckoutSessionId>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Where the processor sends the shopper back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnUrls {
    pub success: String,
    pub cancel: String,
}

impl ReturnUrls {
    /// Storefront success and cancel pages under `origin`, both asking the
    /// processor to append the session token.
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            success: format!("{}/checkout/success?session_id={}", origin, SESSION_ID_PLACEHOLDER),
            cancel: format!("{}/checkout/cancel?session_id={}", origin, SESSION_ID_PLACEHOLDER),
        }
    }
}

/// Session details as reported by the backend after the shopper returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionDetails {
    pub id: CheckoutSessionId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Minor units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub line_items: Vec<SessionLineItem>,
    #[serde(default)]
    pub shipping: Option<ShippingDetails>,
}

impl SessionDetails {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    pub fn currency(&self) -> Currency {
        self.currency
            .as_deref()
            .and_then(Currency::from_code)
            .unwrap_or_default()
    }

    pub fn total(&self) -> Option<Money> {
        self.amount_total.map(|cents| Money::new(cents, self.currency()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionLineItem {
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default, alias = "name")]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    /// Minor units.
    #[serde(default)]
    pub amount_total: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShippingDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<ShippingAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShippingAddress {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ShippingAddress {
    /// Format as single line, skipping empty parts.
    pub fn one_line(&self) -> String {
        [
            &self.line1,
            &self.line2,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Lifecycle of a hosted checkout session as seen from the storefront.
///
/// ```text
/// created -> redirected -> paid     -> committed
///                       -> canceled -> released
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Created,
    Redirected,
    Paid,
    Canceled,
    Committed,
    Released,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Redirected => "redirected",
            SessionState::Paid => "paid",
            SessionState::Canceled => "canceled",
            SessionState::Committed => "committed",
            SessionState::Released => "released",
        }
    }

    pub fn can_transition_to(&self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Created, SessionState::Redirected)
                | (SessionState::Redirected, SessionState::Paid)
                | (SessionState::Redirected, SessionState::Canceled)
                | (SessionState::Paid, SessionState::Committed)
                | (SessionState::Canceled, SessionState::Released)
        )
    }

    /// Move to `next`, or fail if the lifecycle does not allow it.
    pub fn transition(self, next: SessionState) -> Result<SessionState, CommerceError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CommerceError::InvalidCheckoutTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Committed | SessionState::Released)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
