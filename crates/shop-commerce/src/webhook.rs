//! Payment processor webhook verification.
//!
//! Events are authenticated and logged. No inventory state is changed
//! here; commits happen from the success page.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::CommerceError;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Default allowed age of a signed timestamp, in seconds.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Payment lifecycle events the storefront recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    PaymentIntentCreated,
    PaymentIntentSucceeded,
    ChargeSucceeded,
    Other(String),
}

impl WebhookEventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "payment_intent.created" => WebhookEventKind::PaymentIntentCreated,
            "payment_intent.succeeded" => WebhookEventKind::PaymentIntentSucceeded,
            "charge.succeeded" => WebhookEventKind::ChargeSucceeded,
            other => WebhookEventKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventData {
    #[serde(default)]
    pub object: serde_json::Value,
}

/// A webhook event envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub data: EventData,
}

impl WebhookEvent {
    pub fn kind(&self) -> WebhookEventKind {
        WebhookEventKind::from_type(&self.event_type)
    }

    /// `id` of the event's object, if it has one.
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }
}

/// Reply for the processor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub received: bool,
    pub event_id: String,
    pub kind: WebhookEventKind,
}

/// Parsed `t=...,v1=...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self, CommerceError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    timestamp = Some(value.parse::<i64>().map_err(|_| {
                        CommerceError::InvalidSignature(format!("bad timestamp {:?}", value))
                    })?);
                }
                // Unparseable v1 entries cannot match; skip them
                "v1" => {
                    if let Some(sig) = hex::decode(value) {
                        signatures.push(sig);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| CommerceError::InvalidSignature("missing timestamp".to_string()))?;
        if signatures.is_empty() {
            return Err(CommerceError::InvalidSignature("no v1 signature".to_string()));
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verifies webhook payloads against an endpoint secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: Option<u64>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: Some(DEFAULT_TOLERANCE_SECS),
        }
    }

    /// Allowed timestamp age; `None` disables the check.
    pub fn with_tolerance(mut self, tolerance_secs: Option<u64>) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
    pub fn sign(&self, timestamp: i64, payload: &str) -> Result<String, CommerceError> {
        let mac = self.mac(timestamp, payload)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Build a header value for `payload`, as the processor would.
    pub fn signature_header(&self, timestamp: i64, payload: &str) -> Result<String, CommerceError> {
        Ok(format!("t={},v1={}", timestamp, self.sign(timestamp, payload)?))
    }

    /// Verify against the current clock and parse the event.
    pub fn verify(&self, payload: &str, header: &str) -> Result<WebhookEvent, CommerceError> {
        self.verify_at(payload, header, current_timestamp())
    }

    /// Verify as of `now` (unix seconds) and parse the event.
    pub fn verify_at(
        &self,
        payload: &str,
        header: &str,
        now: i64,
    ) -> Result<WebhookEvent, CommerceError> {
        let header = SignatureHeader::parse(header)?;

        let matched = header.signatures.iter().any(|sig| {
            self.mac(header.timestamp, payload)
                .map(|mac| mac.verify_slice(sig).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            return Err(CommerceError::InvalidSignature(
                "no signature matches the payload".to_string(),
            ));
        }

        if let Some(tolerance) = self.tolerance_secs {
            let age = now.saturating_sub(header.timestamp).unsigned_abs();
            if age > tolerance {
                return Err(CommerceError::InvalidSignature(format!(
                    "timestamp outside tolerance ({}s)",
                    age
                )));
            }
        }

        serde_json::from_str(payload).map_err(|e| CommerceError::InvalidWebhookPayload(e.to_string()))
    }

    fn mac(&self, timestamp: i64, payload: &str) -> Result<HmacSha256, CommerceError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| CommerceError::InvalidSignature(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

/// Log a verified event and acknowledge it.
pub fn handle(event: &WebhookEvent) -> WebhookAck {
    let kind = event.kind();
    match &kind {
        WebhookEventKind::PaymentIntentCreated => {
            tracing::info!(event = %event.id, object = ?event.object_id(), "payment intent created");
        }
        WebhookEventKind::PaymentIntentSucceeded => {
            tracing::info!(event = %event.id, object = ?event.object_id(), "payment intent succeeded");
        }
        WebhookEventKind::ChargeSucceeded => {
            tracing::info!(event = %event.id, object = ?event.object_id(), "charge succeeded");
        }
        WebhookEventKind::Other(t) => {
            tracing::debug!(event = %event.id, event_type = %t, "unhandled webhook event");
        }
    }
    WebhookAck {
        received: true,
        event_id: event.id.clone(),
        kind,
    }
}

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// hex helpers (no extra dep)
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
            .collect()
    }
}
