//! Webhook signature verification and event envelope parsing.
//!
//! The gateway signs each delivery with a header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=…]`, where the HMAC-SHA256 is taken
//! over `"<t>.<raw body>"` with the shared webhook secret. A delivery is
//! accepted if any `v1` entry matches and the timestamp is within the
//! configured tolerance.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;

use crate::domain::IntentId;
use crate::error::PlatformError;

type HmacSha256 = Hmac<Sha256>;

/// Event type reported when an intent succeeds.
pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
/// Event type reported when a payment attempt fails.
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// What a verified event asks the service to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    /// The intent succeeded.
    PaymentSucceeded(IntentId),
    /// A payment attempt on the intent failed.
    PaymentFailed(IntentId),
    /// Any other event type; acknowledged without action.
    Other,
}

/// A verified webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Gateway event identifier.
    pub id: String,
    /// Raw event type string.
    pub event_type: String,
    /// Decoded action.
    pub kind: WebhookEventKind,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

/// Verifies webhook signatures against the shared secret.
#[derive(Debug)]
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance: Duration,
}

impl WebhookVerifier {
    /// Default timestamp tolerance.
    pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

    /// Creates a verifier for the given signing secret.
    #[must_use]
    pub fn new(secret: SecretString, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    /// Verifies `payload` against `header` using the current clock and
    /// decodes the event envelope.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidSignature`] if the header is missing,
    /// malformed, stale, or does not match; [`PlatformError::Validation`]
    /// if the signed payload is not a valid event envelope.
    pub fn verify(
        &self,
        payload: &[u8],
        header: Option<&str>,
    ) -> Result<WebhookEvent, PlatformError> {
        self.verify_at(payload, header, Utc::now())
    }

    /// Same as [`Self::verify`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`Self::verify`].
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WebhookEvent, PlatformError> {
        let header = header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| PlatformError::InvalidSignature("missing signature".to_string()))?;

        let (timestamp, signatures) = parse_header(header)?;

        let age = now.timestamp().abs_diff(timestamp);
        if age > self.tolerance.as_secs() {
            return Err(PlatformError::InvalidSignature(format!(
                "timestamp outside tolerance ({age}s)"
            )));
        }

        let matched = signatures.iter().any(|candidate| {
            let Ok(expected) = hex::decode(candidate) else {
                return false;
            };
            let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            else {
                return false;
            };
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        });
        if !matched {
            return Err(PlatformError::InvalidSignature(
                "no signature matches the payload".to_string(),
            ));
        }

        parse_event(payload)
    }
}

/// Builds a signature header for `payload`, as the gateway would.
///
/// # Errors
///
/// Returns [`PlatformError::Internal`] if the secret cannot key an HMAC.
pub fn signature_header(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, PlatformError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PlatformError::Internal(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>), PlatformError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }
    let timestamp = timestamp
        .ok_or_else(|| PlatformError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(PlatformError::InvalidSignature(
            "no v1 signature present".to_string(),
        ));
    }
    Ok((timestamp, signatures))
}

fn parse_event(payload: &[u8]) -> Result<WebhookEvent, PlatformError> {
    let envelope: Envelope = serde_json::from_slice(payload)
        .map_err(|e| PlatformError::Validation(format!("invalid event payload: {e}")))?;

    let object_id = || {
        envelope
            .data
            .object
            .get("id")
            .and_then(serde_json::Value::as_str)
            .filter(|id| !id.is_empty())
            .map(IntentId::from)
            .ok_or_else(|| {
                PlatformError::Validation(format!(
                    "{} event carries no intent id",
                    envelope.event_type
                ))
            })
    };

    let kind = match envelope.event_type.as_str() {
        PAYMENT_SUCCEEDED => WebhookEventKind::PaymentSucceeded(object_id()?),
        PAYMENT_FAILED => WebhookEventKind::PaymentFailed(object_id()?),
        _ => WebhookEventKind::Other,
    };

    Ok(WebhookEvent {
        id: envelope.id,
        event_type: envelope.event_type,
        kind,
    })
}
