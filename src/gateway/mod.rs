//! Payment gateway adapter.
//!
//! The [`PaymentGateway`] trait is the only seam through which the service
//! talks to the payment processor: it creates intents and reads back their
//! authoritative state. [`StripeGateway`] speaks the Stripe REST API.
//! Webhook authenticity is checked separately by [`WebhookVerifier`].

#[cfg(test)]
pub mod memory;
pub mod signature;
pub mod stripe;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{CampaignId, IntentId, UserId};
use crate::error::PlatformError;

#[cfg(test)]
pub use memory::InMemoryGateway;
pub use signature::{WebhookEvent, WebhookEventKind, WebhookVerifier};
pub use stripe::StripeGateway;

/// Placeholder written to metadata when no donor email is known.
pub const ANONYMOUS_EMAIL: &str = "anonymous";
/// Placeholder written to metadata when no donor name is known.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Errors raised by gateway adapters.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The gateway has no intent with this reference.
    #[error("no such payment intent: {0}")]
    IntentNotFound(IntentId),

    /// The gateway rejected the request.
    #[error("gateway rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the gateway.
        status: u16,
        /// Gateway-provided error message.
        message: String,
    },

    /// Network failure or timeout talking to the gateway.
    #[error("gateway unreachable: {0}")]
    Transport(String),

    /// The gateway answered with a body we could not decode.
    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

impl From<GatewayError> for PlatformError {
    fn from(err: GatewayError) -> Self {
        Self::Payment(err.to_string())
    }
}

/// Processor-side state of an intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Waiting for the customer to attach a payment method.
    RequiresPaymentMethod,
    /// Waiting for confirmation.
    RequiresConfirmation,
    /// Waiting on customer action (e.g. 3-D Secure).
    RequiresAction,
    /// Payment is being processed.
    Processing,
    /// Authorized, waiting for capture.
    RequiresCapture,
    /// Abandoned or cancelled.
    Canceled,
    /// Funds captured.
    Succeeded,
    /// A status this adapter does not know about.
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => "succeeded",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Donation details carried on the intent so a ledger entry can be built
/// from the gateway's copy alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMetadata {
    /// Campaign the donation is for.
    pub campaign_id: CampaignId,
    /// Donor email, if known.
    pub donor_email: Option<String>,
    /// Donor display name, if known.
    pub donor_name: Option<String>,
    /// Authenticated donor at intent creation.
    pub donor_id: Option<UserId>,
    /// Hide the donor from public listings.
    pub is_anonymous: bool,
    /// Optional donor note.
    pub message: Option<String>,
}

impl IntentMetadata {
    /// Flattens the metadata into gateway key/value pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("campaign_id".to_string(), self.campaign_id.to_string()),
            (
                "donor_email".to_string(),
                self.donor_email
                    .clone()
                    .unwrap_or_else(|| ANONYMOUS_EMAIL.to_string()),
            ),
            (
                "donor_name".to_string(),
                self.donor_name
                    .clone()
                    .unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
            ),
            ("is_anonymous".to_string(), self.is_anonymous.to_string()),
            (
                "message".to_string(),
                self.message.clone().unwrap_or_default(),
            ),
        ];
        if let Some(donor_id) = self.donor_id {
            pairs.push(("donor_id".to_string(), donor_id.to_string()));
        }
        pairs
    }

    /// Rebuilds metadata from the map the gateway returns.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Validation`] if `campaign_id` is missing or
    /// not an integer.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, PlatformError> {
        let campaign_id = map
            .get("campaign_id")
            .ok_or_else(|| PlatformError::Validation("intent has no campaign_id".to_string()))?
            .parse::<i64>()
            .map(CampaignId::new)
            .map_err(|_| PlatformError::Validation("intent campaign_id is not numeric".to_string()))?;

        let non_blank = |key: &str, placeholder: Option<&str>| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty() && Some(*v) != placeholder)
                .map(str::to_string)
        };

        Ok(Self {
            campaign_id,
            donor_email: non_blank("donor_email", Some(ANONYMOUS_EMAIL)),
            donor_name: non_blank("donor_name", Some(ANONYMOUS_NAME)),
            donor_id: map
                .get("donor_id")
                .and_then(|v| v.parse::<i64>().ok())
                .map(UserId::new),
            is_anonymous: map
                .get("is_anonymous")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            message: non_blank("message", None),
        })
    }
}

/// Parameters for a new intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Lower-case ISO-4217 code, as the gateway expects.
    pub currency: String,
    /// Donation details stored on the intent.
    pub metadata: IntentMetadata,
    /// Address the gateway should send a receipt to.
    pub receipt_email: Option<String>,
    /// Statement description.
    pub description: String,
}

/// Handle returned to the client so it can complete payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIntent {
    /// Gateway reference of the new intent.
    pub intent_id: IntentId,
    /// Secret the client SDK uses to confirm the payment.
    pub client_secret: String,
}

/// The gateway's authoritative view of an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Gateway reference.
    pub id: IntentId,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// ISO-4217 code as reported by the gateway.
    pub currency: String,
    /// Processor-side state.
    pub status: IntentStatus,
    /// Raw metadata map.
    pub metadata: HashMap<String, String>,
}

/// Port for payment processor integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync + fmt::Debug {
    /// Creates an intent for the given amount and metadata.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway rejects the request or
    /// cannot be reached.
    async fn create_intent(&self, request: CreateIntent) -> Result<CreatedIntent, GatewayError>;

    /// Fetches the current state of an intent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::IntentNotFound`] for unknown references and
    /// other variants for transport or decoding failures.
    async fn retrieve_intent(&self, intent_id: &IntentId) -> Result<PaymentIntent, GatewayError>;
}
