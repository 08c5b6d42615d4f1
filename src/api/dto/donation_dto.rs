//! DTOs for donation endpoints.
//!
//! Amounts are decimals and serialize as JSON strings (`"25.00"`) so no
//! precision is lost; requests accept either strings or numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CampaignId, Donation, DonationStats};
use crate::gateway::CreatedIntent;
use crate::service::DonationIntent;

fn default_currency() -> String {
    "usd".to_string()
}

/// Body of `POST /donations/create-payment-intent`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePaymentIntentRequest {
    /// Campaign to donate to.
    pub campaign_id: i64,
    /// Amount in major units, e.g. `"25.00"`.
    #[schema(value_type = String, example = "25.00")]
    pub amount: Decimal,
    /// ISO-4217 code. Defaults to `usd`.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Contact email, used when the caller is not signed in.
    #[serde(default)]
    pub donor_email: Option<String>,
    /// Display name, used when the caller is not signed in.
    #[serde(default)]
    pub donor_name: Option<String>,
    /// Hide the donor from the public list.
    #[serde(default)]
    pub is_anonymous: bool,
    /// Note to the campaign (max 500 characters).
    #[serde(default)]
    pub message: Option<String>,
}

impl From<CreatePaymentIntentRequest> for DonationIntent {
    fn from(req: CreatePaymentIntentRequest) -> Self {
        Self {
            campaign_id: CampaignId::new(req.campaign_id),
            amount: req.amount,
            currency: req.currency,
            donor_email: req.donor_email,
            donor_name: req.donor_name,
            is_anonymous: req.is_anonymous,
            message: req.message,
        }
    }
}

/// Handle the client uses to complete payment with the gateway.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    /// Secret for the gateway's client SDK.
    pub client_secret: String,
    /// Gateway intent reference.
    pub payment_intent_id: String,
}

impl From<CreatedIntent> for PaymentIntentResponse {
    fn from(created: CreatedIntent) -> Self {
        Self {
            client_secret: created.client_secret,
            payment_intent_id: created.intent_id.as_str().to_string(),
        }
    }
}

/// Result of a successful confirmation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfirmPaymentResponse {
    /// Human-readable status.
    pub message: String,
    /// Ledger entry id.
    pub donation_id: i64,
    /// Amount credited.
    #[schema(value_type = String, example = "25.00")]
    pub amount: Decimal,
    /// Campaign credited.
    pub campaign_id: i64,
}

impl From<Donation> for ConfirmPaymentResponse {
    fn from(donation: Donation) -> Self {
        Self {
            message: "Payment confirmed successfully".to_string(),
            donation_id: donation.id.get(),
            amount: donation.amount,
            campaign_id: donation.campaign_id.get(),
        }
    }
}

/// A ledger entry as returned by listing endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DonationDto {
    /// Ledger entry id.
    pub id: i64,
    /// Amount in major units.
    #[schema(value_type = String, example = "25.00")]
    pub amount: Decimal,
    /// ISO-4217 code.
    pub currency: String,
    /// `completed` or `failed`.
    pub status: String,
    /// Whether the donor asked to stay anonymous.
    pub is_anonymous: bool,
    /// Donor note.
    pub message: Option<String>,
    /// Donor user id, hidden for anonymous entries.
    pub donor_id: Option<i64>,
    /// Campaign id.
    pub campaign_id: i64,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

impl From<Donation> for DonationDto {
    fn from(donation: Donation) -> Self {
        Self {
            id: donation.id.get(),
            amount: donation.amount,
            currency: donation.currency,
            status: donation.status.as_str().to_string(),
            is_anonymous: donation.is_anonymous,
            message: donation.message,
            donor_id: if donation.is_anonymous {
                None
            } else {
                donation.donor_id.map(|id| id.get())
            },
            campaign_id: donation.campaign_id.get(),
            created_at: donation.created_at,
        }
    }
}

/// Aggregates for `GET /donations/stats/{campaign_id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DonationStatsResponse {
    /// Completed donations.
    pub total_donations: i64,
    /// Sum of completed donations.
    #[schema(value_type = String, example = "1250.00")]
    pub total_amount: Decimal,
    /// Mean completed donation.
    #[schema(value_type = String, example = "25.00")]
    pub average_donation: Decimal,
    /// Completed donations in the last 7 days.
    pub recent_donations: i64,
}

impl From<DonationStats> for DonationStatsResponse {
    fn from(stats: DonationStats) -> Self {
        Self {
            total_donations: stats.total_donations,
            total_amount: stats.total_amount,
            average_donation: stats.average_donation,
            recent_donations: stats.recent_donations,
        }
    }
}
