//! Donation ledger entries.
//!
//! A ledger entry records the terminal outcome of one gateway intent. It is
//! written once, when the intent is observed as succeeded or failed, and
//! never updated afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{CampaignId, DonationId, IntentId, UserId};
use crate::error::PlatformError;

/// Terminal outcome stored on a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// Funds captured; counted towards the campaign total.
    Completed,
    /// Payment attempt failed; kept for tracking only.
    Failed,
}

impl DonationStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(PlatformError::Internal(format!(
                "unknown donation status {other:?}"
            ))),
        }
    }
}

/// A persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Donation {
    /// Database identifier.
    pub id: DonationId,
    /// Amount in major units.
    pub amount: Decimal,
    /// Upper-case ISO-4217 code.
    pub currency: String,
    /// Terminal outcome.
    pub status: DonationStatus,
    /// Gateway intent this entry reconciles. Unique across the ledger.
    pub payment_id: IntentId,
    /// Hide the donor from public listings.
    pub is_anonymous: bool,
    /// Optional note left by the donor.
    pub message: Option<String>,
    /// Authenticated donor, if any.
    pub donor_id: Option<UserId>,
    /// Campaign the donation was made to.
    pub campaign_id: CampaignId,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Returns `true` if the entry counts towards the campaign total.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == DonationStatus::Completed
    }

    /// Returns `true` if the entry may appear in the campaign's public
    /// donor list.
    #[must_use]
    pub fn is_publicly_listed(&self) -> bool {
        self.is_completed() && !self.is_anonymous
    }
}

/// A ledger entry about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    /// Amount in major units.
    pub amount: Decimal,
    /// Upper-case ISO-4217 code.
    pub currency: String,
    /// Terminal outcome.
    pub status: DonationStatus,
    /// Gateway intent reference.
    pub payment_id: IntentId,
    /// Hide the donor from public listings.
    pub is_anonymous: bool,
    /// Optional donor note.
    pub message: Option<String>,
    /// Authenticated donor, if any.
    pub donor_id: Option<UserId>,
    /// Target campaign.
    pub campaign_id: CampaignId,
}

/// Aggregate figures over a campaign's completed donations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationStats {
    /// Number of completed donations.
    pub total_donations: i64,
    /// Sum of completed donation amounts.
    pub total_amount: Decimal,
    /// Mean completed donation, rounded to two places.
    pub average_donation: Decimal,
    /// Completed donations created within the recent window.
    pub recent_donations: i64,
}

impl DonationStats {
    /// Builds stats from raw aggregates, deriving the average.
    #[must_use]
    pub fn from_totals(total_donations: i64, total_amount: Decimal, recent_donations: i64) -> Self {
        let average_donation = if total_donations > 0 {
            (total_amount / Decimal::from(total_donations)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        Self {
            total_donations,
            total_amount,
            average_donation,
            recent_donations,
        }
    }
}

/// Offset/limit window for donation listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Rows to skip.
    pub skip: u32,
    /// Maximum rows to return.
    pub limit: u32,
}

impl Page {
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 50;
    /// Largest page size a caller may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Builds a window, clamping `limit` to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}
