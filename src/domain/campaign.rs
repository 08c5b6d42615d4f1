//! Campaign aggregate and its funding state machine.
//!
//! Campaigns are created and moderated elsewhere; this service reads them to
//! decide whether they accept donations and adjusts their running total
//! when a donation completes. The only transition performed here is
//! `active → completed`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CampaignId;
use crate::error::PlatformError;

/// Lifecycle status of a campaign.
///
/// ```text
/// draft → pending → active → completed
///            │         │
///            └─────────┴──→ cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Being edited by its creator.
    Draft,
    /// Submitted and awaiting admin approval.
    Pending,
    /// Approved and accepting donations.
    Active,
    /// Funding target reached.
    Completed,
    /// Withdrawn by an administrator.
    Cancelled,
}

impl CampaignStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(PlatformError::Internal(format!(
                "unknown campaign status {other:?}"
            ))),
        }
    }
}

/// Which campaign statuses accept new donations.
///
/// `active` campaigns always do. Campaigns still awaiting approval only do
/// when `allow_pending` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FundingPolicy {
    /// Accept donations for campaigns in `pending` status.
    pub allow_pending: bool,
}

impl FundingPolicy {
    /// Only `active` campaigns are fundable.
    #[must_use]
    pub const fn active_only() -> Self {
        Self {
            allow_pending: false,
        }
    }

    /// `active` and `pending` campaigns are fundable.
    #[must_use]
    pub const fn allow_pending() -> Self {
        Self {
            allow_pending: true,
        }
    }

    /// Returns `true` if a campaign in `status` may receive donations.
    #[must_use]
    pub const fn accepts(&self, status: CampaignStatus) -> bool {
        match status {
            CampaignStatus::Active => true,
            CampaignStatus::Pending => self.allow_pending,
            CampaignStatus::Draft | CampaignStatus::Completed | CampaignStatus::Cancelled => false,
        }
    }
}

/// A fundraising campaign with its running total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    /// Database identifier.
    pub id: CampaignId,
    /// Display title.
    pub title: String,
    /// Funding goal in major units.
    pub target_amount: Decimal,
    /// Sum of completed donations in major units.
    pub current_amount: Decimal,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Adds a completed donation to the running total.
    ///
    /// Flips an `active` campaign to `completed` once the total reaches the
    /// target. Returns `true` if that transition happened.
    pub fn apply_donation(&mut self, amount: Decimal, now: DateTime<Utc>) -> bool {
        self.current_amount += amount;
        self.updated_at = now;
        if self.status == CampaignStatus::Active && self.current_amount >= self.target_amount {
            self.status = CampaignStatus::Completed;
            return true;
        }
        false
    }
}
