//! Database row types for campaigns and donations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::domain::{
    Campaign, CampaignId, CampaignStatus, Donation, DonationId, DonationStatus, IntentId, UserId,
};
use crate::error::PlatformError;

/// Column list matching [`CampaignRow`].
pub const CAMPAIGN_COLUMNS: &str =
    "id, title, target_amount, current_amount, status, created_at, updated_at";

/// Column list matching [`DonationRow`].
pub const DONATION_COLUMNS: &str = "id, amount, currency, status, payment_id, is_anonymous, \
     message, donor_id, campaign_id, created_at";

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow)]
pub struct CampaignRow {
    /// Primary key.
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Funding goal.
    pub target_amount: Decimal,
    /// Running total of completed donations.
    pub current_amount: Decimal,
    /// Lifecycle status string.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = PlatformError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CampaignId::new(row.id),
            title: row.title,
            target_amount: row.target_amount,
            current_amount: row.current_amount,
            status: row.status.parse::<CampaignStatus>()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `donations` table.
#[derive(Debug, Clone, FromRow)]
pub struct DonationRow {
    /// Primary key.
    pub id: i64,
    /// Amount in major units.
    pub amount: Decimal,
    /// ISO-4217 code.
    pub currency: String,
    /// Terminal status string.
    pub status: String,
    /// Gateway intent reference (unique).
    pub payment_id: String,
    /// Anonymity flag.
    pub is_anonymous: bool,
    /// Optional donor note.
    pub message: Option<String>,
    /// Optional donor.
    pub donor_id: Option<i64>,
    /// Campaign foreign key.
    pub campaign_id: i64,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = PlatformError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DonationId::new(row.id),
            amount: row.amount,
            currency: row.currency,
            status: row.status.parse::<DonationStatus>()?,
            payment_id: IntentId::new(row.payment_id),
            is_anonymous: row.is_anonymous,
            message: row.message,
            donor_id: row.donor_id.map(UserId::new),
            campaign_id: CampaignId::new(row.campaign_id),
            created_at: row.created_at,
        })
    }
}

/// Converts a batch of rows, failing on the first malformed one.
pub(crate) fn donations_from_rows(rows: Vec<DonationRow>) -> Result<Vec<Donation>, PlatformError> {
    rows.into_iter().map(Donation::try_from).collect()
}
