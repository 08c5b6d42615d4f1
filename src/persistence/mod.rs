//! Persistence layer: campaigns and the donation ledger.
//!
//! [`DonationStore`] is the port the reconciliation service writes through.
//! [`PgDonationStore`] backs it with PostgreSQL. Tests use an in-memory
//! store that keeps the same guarantees behind a single mutex.
//!
//! The one write operation, [`DonationStore::record_donation`], is the
//! atomic unit per intent: the ledger insert and the campaign total
//! adjustment commit together, and a second write for the same intent
//! returns the first entry instead of creating another.

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Campaign, CampaignId, Donation, DonationStats, NewDonation, Page, UserId};
use crate::error::PlatformError;

#[cfg(test)]
pub use memory::InMemoryStore;
pub use postgres::PgDonationStore;

/// Result of [`DonationStore::record_donation`].
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerWrite {
    /// A new entry was written.
    Recorded {
        /// The entry as stored.
        donation: Donation,
        /// The campaign after any total adjustment.
        campaign: Campaign,
        /// This write moved the campaign from `active` to `completed`.
        reached_target: bool,
    },
    /// An entry for the same intent already existed; nothing was written.
    AlreadyRecorded(Donation),
}

impl LedgerWrite {
    /// The stored entry, new or pre-existing.
    #[must_use]
    pub fn donation(&self) -> &Donation {
        match self {
            Self::Recorded { donation, .. } | Self::AlreadyRecorded(donation) => donation,
        }
    }

    /// Consumes the result, returning the stored entry.
    #[must_use]
    pub fn into_donation(self) -> Donation {
        match self {
            Self::Recorded { donation, .. } | Self::AlreadyRecorded(donation) => donation,
        }
    }
}

/// Storage port for campaigns and ledger entries.
#[async_trait]
pub trait DonationStore: Send + Sync + fmt::Debug {
    /// Loads a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Persistence`] on storage failure.
    async fn campaign(&self, id: CampaignId) -> Result<Option<Campaign>, PlatformError>;

    /// Writes a ledger entry and, for completed entries, adds its amount to
    /// the campaign total in the same atomic unit.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::CampaignMissing`] if the campaign does not
    /// exist (nothing is written), or [`PlatformError::Persistence`] on
    /// storage failure.
    async fn record_donation(&self, donation: NewDonation) -> Result<LedgerWrite, PlatformError>;

    /// Completed, non-anonymous entries for a campaign, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Persistence`] on storage failure.
    async fn public_donations(
        &self,
        campaign_id: CampaignId,
        page: Page,
    ) -> Result<Vec<Donation>, PlatformError>;

    /// Completed entries attributed to a donor, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Persistence`] on storage failure.
    async fn donor_donations(
        &self,
        donor_id: UserId,
        page: Page,
    ) -> Result<Vec<Donation>, PlatformError>;

    /// Aggregates over a campaign's completed entries. `recent_since` bounds
    /// the recent-donation count.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Persistence`] on storage failure.
    async fn campaign_stats(
        &self,
        campaign_id: CampaignId,
        recent_since: DateTime<Utc>,
    ) -> Result<DonationStats, PlatformError>;
}
