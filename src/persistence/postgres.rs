//! PostgreSQL implementation of [`DonationStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{
    CAMPAIGN_COLUMNS, CampaignRow, DONATION_COLUMNS, DonationRow, donations_from_rows,
};
use super::{DonationStore, LedgerWrite};
use crate::config::DatabaseConfig;
use crate::domain::{
    Campaign, CampaignId, Donation, DonationStats, DonationStatus, NewDonation, Page,
    UserId,
};
use crate::error::PlatformError;

/// Opens a connection pool with the configured limits.
///
/// # Errors
///
/// Returns a [`PlatformError::Persistence`] if the database is unreachable.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, PlatformError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| PlatformError::Persistence(e.to_string()))
}

/// Applies the embedded migrations.
///
/// # Errors
///
/// Returns a [`PlatformError::Persistence`] if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), PlatformError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| PlatformError::Persistence(e.to_string()))
}

fn db_err(e: sqlx::Error) -> PlatformError {
    PlatformError::Persistence(e.to_string())
}

fn page_bounds(page: Page) -> (i64, i64) {
    (i64::from(page.limit), i64::from(page.skip))
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgDonationStore {
    pool: PgPool,
}

impl PgDonationStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonationStore for PgDonationStore {
    async fn campaign(&self, id: CampaignId) -> Result<Option<Campaign>, PlatformError> {
        let row = sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Campaign::try_from).transpose()
    }

    /// Locks the campaign row, inserts with `ON CONFLICT (payment_id) DO
    /// NOTHING` and adjusts the locked total before committing. Concurrent
    /// writers for the same campaign queue on the row lock; a losing writer
    /// for the same intent sees the winner's committed row on re-read.
    async fn record_donation(&self, new: NewDonation) -> Result<LedgerWrite, PlatformError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let campaign_row = sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE"
        ))
        .bind(new.campaign_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(campaign_row) = campaign_row else {
            tx.rollback().await.map_err(db_err)?;
            return Err(PlatformError::CampaignMissing {
                campaign_id: new.campaign_id,
                intent_id: new.payment_id,
            });
        };
        let mut campaign = Campaign::try_from(campaign_row)?;

        let inserted = sqlx::query_as::<_, DonationRow>(&format!(
            "INSERT INTO donations \
             (amount, currency, status, payment_id, is_anonymous, message, donor_id, campaign_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (payment_id) DO NOTHING \
             RETURNING {DONATION_COLUMNS}"
        ))
        .bind(new.amount)
        .bind(&new.currency)
        .bind(new.status.as_str())
        .bind(new.payment_id.as_str())
        .bind(new.is_anonymous)
        .bind(new.message.as_deref())
        .bind(new.donor_id.map(UserId::get))
        .bind(new.campaign_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(inserted) = inserted else {
            let existing = sqlx::query_as::<_, DonationRow>(&format!(
                "SELECT {DONATION_COLUMNS} FROM donations WHERE payment_id = $1"
            ))
            .bind(new.payment_id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;
            tx.rollback().await.map_err(db_err)?;
            return Ok(LedgerWrite::AlreadyRecorded(Donation::try_from(existing)?));
        };
        let donation = Donation::try_from(inserted)?;

        let mut reached_target = false;
        if donation.status == DonationStatus::Completed {
            reached_target = campaign.apply_donation(donation.amount, Utc::now());
            sqlx::query(
                "UPDATE campaigns SET current_amount = $2, status = $3, updated_at = $4 \
                 WHERE id = $1",
            )
            .bind(campaign.id.get())
            .bind(campaign.current_amount)
            .bind(campaign.status.as_str())
            .bind(campaign.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        Ok(LedgerWrite::Recorded {
            donation,
            campaign,
            reached_target,
        })
    }

    async fn public_donations(
        &self,
        campaign_id: CampaignId,
        page: Page,
    ) -> Result<Vec<Donation>, PlatformError> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query_as::<_, DonationRow>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations \
             WHERE campaign_id = $1 AND status = 'completed' AND NOT is_anonymous \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(campaign_id.get())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        donations_from_rows(rows)
    }

    async fn donor_donations(
        &self,
        donor_id: UserId,
        page: Page,
    ) -> Result<Vec<Donation>, PlatformError> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query_as::<_, DonationRow>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations \
             WHERE donor_id = $1 AND status = 'completed' \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(donor_id.get())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        donations_from_rows(rows)
    }

    async fn campaign_stats(
        &self,
        campaign_id: CampaignId,
        recent_since: DateTime<Utc>,
    ) -> Result<DonationStats, PlatformError> {
        let (count, total, recent) = sqlx::query_as::<_, (i64, Decimal, i64)>(
            "SELECT COUNT(*)::BIGINT, \
                    COALESCE(SUM(amount), 0), \
                    (COUNT(*) FILTER (WHERE created_at >= $2))::BIGINT \
             FROM donations WHERE campaign_id = $1 AND status = 'completed'",
        )
        .bind(campaign_id.get())
        .bind(recent_since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(DonationStats::from_totals(count, total, recent))
    }
}
