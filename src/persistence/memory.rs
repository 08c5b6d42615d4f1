//! In-memory [`DonationStore`] for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{DonationStore, LedgerWrite};
use crate::domain::{
    Campaign, CampaignId, CampaignStatus, Donation, DonationId, DonationStats, IntentId,
    NewDonation, Page, UserId,
};
use crate::error::PlatformError;

/// Campaign fields supplied when seeding the store.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    /// Display title.
    pub title: String,
    /// Funding goal.
    pub target_amount: Decimal,
    /// Starting total.
    pub current_amount: Decimal,
    /// Initial status.
    pub status: CampaignStatus,
}

impl NewCampaign {
    /// An `active` campaign with nothing raised yet.
    #[must_use]
    pub fn active(title: impl Into<String>, target_amount: Decimal) -> Self {
        Self {
            title: title.into(),
            target_amount,
            current_amount: Decimal::ZERO,
            status: CampaignStatus::Active,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    campaigns: HashMap<CampaignId, Campaign>,
    donations: Vec<Donation>,
    next_campaign_id: i64,
    next_donation_id: i64,
}

/// Ledger and campaigns behind one mutex. Holding the lock across the
/// uniqueness check, insert and total update makes each
/// [`DonationStore::record_donation`] call atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a campaign and returns it with its assigned id.
    pub async fn insert_campaign(&self, new: NewCampaign) -> Campaign {
        let mut state = self.state.lock().await;
        state.next_campaign_id += 1;
        let now = Utc::now();
        let campaign = Campaign {
            id: CampaignId::new(state.next_campaign_id),
            title: new.title,
            target_amount: new.target_amount,
            current_amount: new.current_amount,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        state.campaigns.insert(campaign.id, campaign.clone());
        campaign
    }

    /// Deletes a campaign, leaving its ledger entries in place.
    pub async fn remove_campaign(&self, id: CampaignId) -> Option<Campaign> {
        self.state.lock().await.campaigns.remove(&id)
    }

    /// Number of ledger entries, any status.
    pub async fn donation_count(&self) -> usize {
        self.state.lock().await.donations.len()
    }

    /// Overrides the timestamp of an entry.
    pub async fn backdate(&self, payment_id: &IntentId, created_at: DateTime<Utc>) -> bool {
        let mut state = self.state.lock().await;
        match state.donations.iter_mut().find(|d| &d.payment_id == payment_id) {
            Some(donation) => {
                donation.created_at = created_at;
                true
            }
            None => false,
        }
    }
}

/// Newest first, ties broken by id.
fn newest_first(mut donations: Vec<Donation>, page: Page) -> Vec<Donation> {
    donations.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    donations
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl DonationStore for InMemoryStore {
    async fn campaign(&self, id: CampaignId) -> Result<Option<Campaign>, PlatformError> {
        Ok(self.state.lock().await.campaigns.get(&id).cloned())
    }

    async fn record_donation(&self, new: NewDonation) -> Result<LedgerWrite, PlatformError> {
        let mut state = self.state.lock().await;

        let Some(mut campaign) = state.campaigns.get(&new.campaign_id).cloned() else {
            return Err(PlatformError::CampaignMissing {
                campaign_id: new.campaign_id,
                intent_id: new.payment_id,
            });
        };

        if let Some(existing) = state
            .donations
            .iter()
            .find(|d| d.payment_id == new.payment_id)
        {
            return Ok(LedgerWrite::AlreadyRecorded(existing.clone()));
        }

        state.next_donation_id += 1;
        let now = Utc::now();
        let donation = Donation {
            id: DonationId::new(state.next_donation_id),
            amount: new.amount,
            currency: new.currency,
            status: new.status,
            payment_id: new.payment_id,
            is_anonymous: new.is_anonymous,
            message: new.message,
            donor_id: new.donor_id,
            campaign_id: new.campaign_id,
            created_at: now,
        };

        let mut reached_target = false;
        if donation.is_completed() {
            reached_target = campaign.apply_donation(donation.amount, now);
            state.campaigns.insert(campaign.id, campaign.clone());
        }
        state.donations.push(donation.clone());

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
        let state = self.state.lock().await;
        let matching = state
            .donations
            .iter()
            .filter(|d| d.campaign_id == campaign_id && d.is_publicly_listed())
            .cloned()
            .collect();
        Ok(newest_first(matching, page))
    }

    async fn donor_donations(
        &self,
        donor_id: UserId,
        page: Page,
    ) -> Result<Vec<Donation>, PlatformError> {
        let state = self.state.lock().await;
        let matching = state
            .donations
            .iter()
            .filter(|d| d.donor_id == Some(donor_id) && d.is_completed())
            .cloned()
            .collect();
        Ok(newest_first(matching, page))
    }

    async fn campaign_stats(
        &self,
        campaign_id: CampaignId,
        recent_since: DateTime<Utc>,
    ) -> Result<DonationStats, PlatformError> {
        let state = self.state.lock().await;
        let (count, total, recent) = state
            .donations
            .iter()
            .filter(|d| d.campaign_id == campaign_id && d.is_completed())
            .fold((0_i64, Decimal::ZERO, 0_i64), |(count, total, recent), d| {
                (
                    count + 1,
                    total + d.amount,
                    recent + i64::from(d.created_at >= recent_since),
                )
            });
        Ok(DonationStats::from_totals(count, total, recent))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::DonationStatus;

    fn entry(campaign_id: CampaignId, payment_id: &str, cents: i64, status: DonationStatus) -> NewDonation {
        NewDonation {
            amount: Decimal::new(cents, 2),
            currency: "USD".to_string(),
            status,
            payment_id: IntentId::new(payment_id),
            is_anonymous: false,
            message: None,
            donor_id: Some(UserId::new(3)),
            campaign_id,
        }
    }

    #[tokio::test]
    async fn failed_entries_leave_the_total_alone() {
        let store = InMemoryStore::new();
        let campaign = store
            .insert_campaign(NewCampaign::active("Library", Decimal::new(10_000, 2)))
            .await;

        let Ok(write) = store
            .record_donation(entry(campaign.id, "pi_f", 5_000, DonationStatus::Failed))
            .await
        else {
            panic!("failed entry should be written");
        };
        assert!(matches!(write, LedgerWrite::Recorded { reached_target: false, .. }));

        let Ok(Some(after)) = store.campaign(campaign.id).await else {
            panic!("campaign should exist");
        };
        assert_eq!(after.current_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn second_write_for_an_intent_returns_the_first() {
        let store = InMemoryStore::new();
        let campaign = store
            .insert_campaign(NewCampaign::active("Library", Decimal::new(10_000, 2)))
            .await;

        let first = store
            .record_donation(entry(campaign.id, "pi_x", 1_000, DonationStatus::Completed))
            .await;
        let second = store
            .record_donation(entry(campaign.id, "pi_x", 1_000, DonationStatus::Completed))
            .await;
        let (Ok(first), Ok(LedgerWrite::AlreadyRecorded(second))) = (first, second) else {
            panic!("expected a write followed by a duplicate");
        };
        assert_eq!(first.donation().id, second.id);
        assert_eq!(store.donation_count().await, 1);
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_paged() {
        let store = InMemoryStore::new();
        let campaign = store
            .insert_campaign(NewCampaign::active("Library", Decimal::new(100_000, 2)))
            .await;
        for n in 0..5 {
            let _ = store
                .record_donation(entry(
                    campaign.id,
                    &format!("pi_{n}"),
                    100,
                    DonationStatus::Completed,
                ))
                .await;
        }
        let _ = store
            .backdate(&IntentId::new("pi_4"), Utc::now() - chrono::Duration::days(30))
            .await;

        let Ok(page) = store.public_donations(campaign.id, Page::new(0, 2)).await else {
            panic!("listing should succeed");
        };
        let ids: Vec<&str> = page.iter().map(|d| d.payment_id.as_str()).collect();
        assert_eq!(ids, vec!["pi_3", "pi_2"]);

        let Ok(tail) = store.public_donations(campaign.id, Page::new(4, 10)).await else {
            panic!("listing should succeed");
        };
        assert_eq!(tail.len(), 1);
        assert_eq!(tail.first().map(|d| d.payment_id.as_str()), Some("pi_4"));

        let Ok(mine) = store.donor_donations(UserId::new(3), Page::default()).await else {
            panic!("listing should succeed");
        };
        assert_eq!(mine.len(), 5);
    }

    #[tokio::test]
    async fn stats_count_recent_window() {
        let store = InMemoryStore::new();
        let campaign = store
            .insert_campaign(NewCampaign::active("Library", Decimal::new(100_000, 2)))
            .await;
        for (id, cents) in [("pi_a", 1_000), ("pi_b", 2_000), ("pi_c", 3_000)] {
            let _ = store
                .record_donation(entry(campaign.id, id, cents, DonationStatus::Completed))
                .await;
        }
        let _ = store
            .record_donation(entry(campaign.id, "pi_fail", 9_900, DonationStatus::Failed))
            .await;
        let _ = store
            .backdate(&IntentId::new("pi_a"), Utc::now() - chrono::Duration::days(10))
            .await;

        let since = Utc::now() - chrono::Duration::days(7);
        let Ok(stats) = store.campaign_stats(campaign.id, since).await else {
            panic!("stats should succeed");
        };
        assert_eq!(stats.total_donations, 3);
        assert_eq!(stats.total_amount, Decimal::new(6_000, 2));
        assert_eq!(stats.average_donation, Decimal::new(2_000, 2));
        assert_eq!(stats.recent_donations, 2);
    }
}
