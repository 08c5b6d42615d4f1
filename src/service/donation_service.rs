//! Donation reconciliation: turns gateway intents into ledger entries and
//! campaign total adjustments.
//!
//! Every path that writes reads the intent from the gateway first and never
//! trusts a caller-supplied status. Writes go through
//! [`DonationStore::record_donation`], which is atomic and unique per
//! intent, so a direct confirmation racing a webhook delivery (or a
//! redelivered webhook) resolves to a single entry and a single increment.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::money::{from_minor_units, normalize_currency, to_minor_units};
use crate::domain::{
    CampaignId, Donation, DonationId, DonationStats, DonationStatus, DonorIdentity,
    FundingPolicy, IntentId, NewDonation, Page, UserId,
};
use crate::error::PlatformError;
use crate::gateway::{
    CreateIntent, CreatedIntent, IntentMetadata, IntentStatus, PaymentGateway, PaymentIntent,
    WebhookEventKind, WebhookVerifier,
};
use crate::persistence::{DonationStore, LedgerWrite};

/// Longest donor message accepted.
pub const MAX_MESSAGE_LEN: usize = 500;

/// Window for [`DonationStats::recent_donations`].
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// A donor's request to start a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationIntent {
    /// Campaign to donate to.
    pub campaign_id: CampaignId,
    /// Amount in major units.
    pub amount: Decimal,
    /// ISO-4217 code, any case.
    pub currency: String,
    /// Contact email for unauthenticated donors.
    pub donor_email: Option<String>,
    /// Display name for unauthenticated donors.
    pub donor_name: Option<String>,
    /// Hide the donor from public listings.
    pub is_anonymous: bool,
    /// Optional note, at most [`MAX_MESSAGE_LEN`] characters.
    pub message: Option<String>,
}

/// What a verified webhook delivery led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A succeeded intent was reconciled (or already had been).
    Confirmed {
        /// Ledger entry for the intent.
        donation_id: DonationId,
    },
    /// A failed attempt was recorded (or already had been).
    FailureRecorded {
        /// Ledger entry for the intent.
        donation_id: DonationId,
    },
    /// Event type this service does not act on.
    Ignored {
        /// Raw event type.
        event_type: String,
    },
    /// Dispatch failed; the delivery is still acknowledged.
    DispatchFailed {
        /// Raw event type.
        event_type: String,
        /// Error description.
        reason: String,
    },
}

/// Orchestrates intent creation and reconciliation.
///
/// Constructed once at startup and shared through `AppState`.
#[derive(Debug)]
pub struct DonationService {
    store: Arc<dyn DonationStore>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: WebhookVerifier,
    policy: FundingPolicy,
}

impl DonationService {
    /// Creates a new `DonationService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn DonationStore>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: WebhookVerifier,
        policy: FundingPolicy,
    ) -> Self {
        Self {
            store,
            gateway,
            verifier,
            policy,
        }
    }

    /// Creates a gateway intent for a donation.
    ///
    /// When `donor` is present its email and name take precedence over
    /// the ones in the request. Nothing is written locally.
    ///
    /// # Errors
    ///
    /// - [`PlatformError::CampaignNotFound`] if the campaign does not exist.
    /// - [`PlatformError::Validation`] if the campaign is not fundable or the
    ///   amount, currency or message is invalid.
    /// - [`PlatformError::Payment`] if the gateway call fails.
    pub async fn initiate(
        &self,
        request: DonationIntent,
        donor: Option<&DonorIdentity>,
    ) -> Result<CreatedIntent, PlatformError> {
        let campaign = self
            .store
            .campaign(request.campaign_id)
            .await?
            .ok_or(PlatformError::CampaignNotFound(request.campaign_id))?;

        if !self.policy.accepts(campaign.status) {
            return Err(PlatformError::Validation(format!(
                "campaign {} is not accepting donations (status: {})",
                campaign.id, campaign.status
            )));
        }

        let currency = normalize_currency(&request.currency)?;
        let amount_minor = to_minor_units(request.amount, &currency)?;
        let message = request
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if message
            .as_ref()
            .is_some_and(|m| m.chars().count() > MAX_MESSAGE_LEN)
        {
            return Err(PlatformError::Validation(format!(
                "message must be at most {MAX_MESSAGE_LEN} characters"
            )));
        }

        let donor_email = donor
            .and_then(|d| d.email.clone())
            .or(request.donor_email)
            .filter(|e| !e.trim().is_empty());
        let donor_name = donor
            .and_then(|d| d.name.clone())
            .or(request.donor_name)
            .filter(|n| !n.trim().is_empty());
        let receipt_email = if request.is_anonymous {
            None
        } else {
            donor_email.clone()
        };

        let create = CreateIntent {
            amount_minor,
            currency: currency.to_ascii_lowercase(),
            metadata: IntentMetadata {
                campaign_id: campaign.id,
                donor_email,
                donor_name,
                donor_id: donor.map(|d| d.user_id),
                is_anonymous: request.is_anonymous,
                message,
            },
            receipt_email,
            description: format!("Donation for Campaign #{}", campaign.id),
        };

        let created = self.gateway.create_intent(create).await.map_err(|e| {
            tracing::error!(campaign_id = %campaign.id, error = %e, "intent creation failed");
            PlatformError::from(e)
        })?;

        tracing::info!(
            campaign_id = %campaign.id,
            intent_id = %created.intent_id,
            amount_minor,
            currency = %currency,
            "payment intent created"
        );
        Ok(created)
    }

    /// Reconciles a succeeded intent into a completed ledger entry and adds
    /// its amount to the campaign total.
    ///
    /// Repeated calls return the existing entry without touching the total.
    /// `donor` attributes the entry when the caller is authenticated;
    /// otherwise the donor recorded on the intent is used.
    ///
    /// # Errors
    ///
    /// - [`PlatformError::PaymentNotSuccessful`] if the gateway reports any
    ///   status other than succeeded; nothing is written.
    /// - [`PlatformError::Payment`] if the intent is unknown or the gateway
    ///   fails.
    /// - [`PlatformError::CampaignMissing`] if the intent names a campaign
    ///   that no longer exists.
    /// - [`PlatformError::DonationConflict`] if the intent was already
    ///   recorded as failed.
    pub async fn confirm(
        &self,
        intent_id: &IntentId,
        donor: Option<UserId>,
    ) -> Result<Donation, PlatformError> {
        let intent = self.fetch_intent(intent_id).await?;
        if intent.status != IntentStatus::Succeeded {
            return Err(PlatformError::PaymentNotSuccessful(intent.status.to_string()));
        }

        let entry = ledger_entry(&intent, DonationStatus::Completed, donor)?;
        match self.write(entry).await? {
            LedgerWrite::Recorded {
                donation,
                campaign,
                reached_target,
            } => {
                tracing::info!(
                    donation_id = %donation.id,
                    intent_id = %intent_id,
                    campaign_id = %campaign.id,
                    amount = %donation.amount,
                    "donation completed"
                );
                if reached_target {
                    tracing::info!(
                        campaign_id = %campaign.id,
                        total = %campaign.current_amount,
                        target = %campaign.target_amount,
                        "campaign reached its target"
                    );
                }
                Ok(donation)
            }
            LedgerWrite::AlreadyRecorded(existing) if existing.is_completed() => {
                tracing::debug!(intent_id = %intent_id, "intent already reconciled");
                Ok(existing)
            }
            LedgerWrite::AlreadyRecorded(_) => {
                tracing::error!(
                    intent_id = %intent_id,
                    "succeeded intent was recorded as failed; funds captured but not credited"
                );
                Err(PlatformError::DonationConflict(intent_id.clone()))
            }
        }
    }

    /// Records a failed payment attempt. The campaign total is untouched and
    /// a repeated call returns the existing entry.
    ///
    /// # Errors
    ///
    /// - [`PlatformError::Validation`] if the gateway reports the intent as
    ///   succeeded; it must be confirmed instead.
    /// - [`PlatformError::Payment`] if the intent is unknown or the gateway
    ///   fails.
    /// - [`PlatformError::CampaignMissing`] if the intent names a campaign
    ///   that no longer exists.
    pub async fn record_failure(
        &self,
        intent_id: &IntentId,
        donor: Option<UserId>,
    ) -> Result<Donation, PlatformError> {
        let intent = self.fetch_intent(intent_id).await?;
        if intent.status == IntentStatus::Succeeded {
            return Err(PlatformError::Validation(format!(
                "intent {intent_id} has succeeded and cannot be recorded as failed"
            )));
        }

        let entry = ledger_entry(&intent, DonationStatus::Failed, donor)?;
        let write = self.write(entry).await?;
        match &write {
            LedgerWrite::Recorded { donation, .. } => tracing::info!(
                donation_id = %donation.id,
                intent_id = %intent_id,
                "payment failure recorded"
            ),
            LedgerWrite::AlreadyRecorded(_) => {
                tracing::debug!(intent_id = %intent_id, "failure already recorded");
            }
        }
        Ok(write.into_donation())
    }

    /// Verifies a webhook delivery and dispatches it.
    ///
    /// Once the signature checks out the delivery is acknowledged whatever
    /// dispatch yields; dispatch errors are logged and reported in the
    /// returned [`WebhookOutcome`].
    ///
    /// # Errors
    ///
    /// [`PlatformError::InvalidSignature`] or [`PlatformError::Validation`]
    /// if the delivery cannot be authenticated or parsed. Nothing is
    /// processed in that case.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, PlatformError> {
        let event = self.verifier.verify(payload, signature).inspect_err(|e| {
            tracing::warn!(error = %e, "webhook rejected");
        })?;

        let result = match &event.kind {
            WebhookEventKind::PaymentSucceeded(intent_id) => self
                .confirm(intent_id, None)
                .await
                .map(|d| WebhookOutcome::Confirmed { donation_id: d.id }),
            WebhookEventKind::PaymentFailed(intent_id) => self
                .record_failure(intent_id, None)
                .await
                .map(|d| WebhookOutcome::FailureRecorded { donation_id: d.id }),
            WebhookEventKind::Other => {
                tracing::debug!(event_id = %event.id, event_type = %event.event_type, "webhook event ignored");
                return Ok(WebhookOutcome::Ignored {
                    event_type: event.event_type,
                });
            }
        };

        Ok(result.unwrap_or_else(|e| {
            if e.is_client_error() && !e.is_consistency_error() {
                tracing::warn!(event_id = %event.id, event_type = %event.event_type, error = %e, "webhook dispatch failed");
            } else {
                tracing::error!(event_id = %event.id, event_type = %event.event_type, error = %e, "webhook dispatch failed");
            }
            WebhookOutcome::DispatchFailed {
                event_type: event.event_type.clone(),
                reason: e.to_string(),
            }
        }))
    }

    /// Completed, non-anonymous donations for a campaign, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Persistence`] on storage failure.
    pub async fn campaign_donations(
        &self,
        campaign_id: CampaignId,
        page: Page,
    ) -> Result<Vec<Donation>, PlatformError> {
        self.store.public_donations(campaign_id, page).await
    }

    /// Completed donations attributed to a donor, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Persistence`] on storage failure.
    pub async fn donor_donations(
        &self,
        donor_id: UserId,
        page: Page,
    ) -> Result<Vec<Donation>, PlatformError> {
        self.store.donor_donations(donor_id, page).await
    }

    /// Aggregates over a campaign's completed donations, counting the last
    /// [`RECENT_WINDOW_DAYS`] days as recent.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Persistence`] on storage failure.
    pub async fn campaign_stats(
        &self,
        campaign_id: CampaignId,
    ) -> Result<DonationStats, PlatformError> {
        let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        self.store.campaign_stats(campaign_id, since).await
    }

    async fn fetch_intent(&self, intent_id: &IntentId) -> Result<PaymentIntent, PlatformError> {
        if intent_id.is_blank() {
            return Err(PlatformError::Validation(
                "payment intent id is required".to_string(),
            ));
        }
        self.gateway.retrieve_intent(intent_id).await.map_err(|e| {
            tracing::error!(intent_id = %intent_id, error = %e, "intent retrieval failed");
            PlatformError::from(e)
        })
    }

    async fn write(&self, entry: NewDonation) -> Result<LedgerWrite, PlatformError> {
        self.store.record_donation(entry).await.inspect_err(|e| {
            if let PlatformError::CampaignMissing {
                campaign_id,
                intent_id,
            } = e
            {
                tracing::error!(
                    campaign_id = %campaign_id,
                    intent_id = %intent_id,
                    "intent references a campaign that no longer exists"
                );
            }
        })
    }
}

/// Builds a ledger entry from the gateway's copy of an intent.
fn ledger_entry(
    intent: &PaymentIntent,
    status: DonationStatus,
    donor: Option<UserId>,
) -> Result<NewDonation, PlatformError> {
    let metadata = IntentMetadata::from_map(&intent.metadata)?;
    let currency = normalize_currency(&intent.currency)?;
    if intent.amount_minor <= 0 {
        return Err(PlatformError::Validation(format!(
            "intent {} has a non-positive amount",
            intent.id
        )));
    }

    Ok(NewDonation {
        amount: from_minor_units(intent.amount_minor, &currency),
        currency,
        status,
        payment_id: intent.id.clone(),
        is_anonymous: metadata.is_anonymous,
        message: metadata.message,
        donor_id: donor.or(metadata.donor_id),
        campaign_id: metadata.campaign_id,
    })
}
