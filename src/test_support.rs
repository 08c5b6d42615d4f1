//! Shared fixtures for unit tests.

#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use secrecy::SecretString;

use crate::api::auth::Claims;
use crate::domain::{Campaign, CampaignId, FundingPolicy, IntentId, UserId};
use crate::gateway::signature::signature_header;
use crate::gateway::{InMemoryGateway, PaymentGateway, WebhookVerifier};
use crate::persistence::memory::NewCampaign;
use crate::persistence::{DonationStore, InMemoryStore};
use crate::service::DonationService;

pub(crate) const WEBHOOK_SECRET: &str = "whsec_unit_tests";

/// Amount from a count of hundredths.
pub(crate) fn cents(hundredths: i64) -> Decimal {
    Decimal::new(hundredths, 2)
}

/// A signed webhook delivery for `intent_id`, timestamped now.
pub(crate) fn signed_event(event_type: &str, intent_id: &IntentId) -> (Vec<u8>, String) {
    let payload = serde_json::json!({
        "id": format!("evt_{}", uuid::Uuid::new_v4().simple()),
        "object": "event",
        "type": event_type,
        "data": { "object": { "id": intent_id.as_str(), "object": "payment_intent" } }
    })
    .to_string()
    .into_bytes();
    let Ok(header) = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &payload) else {
        panic!("signing failed");
    };
    (payload, header)
}

/// Service wired to in-memory collaborators, with handles to both.
#[derive(Debug)]
pub(crate) struct Harness {
    pub service: Arc<DonationService>,
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<InMemoryGateway>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(FundingPolicy::active_only())
    }

    pub fn with_policy(policy: FundingPolicy) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let gateway = Arc::new(InMemoryGateway::new());
        let store_port: Arc<dyn DonationStore> = Arc::clone(&store) as Arc<dyn DonationStore>;
        let gateway_port: Arc<dyn PaymentGateway> =
            Arc::clone(&gateway) as Arc<dyn PaymentGateway>;
        let verifier = WebhookVerifier::new(
            SecretString::new(WEBHOOK_SECRET.into()),
            WebhookVerifier::DEFAULT_TOLERANCE,
        );
        Self {
            service: Arc::new(DonationService::new(store_port, gateway_port, verifier, policy)),
            store,
            gateway,
        }
    }

    pub async fn active_campaign(&self, target: Decimal, current: Decimal) -> Campaign {
        self.store
            .insert_campaign(NewCampaign {
                current_amount: current,
                ..NewCampaign::active("Community garden", target)
            })
            .await
    }

    pub async fn campaign(&self, id: CampaignId) -> Campaign {
        let Ok(Some(campaign)) = self.store.campaign(id).await else {
            panic!("campaign {id} should exist");
        };
        campaign
    }

    pub async fn total(&self, id: CampaignId) -> Decimal {
        self.campaign(id).await.current_amount
    }
}

pub(crate) const JWT_SECRET: &str = "jwt-unit-test-secret";

/// An HS256 token for `user_id`, valid for an hour.
pub(crate) fn issue_token(user_id: UserId, email: Option<&str>) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: u64::try_from(Utc::now().timestamp() + 3_600).unwrap_or(u64::MAX),
        email: email.map(str::to_string),
        name: None,
    };
    let Ok(token) = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    ) else {
        panic!("token encoding failed");
    };
    token
}
