//! In-process gateway for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CreateIntent, CreatedIntent, GatewayError, IntentStatus, PaymentGateway, PaymentIntent};
use crate::domain::IntentId;

/// Keeps intents in a map. New intents start in
/// [`IntentStatus::RequiresPaymentMethod`]; tests move them along with
/// [`InMemoryGateway::set_status`].
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    intents: RwLock<HashMap<IntentId, PaymentIntent>>,
}

impl InMemoryGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `intent` as-is, replacing any intent with the same id.
    pub async fn insert(&self, intent: PaymentIntent) {
        self.intents.write().await.insert(intent.id.clone(), intent);
    }

    /// Moves an intent to `status`, as the processor would after the
    /// customer acts. Returns `false` for unknown ids.
    pub async fn set_status(&self, intent_id: &IntentId, status: IntentStatus) -> bool {
        match self.intents.write().await.get_mut(intent_id) {
            Some(intent) => {
                intent.status = status;
                true
            }
            None => false,
        }
    }

    /// Returns a copy of a stored intent.
    pub async fn intent(&self, intent_id: &IntentId) -> Option<PaymentIntent> {
        self.intents.read().await.get(intent_id).cloned()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_intent(&self, request: CreateIntent) -> Result<CreatedIntent, GatewayError> {
        if request.amount_minor <= 0 {
            return Err(GatewayError::Rejected {
                status: 400,
                message: "amount must be positive".to_string(),
            });
        }

        let intent_id = IntentId::new(format!("pi_{}", Uuid::new_v4().simple()));
        let client_secret = format!("{intent_id}_secret_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            id: intent_id.clone(),
            amount_minor: request.amount_minor,
            currency: request.currency.to_ascii_lowercase(),
            status: IntentStatus::RequiresPaymentMethod,
            metadata: request.metadata.to_pairs().into_iter().collect(),
        };
        self.insert(intent).await;

        Ok(CreatedIntent {
            intent_id,
            client_secret,
        })
    }

    async fn retrieve_intent(&self, intent_id: &IntentId) -> Result<PaymentIntent, GatewayError> {
        self.intent(intent_id)
            .await
            .ok_or_else(|| GatewayError::IntentNotFound(intent_id.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::CampaignId;
    use crate::gateway::IntentMetadata;

    fn request(amount_minor: i64) -> CreateIntent {
        CreateIntent {
            amount_minor,
            currency: "USD".to_string(),
            metadata: IntentMetadata {
                campaign_id: CampaignId::new(1),
                donor_email: None,
                donor_name: None,
                donor_id: None,
                is_anonymous: false,
                message: None,
            },
            receipt_email: None,
            description: "Donation for Campaign #1".to_string(),
        }
    }

    #[tokio::test]
    async fn created_intent_can_be_retrieved_and_advanced() {
        let gateway = InMemoryGateway::new();
        let created = tokio_test::assert_ok!(gateway.create_intent(request(1_000)).await);
        assert!(created.client_secret.starts_with(created.intent_id.as_str()));

        assert!(gateway.set_status(&created.intent_id, IntentStatus::Succeeded).await);
        let Ok(intent) = gateway.retrieve_intent(&created.intent_id).await else {
            panic!("intent should exist");
        };
        assert_eq!(intent.status, IntentStatus::Succeeded);
        assert_eq!(intent.currency, "usd");
        assert_eq!(intent.metadata.get("campaign_id").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn unknown_intent_is_not_found() {
        let gateway = InMemoryGateway::new();
        let result = gateway.retrieve_intent(&IntentId::new("pi_nope")).await;
        assert!(matches!(result, Err(GatewayError::IntentNotFound(_))));
        assert!(!gateway.set_status(&IntentId::new("pi_nope"), IntentStatus::Canceled).await);
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let gateway = InMemoryGateway::new();
        assert!(gateway.create_intent(request(0)).await.is_err());
    }
}
