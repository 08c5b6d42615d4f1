//! Stripe REST adapter.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{CreateIntent, CreatedIntent, GatewayError, IntentStatus, PaymentGateway, PaymentIntent};
use crate::domain::IntentId;

/// Production Stripe API root.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

/// [`PaymentGateway`] backed by the Stripe payment intents API.
///
/// Every request is bounded by the timeout given at construction; a
/// timed-out call surfaces as [`GatewayError::Transport`].
#[derive(Debug)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
}

impl StripeGateway {
    /// Creates an adapter for the given API root and secret key.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        api_base: impl Into<String>,
        secret_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: CreateIntent) -> Result<CreatedIntent, GatewayError> {
        let response = self
            .client
            .post(self.url("/payment_intents"))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&intent_form(&request))
            .send()
            .await
            .map_err(transport)?;

        let intent: StripePaymentIntent = decode(response).await?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            GatewayError::Decode(format!("intent {} has no client_secret", intent.id))
        })?;

        tracing::debug!(intent_id = %intent.id, "stripe intent created");
        Ok(CreatedIntent {
            intent_id: IntentId::new(intent.id),
            client_secret,
        })
    }

    async fn retrieve_intent(&self, intent_id: &IntentId) -> Result<PaymentIntent, GatewayError> {
        if !is_valid_reference(intent_id.as_str()) {
            return Err(GatewayError::IntentNotFound(intent_id.clone()));
        }

        let response = self
            .client
            .get(self.url(&format!("/payment_intents/{intent_id}")))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::IntentNotFound(intent_id.clone()));
        }

        let intent: StripePaymentIntent = decode(response).await?;
        Ok(PaymentIntent {
            id: IntentId::new(intent.id),
            amount_minor: intent.amount,
            currency: intent.currency,
            status: intent.status,
            metadata: intent.metadata,
        })
    }
}

/// Form fields for `POST /payment_intents`.
fn intent_form(request: &CreateIntent) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), request.amount_minor.to_string()),
        ("currency".to_string(), request.currency.to_ascii_lowercase()),
        ("description".to_string(), request.description.clone()),
    ];
    if let Some(email) = &request.receipt_email {
        form.push(("receipt_email".to_string(), email.clone()));
    }
    form.extend(
        request
            .metadata
            .to_pairs()
            .into_iter()
            .map(|(key, value)| (format!("metadata[{key}]"), value)),
    );
    form
}

/// Stripe references are `[A-Za-z0-9_]+`; anything else cannot exist and
/// must not be spliced into a URL path.
fn is_valid_reference(reference: &str) -> bool {
    !reference.is_empty()
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn transport(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Transport("request to stripe timed out".to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

async fn decode(response: reqwest::Response) -> Result<StripePaymentIntent, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<StripeErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<StripePaymentIntent>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

// Stripe API types

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    amount: i64,
    currency: String,
    status: IntentStatus,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}
