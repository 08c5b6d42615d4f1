//! Platform error types with HTTP status code mapping.
//!
//! [`PlatformError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{CampaignId, IntentId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: amount must be greater than 0",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`PlatformError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                |
/// |-----------|----------------------|----------------------------|
/// | 1000–1999 | Validation / auth    | 400 Bad Request / 401      |
/// | 2000–2999 | Campaign lookup      | 404 Not Found / 400        |
/// | 3000–3999 | Server               | 500 Internal Server Error  |
/// | 4000–4999 | Payment              | 400 Bad Request            |
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Webhook payload failed signature verification.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// A bearer token was required but missing or invalid.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Campaign with the given ID was not found.
    #[error("campaign not found: {0}")]
    CampaignNotFound(CampaignId),

    /// A gateway intent names a campaign that no longer exists.
    #[error("campaign {campaign_id} referenced by intent {intent_id} does not exist")]
    CampaignMissing {
        /// Campaign recorded in the intent metadata.
        campaign_id: CampaignId,
        /// Intent being reconciled.
        intent_id: IntentId,
    },

    /// The gateway reports the intent in a non-succeeded state.
    #[error("payment not successful; status: {0}")]
    PaymentNotSuccessful(String),

    /// The payment gateway failed or rejected the request.
    #[error("payment error: {0}")]
    Payment(String),

    /// The intent already has a ledger entry in a conflicting terminal state.
    #[error("intent {0} is already recorded as failed")]
    DonationConflict(IntentId),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidSignature(_) => 1002,
            Self::Unauthorized(_) => 1003,
            Self::CampaignNotFound(_) => 2001,
            Self::CampaignMissing { .. } => 2002,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::PaymentNotSuccessful(_) => 4001,
            Self::Payment(_) => 4002,
            Self::DonationConflict(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InvalidSignature(_)
            | Self::CampaignMissing { .. }
            | Self::PaymentNotSuccessful(_)
            | Self::Payment(_)
            | Self::DonationConflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::CampaignNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if the error stems from the data carried by the
    /// request rather than from a transient failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Returns `true` when the ledger and the gateway disagree in a way no
    /// redelivery will repair: captured funds that cannot be credited.
    #[must_use]
    pub const fn is_consistency_error(&self) -> bool {
        matches!(self, Self::CampaignMissing { .. } | Self::DonationConflict(_))
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        if matches!(self, Self::Unauthorized(_))
            && let Ok(value) = axum::http::HeaderValue::from_str("Bearer")
        {
            response
                .headers_mut()
                .insert(axum::http::header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = PlatformError::Validation("amount must be greater than 0".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
        assert!(err.is_client_error());
    }

    #[test]
    fn campaign_not_found_maps_to_404() {
        let err = PlatformError::CampaignNotFound(CampaignId::new(9));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "campaign not found: 9");
    }

    #[test]
    fn reconciliation_failures_are_bad_requests() {
        let missing = PlatformError::CampaignMissing {
            campaign_id: CampaignId::new(3),
            intent_id: IntentId::new("pi_1"),
        };
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PlatformError::PaymentNotSuccessful("canceled".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PlatformError::Payment("card_declined".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn captured_but_uncredited_payments_are_consistency_errors() {
        let conflict = PlatformError::DonationConflict(IntentId::new("pi_1"));
        assert!(conflict.is_consistency_error());
        assert!(
            PlatformError::CampaignMissing {
                campaign_id: CampaignId::new(3),
                intent_id: IntentId::new("pi_2"),
            }
            .is_consistency_error()
        );
        assert!(!PlatformError::PaymentNotSuccessful("processing".to_string()).is_consistency_error());
        assert!(!PlatformError::Validation("bad".to_string()).is_consistency_error());
    }

    #[test]
    fn persistence_is_server_error() {
        let err = PlatformError::Persistence("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_client_error());
    }

    #[test]
    fn unauthorized_response_carries_challenge() {
        let response = PlatformError::Unauthorized("missing token".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            response
                .headers()
                .contains_key(axum::http::header::WWW_AUTHENTICATE)
        );
    }

    #[test]
    fn payment_message_preserves_gateway_detail() {
        let err = PlatformError::Payment("No such payment_intent: 'pi_x'".to_string());
        assert!(err.to_string().contains("No such payment_intent"));
    }
}
