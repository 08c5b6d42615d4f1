//! Gateway webhook receiver.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::StatusResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, PlatformError};

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// `POST /donations/webhook` — Receive a signed gateway event.
///
/// The raw body is verified before parsing. Verified deliveries are always
/// acknowledged so the gateway stops retrying; dispatch problems are logged.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidSignature`] or
/// [`PlatformError::Validation`] if the delivery cannot be authenticated.
#[utoipa::path(
    post,
    path = "/api/v1/donations/webhook",
    tag = "Donations",
    summary = "Gateway webhook",
    description = "Signed event callback from the payment gateway. `payment_intent.succeeded` confirms the donation, `payment_intent.payment_failed` records the failure, other event types are acknowledged and ignored.",
    request_body(content = String, content_type = "application/json", description = "Raw event payload"),
    params(("Stripe-Signature" = String, Header, description = "`t=<unix>,v1=<hex hmac>`")),
    responses(
        (status = 200, description = "Delivery acknowledged", body = StatusResponse),
        (status = 400, description = "Missing or invalid signature", body = ErrorResponse),
    )
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, PlatformError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state
        .donation_service
        .handle_webhook(&body, signature)
        .await?;
    tracing::debug!(?outcome, "webhook processed");

    Ok(Json(StatusResponse::success()))
}

/// Webhook route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/donations/webhook", post(webhook))
}
