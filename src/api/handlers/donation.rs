//! Donation handlers: payment intents, confirmation, listings and stats.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::{Donor, MaybeDonor};
use crate::api::dto::{
    ConfirmPaymentResponse, CreatePaymentIntentRequest, DonationDto, DonationStatsResponse,
    PageParams, PaymentIntentResponse,
};
use crate::app_state::AppState;
use crate::domain::{CampaignId, IntentId};
use crate::error::{ErrorResponse, PlatformError};

/// `POST /donations/create-payment-intent` — Start a donation.
///
/// # Errors
///
/// Returns [`PlatformError`] if the campaign is unknown or not fundable, the
/// request is invalid, or the gateway fails.
#[utoipa::path(
    post,
    path = "/api/v1/donations/create-payment-intent",
    tag = "Donations",
    summary = "Create a payment intent",
    description = "Validates the campaign and amount, then creates a gateway intent carrying the donation details. A bearer token, if present, attributes the donation to the signed-in donor.",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Intent created", body = PaymentIntentResponse),
        (status = 400, description = "Invalid request, campaign not fundable, or gateway error", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    MaybeDonor(donor): MaybeDonor,
    Json(req): Json<CreatePaymentIntentRequest>,
) -> Result<impl IntoResponse, PlatformError> {
    let created = state
        .donation_service
        .initiate(req.into(), donor.as_ref())
        .await?;
    Ok(Json(PaymentIntentResponse::from(created)))
}

/// `POST /donations/confirm-payment/{intent_id}` — Reconcile a paid intent.
///
/// # Errors
///
/// Returns [`PlatformError`] if the intent has not succeeded or cannot be
/// reconciled.
#[utoipa::path(
    post,
    path = "/api/v1/donations/confirm-payment/{intent_id}",
    tag = "Donations",
    summary = "Confirm a payment",
    description = "Reads the intent from the gateway and, if it succeeded, records the donation and credits the campaign. Safe to call repeatedly.",
    params(("intent_id" = String, Path, description = "Gateway payment intent id")),
    responses(
        (status = 200, description = "Donation recorded", body = ConfirmPaymentResponse),
        (status = 400, description = "Payment not successful or reconciliation failed", body = ErrorResponse),
    )
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    MaybeDonor(donor): MaybeDonor,
    Path(intent_id): Path<String>,
) -> Result<impl IntoResponse, PlatformError> {
    let donation = state
        .donation_service
        .confirm(&IntentId::new(intent_id), donor.map(|d| d.user_id))
        .await?;
    Ok(Json(ConfirmPaymentResponse::from(donation)))
}

/// `GET /donations/campaign/{campaign_id}` — Public donor list.
///
/// # Errors
///
/// Returns [`PlatformError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/donations/campaign/{campaign_id}",
    tag = "Donations",
    summary = "List a campaign's donations",
    description = "Completed, non-anonymous donations, newest first.",
    params(("campaign_id" = i64, Path, description = "Campaign id"), PageParams),
    responses(
        (status = 200, description = "Donations", body = Vec<DonationDto>),
    )
)]
pub async fn campaign_donations(
    State(state): State<AppState>,
    Path(campaign_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, PlatformError> {
    let donations = state
        .donation_service
        .campaign_donations(CampaignId::new(campaign_id), params.page())
        .await?;
    Ok(Json(
        donations.into_iter().map(DonationDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /donations/my-donations` — The caller's donations.
///
/// # Errors
///
/// Returns [`PlatformError::Unauthorized`] without a valid token.
#[utoipa::path(
    get,
    path = "/api/v1/donations/my-donations",
    tag = "Donations",
    summary = "List my donations",
    description = "Completed donations attributed to the signed-in donor, newest first.",
    params(PageParams),
    responses(
        (status = 200, description = "Donations", body = Vec<DonationDto>),
        (status = 401, description = "Bearer token missing or invalid", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn my_donations(
    State(state): State<AppState>,
    Donor(donor): Donor,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, PlatformError> {
    let donations = state
        .donation_service
        .donor_donations(donor.user_id, params.page())
        .await?;
    Ok(Json(
        donations.into_iter().map(DonationDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /donations/stats/{campaign_id}` — Campaign aggregates.
///
/// # Errors
///
/// Returns [`PlatformError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/donations/stats/{campaign_id}",
    tag = "Donations",
    summary = "Donation statistics",
    description = "Count, sum and average of completed donations, plus the number made in the last 7 days.",
    params(("campaign_id" = i64, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Aggregates", body = DonationStatsResponse),
    )
)]
pub async fn donation_stats(
    State(state): State<AppState>,
    Path(campaign_id): Path<i64>,
) -> Result<impl IntoResponse, PlatformError> {
    let stats = state
        .donation_service
        .campaign_stats(CampaignId::new(campaign_id))
        .await?;
    Ok(Json(DonationStatsResponse::from(stats)))
}

/// Donation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/donations/create-payment-intent",
            post(create_payment_intent),
        )
        .route(
            "/donations/confirm-payment/{intent_id}",
            post(confirm_payment),
        )
        .route(
            "/donations/campaign/{campaign_id}",
            get(campaign_donations),
        )
        .route("/donations/my-donations", get(my_donations))
        .route("/donations/stats/{campaign_id}", get(donation_stats))
}
