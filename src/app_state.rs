//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::auth::TokenVerifier;
use crate::service::DonationService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Donation service for all business logic.
    pub donation_service: Arc<DonationService>,
    /// Bearer token verification.
    pub tokens: Arc<TokenVerifier>,
}
