//! REST API layer: route handlers, DTOs, identity extractors and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the root.

pub mod auth;
pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::app_state::AppState;

/// OpenAPI document for the service.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "donation-gateway",
        description = "Campaign donations and payment reconciliation"
    ),
    paths(
        handlers::donation::create_payment_intent,
        handlers::donation::confirm_payment,
        handlers::donation::campaign_donations,
        handlers::donation::my_donations,
        handlers::donation::donation_stats,
        handlers::webhook::webhook,
        handlers::system::health_handler,
    ),
    components(schemas(crate::error::ErrorResponse, crate::error::ErrorBody)),
    modifiers(&BearerAuth),
    tags(
        (name = "Donations", description = "Payment intents, reconciliation and donor listings"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());
    with_docs(router)
}

#[cfg(feature = "swagger-ui")]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router.route(
        "/api-docs/openapi.json",
        axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}
