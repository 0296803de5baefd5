// Route exports
pub mod analytics;
pub mod auth;
pub mod companies;
pub mod errors;
pub mod payments;

pub use auth::AuthenticatedUser;
pub use errors::ApiError;

use crate::core::{SearchPipeline, SponsorshipSelector};
use crate::models::HealthResponse;
use crate::services::{CredentialService, GeocodingClient, PaymentClient, PostgresClient};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

/// Page size bounds for search results
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl PageLimits {
    pub fn resolve(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_per_page)
            .clamp(1, self.max_per_page.max(1))
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub geocoder: Arc<GeocodingClient>,
    pub payments: Arc<PaymentClient>,
    pub credentials: Arc<CredentialService>,
    pub search: SearchPipeline,
    pub sponsorship: SponsorshipSelector,
    pub paging: PageLimits,
}

/// Missing companies and foreign owners both answer 403
pub(crate) async fn ensure_company_owner(
    state: &AppState,
    company_id: i64,
    user: &AuthenticatedUser,
) -> Result<(), ApiError> {
    match state.postgres.company_owner(company_id).await? {
        Some(owner) if owner == user.id => Ok(()),
        _ => Err(ApiError::forbidden()),
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(companies::configure)
            .configure(analytics::configure)
            .configure(auth::configure)
            .configure(payments::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}
