use serde::{Deserialize, Serialize};
use crate::models::domain::{AccountKind, Company, Promotion, SearchHit};

/// Response for the proximity search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub companies: Vec<SearchHit>,
    pub page: u32,
    pub per_page: u32,
    pub total_results: usize,
    pub total_pages: u32,
    pub has_next: bool,
}

/// Response for the sponsored carousel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsoredResponse {
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyResponse {
    pub company: Company,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Account data returned after login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub kind: AccountKind,
    pub company_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: AccountSummary,
}

/// Checkout created at the payment gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceResponse {
    pub preference_id: String,
    pub init_point: Option<String>,
    pub promotion_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionResponse {
    pub promotion: Promotion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}
