use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to search companies around a point
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default, alias = "radius")]
    pub radius_km: Option<f64>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub page: Option<u32>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// Request for the sponsored carousel
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SponsoredRequest {
    #[serde(default)]
    pub region: Option<String>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Individual account registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(length(min = 11))]
    pub cpf: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Company account registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterCompanyRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub company_name: String,
    #[validate(length(min = 14))]
    pub cnpj: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "zip_code")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Partial company profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1))]
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[validate(length(equal = 2))]
    pub state: Option<String>,
    #[serde(alias = "zip_code")]
    pub postal_code: Option<String>,
    pub category: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
}

/// Start paying for a promotion
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePreferenceRequest {
    pub company_id: i64,
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    #[validate(range(min = 1, max = 365))]
    #[serde(default)]
    pub duration_days: Option<i32>,
}

/// Gateway notification body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    /// The gateway sends numeric or string ids
    pub id: serde_json::Value,
}

impl WebhookData {
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
