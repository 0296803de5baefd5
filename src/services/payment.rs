use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when talking to the payment gateway
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Gateway returned error: {0}")]
    ApiError(String),

    #[error("Payment not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid access token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// What the promotion checkout sells
#[derive(Debug, Clone)]
pub struct PreferenceItem<'a> {
    pub company_id: i64,
    pub company_name: &'a str,
    pub payer_email: &'a str,
    pub amount_cents: i64,
    pub duration_days: i32,
}

/// Checkout preference created at the gateway
#[derive(Debug, Clone)]
pub struct CheckoutPreference {
    pub id: String,
    pub init_point: Option<String>,
    /// Our reference, echoed back on every payment for this checkout
    pub external_reference: String,
}

/// Payment state as reported by the gateway
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GatewayPayment {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub external_reference: Option<String>,
}

impl GatewayPayment {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.status.as_str(), "rejected" | "cancelled")
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected payment id: {}",
            other
        ))),
    }
}

/// Reference tying a checkout back to the company that bought it
pub fn promotion_reference(company_id: i64) -> String {
    format!("promotion_{}_{}", company_id, Uuid::new_v4().simple())
}

/// Payment gateway API client
///
/// Handles:
/// - Creating checkout preferences for promotions
/// - Looking up payments reported by webhooks
pub struct PaymentClient {
    base_url: String,
    access_token: String,
    frontend_url: String,
    client: Client,
}

impl PaymentClient {
    pub fn new(
        base_url: String,
        access_token: String,
        frontend_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            access_token,
            frontend_url,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn preference_body(&self, item: &PreferenceItem<'_>, reference: &str) -> Value {
        let frontend = self.frontend_url.trim_end_matches('/');

        json!({
            "items": [{
                "title": format!("Promoção - {}", item.company_name),
                "description": format!("Impulsionar seu perfil por {} dias", item.duration_days),
                "quantity": 1,
                "currency_id": "BRL",
                "unit_price": item.amount_cents as f64 / 100.0,
            }],
            "payer": { "email": item.payer_email },
            "back_urls": {
                "success": format!("{}/payment-success", frontend),
                "failure": format!("{}/payment-failure", frontend),
                "pending": format!("{}/payment-pending", frontend),
            },
            "auto_return": "approved",
            "external_reference": reference,
            "metadata": {
                "company_id": item.company_id,
                "duration_days": item.duration_days,
            },
        })
    }

    /// Create a checkout preference for a promotion purchase
    pub async fn create_preference(
        &self,
        item: &PreferenceItem<'_>,
    ) -> Result<CheckoutPreference, PaymentError> {
        let reference = promotion_reference(item.company_id);
        let body = self.preference_body(item, &reference);

        tracing::debug!("Creating checkout preference {}", reference);

        let response = self
            .client
            .post(self.url("checkout/preferences"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PaymentError::Unauthorized);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PaymentError::ApiError(format!(
                "Failed to create preference: {} {}",
                status, detail
            )));
        }

        let json: Value = response.json().await?;

        let id = match json.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(PaymentError::InvalidResponse("Missing preference id".into())),
        };

        let init_point = json
            .get("init_point")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(CheckoutPreference {
            id,
            init_point,
            external_reference: reference,
        })
    }

    /// Fetch a payment by the id a webhook reported
    pub async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, PaymentError> {
        let url = self.url(&format!("payments/{}", urlencoding::encode(payment_id)));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(PaymentError::NotFound(payment_id.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(PaymentError::Unauthorized)
            }
            status if !status.is_success() => {
                return Err(PaymentError::ApiError(format!(
                    "Failed to fetch payment: {}",
                    status
                )))
            }
            _ => {}
        }

        let json: Value = response.json().await?;
        serde_json::from_value(json)
            .map_err(|e| PaymentError::InvalidResponse(format!("Failed to parse payment: {}", e)))
    }
}
