use crate::models::{Coordinate, Location};
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Brazilian postal codes (CEP) have eight digits
const POSTAL_CODE_LEN: usize = 8;

/// Errors from resolving a postal code
#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Invalid postal code: {0}")]
    InvalidPostalCode(String),

    #[error("Postal code not found: {0}")]
    NotFound(String),

    #[error("Postal directory unavailable: {0}")]
    Unavailable(String),
}

impl GeocodingError {
    /// Registration flows continue without a coordinate on these
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GeocodingError::NotFound(_) | GeocodingError::Unavailable(_))
    }
}

impl From<reqwest::Error> for GeocodingError {
    fn from(err: reqwest::Error) -> Self {
        GeocodingError::Unavailable(err.to_string())
    }
}

/// Raw directory answer; unknown codes come back as `{"erro": true}`
#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    #[serde(default)]
    cep: Option<String>,
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
    #[serde(default)]
    lat: Option<Value>,
    #[serde(default)]
    lon: Option<Value>,
    #[serde(default)]
    erro: Option<Value>,
}

impl DirectoryResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }

    fn into_location(self, digits: &str) -> Location {
        let latitude = self.lat.as_ref().and_then(parse_degrees);
        let longitude = self.lon.as_ref().and_then(parse_degrees);

        Location {
            postal_code: non_empty(self.cep).unwrap_or_else(|| digits.to_string()),
            address: non_empty(self.logradouro),
            city: non_empty(self.localidade),
            region: non_empty(self.uf),
            coordinate: Coordinate::from_parts(latitude, longitude),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The directory sends coordinates as numbers or as strings
fn parse_degrees(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strip formatting and check the digit count
pub fn normalize_postal_code(raw: &str) -> Result<String, GeocodingError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != POSTAL_CODE_LEN {
        return Err(GeocodingError::InvalidPostalCode(raw.to_string()));
    }
    Ok(digits)
}

/// Postal directory client
///
/// Resolves a CEP to street address, city, state and (when the directory
/// knows it) a coordinate. Successful lookups are cached.
pub struct GeocodingClient {
    base_url: String,
    client: Client,
    cache: Option<Arc<CacheManager>>,
}

impl GeocodingClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            client,
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Resolve a postal code
    ///
    /// Input is validated before any network call. Unknown codes give
    /// `NotFound`; transport problems and bad responses give `Unavailable`.
    pub async fn resolve(&self, postal_code: &str) -> Result<Location, GeocodingError> {
        let digits = normalize_postal_code(postal_code)?;
        let cache_key = CacheKey::postal_code(&digits);

        if let Some(cache) = &self.cache {
            match cache.get::<Location>(&cache_key).await {
                Ok(location) => return Ok(location),
                Err(CacheError::CacheMiss(_)) => {}
                Err(e) => tracing::warn!("Postal code cache read failed: {}", e),
            }
        }

        let url = format!("{}/{}/json/", self.base_url.trim_end_matches('/'), digits);
        tracing::debug!("Looking up postal code {}", digits);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            return Err(GeocodingError::NotFound(digits));
        }
        if !status.is_success() {
            tracing::warn!("Postal directory answered {} for {}", status, digits);
            return Err(GeocodingError::Unavailable(format!(
                "directory returned {}",
                status
            )));
        }

        let body: DirectoryResponse = response
            .json()
            .await
            .map_err(|e| GeocodingError::Unavailable(format!("invalid response: {}", e)))?;

        if body.is_error() {
            return Err(GeocodingError::NotFound(digits));
        }

        let location = body.into_location(&digits);
        if location.coordinate.is_none() {
            tracing::debug!("Postal code {} resolved without coordinates", digits);
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&cache_key, &location).await {
                tracing::warn!("Postal code cache write failed: {}", e);
            }
        }

        Ok(location)
    }
}
