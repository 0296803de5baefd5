use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

/// A validated point on the globe, in degrees.
///
/// The only way to build one is [`Coordinate::new`], so every value in the
/// system is finite and inside the geographic ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    /// Build from two nullable columns; `None` unless both are present and valid
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).ok(),
            _ => None,
        }
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Whether an account is an individual or a company owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Company,
}

/// Registered account (individual or company owner)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub document: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A listed company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
    pub cnpj: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Owner contact email, joined from the account
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool { true }

/// Fields an owner may change on their company profile
#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub category: Option<String>,
    pub logo_url: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub region: Option<String>,
}

impl CompanyUpdate {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.description.is_none()
            && self.phone.is_none()
            && self.whatsapp.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
            && self.category.is_none()
            && self.logo_url.is_none()
            && self.coordinate.is_none()
            && self.region.is_none()
    }
}

/// Payment lifecycle of a promotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Failed,
}

impl PaymentStatus {
    /// Only `pending -> approved | failed` is allowed
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Approved)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

/// Paid sponsored placement for a company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: i64,
    pub company_id: i64,
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub amount_cents: i64,
    pub duration_days: i32,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Promotion {
    /// Active and `at` falls inside the paid window
    pub fn is_running_at(&self, at: DateTime<Utc>) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => self.is_active && start <= at && at <= end,
            _ => false,
        }
    }
}

/// Counter incremented by visitor interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsMetric {
    ProfileView,
    WhatsappClick,
}

impl AnalyticsMetric {
    pub fn column(self) -> &'static str {
        match self {
            AnalyticsMetric::ProfileView => "profile_views",
            AnalyticsMetric::WhatsappClick => "whatsapp_clicks",
        }
    }
}

/// Per-company, per-day interaction counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsDay {
    pub company_id: i64,
    pub date: NaiveDate,
    pub profile_views: i64,
    pub whatsapp_clicks: i64,
}

/// A search result: the company and how far it is from the origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub company: Company,
    pub distance_km: f64,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Validated proximity query, ready for the store and the pipeline
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub origin: Coordinate,
    pub category: Option<String>,
    pub radius_km: f64,
    pub bounding_box: BoundingBox,
}

/// Resolved postal code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub postal_code: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub coordinate: Option<Coordinate>,
}

/// One point of the dashboard chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub views: i64,
    pub clicks: i64,
}

/// Dashboard data for a company over a window of days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub total_views: i64,
    pub total_clicks: i64,
    pub click_through_rate: f64,
    pub chart_data: Vec<ChartPoint>,
    pub analytics: Vec<AnalyticsDay>,
}

/// Compact totals for a recent period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub period: String,
    pub total_views: i64,
    pub total_clicks: i64,
    pub days_with_data: i64,
    pub click_through_rate: f64,
}
