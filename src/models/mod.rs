// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AccountKind, AnalyticsDay, AnalyticsMetric, AnalyticsReport, AnalyticsSummary, BoundingBox,
    ChartPoint, Company, CompanyUpdate, Coordinate, CoordinateError, Location, PaymentStatus,
    Promotion, SearchHit, SearchQuery, User,
};
pub use requests::{
    CreatePreferenceRequest, LoginRequest, RegisterCompanyRequest, RegisterUserRequest,
    SearchRequest, SponsoredRequest, UpdateCompanyRequest, WebhookData, WebhookNotification,
};
pub use responses::{
    AccountSummary, AuthResponse, CompanyResponse, ErrorResponse, HealthResponse,
    MessageResponse, PreferenceResponse, PromotionResponse, SearchResponse, SponsoredResponse,
    WebhookAck,
};
