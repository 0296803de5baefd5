use crate::core::{SearchError, SponsorshipError};
use crate::models::{CoordinateError, ErrorResponse};
use crate::services::{CredentialError, GeocodingError, PaymentError, PostgresError};
use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Error returned by every handler
///
/// Service errors convert into this at the HTTP boundary; the response body
/// is always an [`ErrorResponse`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn label(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Unavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("You do not own this resource".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.label().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        tracing::info!("Validation failed: {:?}", errors);
        ApiError::BadRequest(errors.to_string())
    }
}

impl From<CoordinateError> for ApiError {
    fn from(err: CoordinateError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        tracing::error!("Blocking task failed: {}", err);
        ApiError::Internal("Internal server error".to_string())
    }
}

impl From<SponsorshipError> for ApiError {
    fn from(err: SponsorshipError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<PostgresError> for ApiError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::NotFound(msg) => ApiError::NotFound(msg),
            PostgresError::Conflict(msg) => ApiError::Conflict(msg),
            PostgresError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<GeocodingError> for ApiError {
    fn from(err: GeocodingError) -> Self {
        match err {
            GeocodingError::InvalidPostalCode(_) => ApiError::BadRequest(err.to_string()),
            GeocodingError::NotFound(_) => ApiError::NotFound(err.to_string()),
            GeocodingError::Unavailable(_) => {
                tracing::warn!("Geocoding unavailable: {}", err);
                ApiError::Unavailable("Postal code lookup is unavailable".to_string())
            }
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Expired | CredentialError::InvalidToken(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            CredentialError::Hashing(_) | CredentialError::Encoding(_) => {
                tracing::error!("Credential error: {}", err);
                ApiError::Internal("Credential processing failed".to_string())
            }
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        tracing::error!("Payment gateway error: {}", err);
        match err {
            PaymentError::NotFound(msg) => ApiError::NotFound(format!("Payment not found: {}", msg)),
            _ => ApiError::Upstream("Payment gateway request failed".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(SearchError::MissingOrigin).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SponsorshipError::InvalidLimit { requested: 100, max: 50 }).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(BlockingError).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(PostgresError::Conflict("email".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(GeocodingError::NotFound("01001000".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(GeocodingError::Unavailable("timeout".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(CredentialError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(PaymentError::Unauthorized).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(PostgresError::SqlxError(sqlx::Error::RowNotFound));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Database error");
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let response = ApiError::forbidden().error_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "forbidden");
        assert_eq!(json["status_code"], 403);
    }
}
