//! Mapping of request failures onto HTTP responses.

use super::contract::HttpValidationError;
use assist_core::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Detail returned for every failed request; the cause is only logged.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal Server Error";

/// Body of a 500 response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Why a request could not be answered.
#[derive(Debug)]
pub enum ApiError {
    /// The body did not match the request contract (422)
    Validation(HttpValidationError),

    /// A pipeline step failed (500)
    Upstream(AppError),
}

impl From<HttpValidationError> for ApiError {
    fn from(err: HttpValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::Upstream(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(err) => {
                tracing::info!("Rejected request: {} validation errors", err.detail.len());
                (StatusCode::UNPROCESSABLE_ENTITY, Json(err)).into_response()
            }
            Self::Upstream(err) => {
                if err.is_upstream() {
                    tracing::error!("Dependency failed: {}", err);
                } else {
                    tracing::error!("Internal error: {}", err);
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        detail: INTERNAL_ERROR_DETAIL.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let validation = ApiError::Validation(HttpValidationError { detail: Vec::new() });
        assert_eq!(
            validation.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let upstream = ApiError::from(AppError::Storage("down".to_string()));
        assert_eq!(
            upstream.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_failure_detail_hides_cause() {
        let err = ApiError::from(AppError::Storage(
            "Code: 60. DB::Exception: Table support.documents does not exist".to_string(),
        ));
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body, serde_json::json!({"detail": "Internal Server Error"}));
    }
}
