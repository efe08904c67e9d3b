//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use tubescope_core::{AnalysisError, SourceError};

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Fetching the comments failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A statistic could not be computed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status and stable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Source(e) => {
                let status = match e {
                    SourceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                    SourceError::VideoNotFound { .. } => StatusCode::NOT_FOUND,
                    SourceError::CommentsUnavailable { .. } => StatusCode::FORBIDDEN,
                    SourceError::SourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    SourceError::SourceTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    SourceError::Rejected(_) => StatusCode::BAD_GATEWAY,
                    SourceError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
            ApiError::Analysis(e) => (StatusCode::SERVICE_UNAVAILABLE, e.code()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tubescope_core::Statistic;

    #[test]
    fn source_errors_map_to_statuses() {
        let cases = [
            (SourceError::InvalidArgument("empty".into()), 400, "invalid_argument"),
            (
                SourceError::VideoNotFound {
                    video_id: "x".into(),
                },
                404,
                "video_not_found",
            ),
            (
                SourceError::CommentsUnavailable {
                    video_id: "x".into(),
                },
                403,
                "comments_unavailable",
            ),
            (
                SourceError::SourceUnavailable {
                    attempts: 3,
                    reason: "503".into(),
                },
                503,
                "source_unavailable",
            ),
            (
                SourceError::SourceTimeout(Duration::from_secs(30)),
                504,
                "source_timeout",
            ),
            (SourceError::Rejected("bad key".into()), 502, "source_rejected"),
            (
                SourceError::Configuration("no key".into()),
                500,
                "source_configuration",
            ),
        ];

        for (error, status, code) in cases {
            let (actual_status, actual_code) = ApiError::from(error).status_and_code();
            assert_eq!(actual_status.as_u16(), status);
            assert_eq!(actual_code, code);
        }
    }

    #[test]
    fn analysis_error_is_service_unavailable() {
        let error = ApiError::from(AnalysisError::ClassificationUnavailable {
            statistic: Statistic::Emotion,
            reason: "missing lexicon".into(),
        });
        assert_eq!(
            error.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "classification_unavailable")
        );
    }
}
