//! # API Errors
//!
//! Every failed request answers with the same body:
//!
//! ```json
//! {"detail": {"error_type": "validation_error", "message": "...", "details": {"field": "claim"}}}
//! ```
//!
//! | error_type             | Status |
//! |------------------------|--------|
//! | `validation_error`     | 422    |
//! | `graph_error`          | 400    |
//! | `not_found`            | 404    |
//! | `database_error`       | 500 (503 when the store pool times out) |
//! | `authentication_error` | 401    |
//! | `rate_limit_error`     | 429    |

use super::pool::ACQUIRE_OPERATION;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rational_onion_core::{ErrorKind, OnionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wire name for authentication failures.
pub const AUTHENTICATION_ERROR: &str = "authentication_error";

/// Wire name for rate limit rejections.
pub const RATE_LIMIT_ERROR: &str = "rate_limit_error";

/// The `detail` object of an error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub error_type: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

/// Top-level error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

/// An error ready to be sent as an HTTP response.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    detail: ErrorDetail,
}

impl ApiError {
    fn new(
        status: StatusCode,
        error_type: &str,
        message: impl Into<String>,
        details: BTreeMap<String, String>,
    ) -> Self {
        Self {
            status,
            detail: ErrorDetail {
                error_type: error_type.to_string(),
                message: message.into(),
                details,
            },
        }
    }

    /// 401 for a missing or unknown API key.
    #[must_use]
    pub fn unauthorized(message: &str) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            AUTHENTICATION_ERROR,
            message,
            BTreeMap::new(),
        )
    }

    /// 429 once the configured rate is exceeded.
    #[must_use]
    pub fn rate_limited(limit: &str) -> Self {
        let mut details = BTreeMap::new();
        details.insert("limit".to_string(), limit.to_string());
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            RATE_LIMIT_ERROR,
            "Rate limit exceeded",
            details,
        )
    }

    /// The response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The `detail` object.
    #[must_use]
    pub fn detail(&self) -> &ErrorDetail {
        &self.detail
    }
}

/// HTTP status for an engine error.
#[must_use]
pub fn status_for(err: &OnionError) -> StatusCode {
    match err {
        OnionError::Database { operation, .. } if operation == ACQUIRE_OPERATION => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => match err.kind() {
            ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::GraphError => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl From<OnionError> for ApiError {
    fn from(err: OnionError) -> Self {
        let status = status_for(&err);
        let report = err.report();
        if status.is_server_error() {
            tracing::error!(
                error_type = %report.error_type,
                details = ?report.details,
                "{}",
                report.message
            );
        }
        Self::new(
            status,
            report.error_type.as_str(),
            report.message,
            report.details,
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::MissingJsonContentType(_) => "Request body is required".to_string(),
            other => other.body_text(),
        };
        OnionError::validation("body", message).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        OnionError::validation("query", rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rational_onion_core::NodeId;

    #[test]
    fn engine_kinds_map_to_statuses() {
        let cases = [
            (
                OnionError::validation("claim", "bad"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                OnionError::graph("cycle", BTreeMap::new()),
                StatusCode::BAD_REQUEST,
            ),
            (
                OnionError::NotFound(NodeId::new("node-1")),
                StatusCode::NOT_FOUND,
            ),
            (
                OnionError::database("insert_argument", "disk full"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                OnionError::database(ACQUIRE_OPERATION, "timed out"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{:?}", err);
        }
    }

    #[test]
    fn detail_carries_kind_and_details() {
        let err = ApiError::from(OnionError::validation("claim", "claim must not be empty"));
        assert_eq!(err.detail().error_type, "validation_error");
        assert_eq!(err.detail().message, "claim must not be empty");
        assert_eq!(
            err.detail().details.get("field").map(String::as_str),
            Some("claim")
        );
    }

    #[test]
    fn rate_limited_names_limit() {
        let err = ApiError::rate_limited("10/second");
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.detail().error_type, RATE_LIMIT_ERROR);
        assert_eq!(
            err.detail().details.get("limit").map(String::as_str),
            Some("10/second")
        );
    }
}
