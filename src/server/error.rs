//! JSON error responses.
//!
//! ```json
//! { "error": { "code": "source_not_found", "message": "Source not found: src_1" } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::github::GithubError;
use crate::storage::StoreError;
use crate::sync::SyncError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// A failed request: HTTP status plus machine-readable code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn source_not_found(id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "source_not_found",
            format!("Source not found: {id}"),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(%message, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, "not_found", msg),
            StoreError::Conflict(msg) => Self::new(StatusCode::CONFLICT, "conflict", msg),
            StoreError::Network(msg) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
            }
            StoreError::Unknown(msg) => Self::internal(msg),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        let message = err.to_string();
        match err {
            SyncError::SourceNotFound(id) => Self::source_not_found(&id),
            SyncError::WrongMode { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "wrong_source_mode", message)
            }
            SyncError::InvalidRequest(_) => Self::bad_request(message),
            SyncError::Upstream(GithubError::Status { status: 404, .. }) => {
                Self::new(StatusCode::BAD_GATEWAY, "upstream_not_found", message)
            }
            SyncError::Upstream(_) => Self::new(StatusCode::BAD_GATEWAY, "upstream", message),
            SyncError::Store(e) => e.into(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("sync task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_errors_map_to_statuses() {
        let err = ApiError::from(SyncError::SourceNotFound("src_1".into()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "source_not_found");

        let err = ApiError::from(SyncError::WrongMode {
            source_id: "src_1".into(),
            expected: "github".into(),
            actual: "link".into(),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "wrong_source_mode");

        let err = ApiError::from(SyncError::Upstream(GithubError::Status {
            status: 500,
            message: "boom".into(),
        }));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);

        let err = ApiError::from(SyncError::Store(StoreError::Conflict("dup".into())));
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
