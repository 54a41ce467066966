//! HTTP error responses
//!
//! Every error body has the shape `{"detail": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use taskpilot_core::{Error, StoreError};
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                detail: detail.into(),
            },
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn task_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Task not found")
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Store failure");
        Self::internal(err.to_string())
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Agent(msg) => Self::bad_request(msg),
            Error::Provider(msg) => {
                error!(error = %msg, "Completion provider failed");
                Self::new(StatusCode::BAD_GATEWAY, format!("Provider error: {}", msg))
            }
            Error::Timeout(secs) => Self::new(
                StatusCode::GATEWAY_TIMEOUT,
                format!("Request timed out after {} seconds", secs),
            ),
            Error::Store(e) => e.into(),
            other => {
                error!(error = %other, "Request failed");
                Self::internal(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(Error::Provider("down".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::from(Error::Timeout(5)).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ApiError::from(Error::Agent("empty".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(Error::Config("bad".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
