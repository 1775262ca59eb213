use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Input rejected before any request leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("text input is empty")]
    EmptyText,

    #[error("uploaded file is empty")]
    EmptyFile,
}

/// What callers of the dispatcher see.
///
/// Transport, status and decoding failures all collapse into `Unavailable`;
/// the detail is only written to the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request failed")]
    Unavailable,

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// Internal cause of a failed dispatch. Logged, then mapped to `RequestError::Unavailable`.
#[derive(Debug, Error)]
pub enum DispatchFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response format error: {0}")]
    Format(String),
}

impl From<serde_json::Error> for DispatchFailure {
    fn from(e: serde_json::Error) -> Self {
        DispatchFailure::Format(e.to_string())
    }
}

impl From<DispatchFailure> for RequestError {
    fn from(_: DispatchFailure) -> Self {
        RequestError::Unavailable
    }
}

/// Errors returned by the stub backend's handlers.
/// Implements `IntoResponse` so handlers can return `Result<T, StubError>`.
#[derive(Debug, Error)]
pub enum StubError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<axum::extract::multipart::MultipartError> for StubError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        StubError::BadRequest(format!("malformed multipart body: {e}"))
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            StubError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg.clone(),
            ),
            StubError::BadRequest(msg) => {
                tracing::warn!("Rejected upload: {msg}");
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            StubError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_failures_collapse_to_unavailable() {
        let status = DispatchFailure::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(RequestError::from(status), RequestError::Unavailable);

        let format = DispatchFailure::Format("expected object".into());
        assert_eq!(RequestError::from(format), RequestError::Unavailable);
    }

    #[test]
    fn test_unavailable_message_has_no_detail() {
        assert_eq!(RequestError::Unavailable.to_string(), "request failed");
    }

    #[test]
    fn test_validation_wraps_cause() {
        let err: RequestError = ValidationError::EmptyText.into();
        assert_eq!(err, RequestError::Validation(ValidationError::EmptyText));
        assert_eq!(err.to_string(), "invalid input: text input is empty");
    }

    #[test]
    fn test_stub_validation_maps_to_422() {
        let response = StubError::Validation("text too short".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
