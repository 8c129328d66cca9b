use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use medicord_core::errors::{ApplicationError, InterfaceError};
use medicord_db::RepositoryError;
use serde::Serialize;
use tracing::warn;

use super::CORRELATION_HEADER;

/// Failure body shared by every route.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

/// A request failure carrying the status, the user-facing message and the
/// correlation id echoed back in `x-correlation-id`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    correlation_id: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, correlation_id: &str) -> Self {
        Self { status, message: message.into(), correlation_id: correlation_id.to_string() }
    }

    pub fn bad_request(message: impl Into<String>, correlation_id: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, correlation_id)
    }

    pub fn not_found(message: impl Into<String>, correlation_id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, correlation_id)
    }

    pub fn forbidden(message: impl Into<String>, correlation_id: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, correlation_id)
    }

    pub fn application(error: impl Into<ApplicationError>, correlation_id: &str) -> Self {
        Self::from(error.into().into_interface(correlation_id))
    }

    pub fn repository(error: RepositoryError, correlation_id: &str) -> Self {
        Self::application(error, correlation_id)
    }

    pub fn json_rejection(rejection: JsonRejection, correlation_id: &str) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()), correlation_id)
    }

    pub fn query_rejection(rejection: QueryRejection, correlation_id: &str) -> Self {
        Self::bad_request(format!("Invalid query string: {}", rejection.body_text()), correlation_id)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl From<InterfaceError> for ApiError {
    fn from(error: InterfaceError) -> Self {
        let status = match &error {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Internals stay in the logs.
        let message = match &error {
            InterfaceError::ServiceUnavailable { .. } | InterfaceError::Internal { .. } => {
                warn!(
                    event_name = "api.request.internal_failure",
                    correlation_id = %error.correlation_id(),
                    error = %error,
                    "request failed on a server-side dependency"
                );
                error.user_message().to_string()
            }
            _ => error.message().to_string(),
        };

        Self { status, message, correlation_id: error.correlation_id().to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(
            event_name = "api.request.failed",
            correlation_id = %self.correlation_id,
            status = self.status.as_u16(),
            message = %self.message,
            "request rejected"
        );

        (
            self.status,
            [(CORRELATION_HEADER, self.correlation_id)],
            Json(ErrorBody { success: false, message: self.message }),
        )
            .into_response()
    }
}
