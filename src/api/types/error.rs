//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error categories reported in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    NotFoundError,
    ConflictError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ConflictError => write!(f, "conflict_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    param: None,
                    code: None,
                },
            },
        }
    }

    /// Name the offending request parameter
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiErrorType::AuthenticationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ApiErrorType::ConflictError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Conflict { message } => Self::conflict(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::InvalidId { message } => Self::bad_request(message).with_param("id"),
            DomainError::Unauthorized { message } => Self::unauthorized(message),
            DomainError::Configuration { message }
            | DomainError::Storage { message }
            | DomainError::Internal { message } => {
                tracing::error!(error = %message, "Request failed with server error");
                Self::internal("internal server error")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_with_param_and_code() {
        let err = ApiError::bad_request("Invalid value")
            .with_param("age")
            .with_code("invalid_age");

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.param, Some("age".to_string()));
        assert_eq!(err.response.error.code, Some("invalid_age".to_string()));
    }

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (DomainError::not_found("missing"), StatusCode::NOT_FOUND),
            (DomainError::conflict("email already taken"), StatusCode::CONFLICT),
            (DomainError::validation("no data changes found"), StatusCode::BAD_REQUEST),
            (DomainError::invalid_id("abc"), StatusCode::BAD_REQUEST),
            (DomainError::unauthorized("bad credentials"), StatusCode::UNAUTHORIZED),
            (DomainError::storage("connection reset"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::configuration("no key"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (domain_err, status) in cases {
            let api_err: ApiError = domain_err.into();
            assert_eq!(api_err.status, status);
        }
    }

    #[test]
    fn test_server_errors_do_not_leak_details() {
        let api_err: ApiError = DomainError::storage("password=hunter2 rejected").into();
        assert_eq!(api_err.response.error.message, "internal server error");
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::conflict("email already taken");
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["error"]["type"], "conflict_error");
        assert_eq!(json["error"]["message"], "email already taken");
        assert!(json["error"].get("code").is_none());
    }
}
