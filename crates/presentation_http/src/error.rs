//! API error handling
//!
//! Every failure leaves the server as the envelope
//! `{"success": false, "error": "...", "errors": {...}}`. Internal details are
//! logged and never sent to the caller.

use std::collections::BTreeMap;

use application::ApplicationError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::middleware::rate_limit::RATE_LIMIT_REMAINING_HEADER;

/// Field path to the messages describing what is wrong with it
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Not-found error for the catalog's only resource
    pub fn product_not_found() -> Self {
        Self::NotFound("Product not found".to_string())
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            },
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Success envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failure envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human readable summary
    pub error: String,
    /// Per-field messages, present on validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            errors: None,
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Validation(errors) => {
                ErrorResponse::new("Validation failed").with_errors(errors)
            },
            Self::InvalidBody(detail) => {
                let mut errors = FieldErrors::new();
                errors.insert("body".to_string(), vec![detail]);
                ErrorResponse::new("Invalid request body").with_errors(errors)
            },
            Self::BadRequest(msg) | Self::NotFound(msg) => ErrorResponse::new(msg),
            Self::Unauthorized => ErrorResponse::new("Unauthorized"),
            Self::RateLimited { retry_after_secs } => {
                let mut response = (
                    status,
                    Json(ErrorResponse::new("Rate limit exceeded. Try again later.")),
                )
                    .into_response();
                let headers = response.headers_mut();
                headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
                headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from_static("0"));
                return response;
            },
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                ErrorResponse::new("Internal server error")
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::NotFound(_) => Self::product_not_found(),
            ApplicationError::Domain(e) => Self::BadRequest(e.to_string()),
            ApplicationError::InvalidOperation(msg) => Self::BadRequest(msg),
            ApplicationError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            let messages = fields.entry(field.to_string()).or_default();
            for error in field_errors {
                messages.push(
                    error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string),
                );
            }
        }
        Self::Validation(fields)
    }
}
