use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use clinic_records_domain::entities::Reading;
use clinic_records_domain::services::HealthMetricsServiceError;

/// Standardized error response format
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a validation error response
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self::new("storage_failure", "An unexpected error occurred")
    }

    fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "missing_patient_id" | "missing_parameter_type" | "malformed_value" | "validation_error" => {
                StatusCode::BAD_REQUEST
            }
            "forbidden" => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HealthMetricsServiceError> for ErrorResponse {
    fn from(err: HealthMetricsServiceError) -> Self {
        match err {
            // Storage details stay in the logs
            HealthMetricsServiceError::StorageFailure(detail) => {
                error!("Storage failure while serving request: {}", detail);
                Self::internal_error()
            }
            other => Self::new(other.code(), other.to_string()),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Paginated response format
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(ReadingsPage = PaginatedResponse<Reading>)]
pub struct PaginatedResponse<T> {
    /// The data items for this page
    pub data: Vec<T>,

    /// Total number of items
    pub total_count: usize,

    /// Number of items skipped
    pub offset: usize,

    /// Page size that was applied
    pub limit: usize,
}
