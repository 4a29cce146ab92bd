use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::controller::DesignError;
use crate::sizing::SizingError;

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No feasible layout, or ratings the sizing cannot use.
    #[error("{0}")]
    Sizing(SizingError),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Failure body shared by every endpoint
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    kind: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> String {
        match self {
            ApiError::NotFound(_) => "not_found".to_string(),
            ApiError::BadRequest(_) => "bad_request".to_string(),
            ApiError::ValidationError(_) => "validation".to_string(),
            ApiError::Sizing(e) => e.kind.to_string(),
            ApiError::InternalError(_) => "internal".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let error = match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
                kind,
            }),
        )
            .into_response()
    }
}

// Unknown identifiers in a design request are bad input, not missing resources.
impl From<DesignError> for ApiError {
    fn from(error: DesignError) -> Self {
        match error {
            DesignError::InvalidInput(msg) => ApiError::BadRequest(msg),
            DesignError::Catalog(e @ (CatalogError::ModuleNotFound(_) | CatalogError::InverterNotFound(_))) => {
                ApiError::BadRequest(e.to_string())
            }
            DesignError::Catalog(e) => ApiError::InternalError(e.to_string()),
            DesignError::Sizing(e) => ApiError::Sizing(e),
            DesignError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::ModuleNotFound(_) | CatalogError::InverterNotFound(_) => {
                ApiError::NotFound(error.to_string())
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::InternalError(error.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}
