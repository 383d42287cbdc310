use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error taxonomy shared by the dispatcher, the backends and the HTTP layer
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Backend not connected and no fallback possible
    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// Unknown resource/tool identifier or malformed argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Wrapped failure from a live backend call, carrying the original message
    #[error("Backend failure: {0}")]
    BackendFailure(String),

    /// Capability not implemented by the active backend
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn connection_unavailable(msg: impl Into<String>) -> Self {
        Self::ConnectionUnavailable(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn backend_failure(msg: impl Into<String>) -> Self {
        Self::BackendFailure(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Stable machine-readable error class
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionUnavailable(_) => "connection_unavailable",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::BackendFailure(_) => "backend_failure",
            Self::Unsupported(_) => "unsupported",
            Self::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ConnectionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::BackendFailure(_) => StatusCode::BAD_GATEWAY,
            Self::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { code: self.kind().to_string(), message: self.to_string() };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::internal_error(format!("Serialization error: {}", e))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::invalid_argument(e.to_string())
    }
}
