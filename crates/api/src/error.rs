use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marquee_core::catalog::repository::CatalogError;
use marquee_core::SyncError;
use serde_json::json;

/// API error type, rendered as `{ ok: false, error, errorType }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The document store failed or refused the request.
    #[error("upstream error: {message}")]
    Upstream { status: Option<u16>, message: String },

    /// The document store returned content that is not a valid document.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut upstream_status = None;
        let (status, error_type, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "badRequest", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "methodNotAllowed",
                "Method not allowed".to_string(),
            ),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payloadTooLarge", msg)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Upstream { status, message } => {
                tracing::warn!(upstream_status = ?status, "Upstream error: {message}");
                upstream_status = status;
                (StatusCode::BAD_GATEWAY, "upstreamFailure", message)
            }
            ApiError::Decode(msg) => {
                tracing::warn!("Decode error: {msg}");
                (StatusCode::BAD_GATEWAY, "decodeFailure", msg)
            }
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "ok": false,
            "error": message,
            "errorType": error_type,
        });
        if let Some(code) = upstream_status {
            body["upstreamStatus"] = json!(code);
        }

        (status, Json(body)).into_response()
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::BadRequest(msg) => ApiError::BadRequest(msg),
            SyncError::Invalid(invalid) => ApiError::BadRequest(invalid.to_string()),
            err @ SyncError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            err @ SyncError::Upstream { .. } => ApiError::Upstream {
                status: err.upstream_status(),
                message: err.to_string(),
            },
            err @ SyncError::Decode { .. } => ApiError::Decode(err.to_string()),
            err @ SyncError::Encode { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => ApiError::NotFound(format!("movie {id} not found")),
            CatalogError::Invalid(msg) => ApiError::BadRequest(msg),
            CatalogError::Database(err) => ApiError::Database(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Request body exceeds the size limit".into())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;
