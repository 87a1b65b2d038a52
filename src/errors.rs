//! API error types.
//!
//! Every variant maps to a stable error code and an HTTP status.  The enum
//! implements [`axum::response::IntoResponse`] so handlers can simply
//! return `Err(ApiError::NoSuchKey { .. })`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::storage::backend::GatewayError;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Errors returned by the catalog and management endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bucket is configured for this process.
    #[error("No bucket configured; set S3_BUCKET_NAME in the environment")]
    MissingBucket,

    /// A request field is missing or invalid.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// The request body is not a JSON object.
    #[error("Malformed request body: {message}")]
    MalformedRequest { message: String },

    /// The `action` field names no supported operation.
    #[error("Unsupported action `{action}`")]
    UnsupportedAction { action: String },

    /// HTTP method not allowed for this resource.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The object does not exist.
    #[error("Object `{key}` does not exist")]
    NoSuchKey { key: String },

    /// A folder placeholder already exists.
    #[error("Folder `{folder}` already exists")]
    FolderAlreadyExists { folder: String },

    /// The storage backend failed.  The detail is logged, not returned.
    #[error("Storage backend request failed")]
    Storage(#[source] GatewayError),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Shortcut for [`ApiError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Return the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingBucket => "MissingBucket",
            ApiError::InvalidArgument { .. } => "InvalidArgument",
            ApiError::MalformedRequest { .. } => "MalformedRequest",
            ApiError::UnsupportedAction { .. } => "UnsupportedAction",
            ApiError::MethodNotAllowed => "MethodNotAllowed",
            ApiError::NoSuchKey { .. } => "NoSuchKey",
            ApiError::FolderAlreadyExists { .. } => "FolderAlreadyExists",
            ApiError::Storage(_) => "StorageError",
            ApiError::Internal(_) => "InternalError",
        }
    }

    /// Return the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingBucket => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            ApiError::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedAction { .. } => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NoSuchKey { .. } => StatusCode::NOT_FOUND,
            ApiError::FolderAlreadyExists { .. } => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for errors caused by the caller.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound { key } => ApiError::NoSuchKey { key },
            other => ApiError::Storage(other),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
    request_id: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let status = self.status_code();

        // Storage failures are logged where the action or build context is known.
        if let ApiError::Internal(source) = &self {
            error!(%request_id, "internal error: {source:#}");
        }

        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
            request_id: &request_id,
        };

        (
            status,
            [("x-request-id", request_id.clone())],
            Json(body),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_format() {
        let id = generate_request_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::MissingBucket.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::invalid("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::UnsupportedAction {
                action: "format".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::FolderAlreadyExists {
                folder: "a".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert!(ApiError::NoSuchKey { key: "k".into() }.is_client_error());
    }

    #[test]
    fn test_gateway_not_found_maps_to_no_such_key() {
        let err: ApiError = GatewayError::NotFound { key: "a.mp3".into() }.into();
        assert!(matches!(err, ApiError::NoSuchKey { ref key } if key == "a.mp3"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_gateway_backend_maps_to_storage() {
        let err: ApiError = GatewayError::Backend(anyhow::anyhow!("throttled")).into();
        assert_eq!(err.code(), "StorageError");
        // The backend detail must not leak into the client message.
        assert!(!err.to_string().contains("throttled"));
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ApiError::invalid("key is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let request_id = response
            .headers()
            .get("x-request-id")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "key is required");
        assert_eq!(body["code"], "InvalidArgument");
        assert_eq!(body["requestId"], request_id.as_str());
    }
}
