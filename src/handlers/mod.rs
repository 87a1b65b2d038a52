//! HTTP handlers for the album catalog and management endpoints.

pub mod catalog;
pub mod manage;

use crate::errors::ApiError;

/// Fallback for unsupported methods on the API routes.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
