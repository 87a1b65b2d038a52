//! Management action handler.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use crate::errors::ApiError;
use crate::manage::{ManageCommand, ManageOutcome};
use crate::AppState;

/// `POST /api/s3/manage` -- Run one management action.
///
/// The bucket check comes first, then the body is parsed and validated;
/// storage is only touched by a fully validated command.
#[utoipa::path(
    post,
    path = "/api/s3/manage",
    tag = "Manage",
    operation_id = "ManageObjects",
    request_body(
        content = String,
        content_type = "application/json",
        description = "`{ action, ... }` with action one of createUploadUrl, \
                       createDownloadUrl, deleteObject, renameObject, createFolder"
    ),
    responses(
        (status = 200, description = "Action-specific result"),
        (status = 400, description = "Malformed body, unsupported action, or invalid field"),
        (status = 404, description = "Object not found"),
        (status = 405, description = "Method not allowed"),
        (status = 409, description = "Folder already exists"),
        (status = 500, description = "Bucket not configured or storage failure")
    )
)]
pub async fn manage_objects(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ManageOutcome>, ApiError> {
    let manager = state.manager()?;
    let command = ManageCommand::parse(&body)?;
    let outcome = manager.execute(command).await?;
    Ok(Json(outcome))
}
