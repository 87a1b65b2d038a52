//! Catalog query handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::error;

use crate::catalog::CatalogResponse;
use crate::errors::ApiError;
use crate::AppState;

/// `GET /api/s3/albums` -- Build the album catalog from the bucket.
#[utoipa::path(
    get,
    path = "/api/s3/albums",
    tag = "Catalog",
    operation_id = "ListAlbums",
    responses(
        (status = 200, description = "Albums in prefix-listing order"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Bucket not configured or unreachable")
    )
)]
pub async fn list_albums(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let aggregator = state.catalog()?;
    // Any gateway error here is a server fault, including a not-found race.
    let albums = aggregator.build_catalog().await.map_err(|err| {
        error!("catalog build failed: {err}");
        ApiError::Storage(err)
    })?;
    Ok(Json(CatalogResponse { albums }))
}
