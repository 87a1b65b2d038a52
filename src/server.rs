//! Axum router construction.
//!
//! The [`app`] function wires the catalog and management endpoints, the
//! operational endpoints, and the middleware stack, and returns a
//! ready-to-serve [`axum::Router`].

use axum::{
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::errors::generate_request_id;
use crate::handlers::{catalog, manage, method_not_allowed};
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the albumstore API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "albumstore API",
        version = "0.1.0",
        description = "Album catalog and object management over an S3 bucket"
    ),
    paths(
        health_check,
        crate::handlers::catalog::list_albums,
        crate::handlers::manage::manage_objects,
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Catalog", description = "Album catalog"),
        (name = "Manage", description = "Object management actions"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with every route and middleware layer.
pub fn app(state: Arc<AppState>) -> Router {
    let observability = &state.config.observability;
    let cors = build_cors(&state.config.server.cors_origins);

    let mut router = Router::new()
        .route(
            "/api/s3/albums",
            get(catalog::list_albums).fallback(method_not_allowed),
        )
        .route(
            "/api/s3/manage",
            post(manage::manage_objects).fallback(method_not_allowed),
        )
        .route("/openapi.json", get(openapi_json));

    if observability.health_check {
        router = router.route("/health", get(health_check));
    }
    if observability.metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .with_state(state.clone())
        // Layer ordering: inner layers run first, outer layers wrap them.
        .layer(middleware::from_fn(common_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // metrics_middleware is outermost (captures full request lifecycle).
        .layer(middleware::from_fn(metrics_middleware))
}

/// CORS policy: `*` allows any origin, otherwise only the listed ones.
fn build_cors(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|origin| origin == "*") {
        layer.allow_origin(Any)
    } else {
        let list = origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect::<Vec<_>>();
        layer.allow_origin(AllowOrigin::list(list))
    }
}

// -- Common headers middleware -----------------------------------------------

/// Adds common response headers to every response:
/// - `x-request-id`: 16-character uppercase hex string, unless the error
///   renderer already set one
/// - `Date`: RFC 7231 formatted timestamp
/// - `Server`: `albumstore`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    if !headers.contains_key("x-request-id") {
        if let Ok(value) = HeaderValue::from_str(&generate_request_id()) {
            headers.insert("x-request-id", value);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    if let Ok(value) = HeaderValue::from_str(&date) {
        headers.insert("date", value);
    }
    headers.insert("server", HeaderValue::from_static("albumstore"));

    response
}

// -- Operational endpoints ----------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// `GET /openapi.json` -- The generated OpenAPI document.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// -- Tests --------------------------------------------------------------------
