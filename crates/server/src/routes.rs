use axum::{
    http::{StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::errors::JsonApiError;
use crate::observability;
use crate::openapi::ApiDoc;

pub mod auth;
pub mod groups;
pub mod posts;

use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    observability::encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn not_found(uri: Uri) -> JsonApiError {
    JsonApiError::not_found(format!("no page at {}", uri.path()))
}

/// Build the full application router: public pages, login-only pages, auth and ops endpoints
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    // Public pages
    let public = Router::new()
        .route("/", get(posts::index))
        .route("/group/:slug/", get(posts::group_list))
        .route("/profile/:username/", get(posts::profile))
        .route("/posts/:post_id/", get(posts::post_detail));

    // Login required; guests are redirected by the `CurrentUser` extractor
    let authoring = Router::new()
        .route("/create/", get(posts::create_form).post(posts::create))
        .route("/posts/:post_id/edit/", get(posts::edit_form).post(posts::edit))
        .route("/admin/groups", get(groups::list).post(groups::create));

    let auth_routes = Router::new()
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/login/", post(auth::login))
        .route("/auth/logout/", post(auth::logout));

    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    public
        .merge(authoring)
        .merge(auth_routes)
        .merge(ops)
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx and transport failures
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
