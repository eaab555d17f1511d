//! HTTP API route definitions.

use axum::routing::{delete, get};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::docs::ApiDoc;
use super::handlers::{
    create_item, delete_item, health, list_items, metrics_text, root, AppState,
};

/// Any origin, method and header, with credentials.
///
/// Credentials forbid the `*` wildcard, so the request's own values are
/// mirrored back instead.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Item endpoints, with and without the trailing slash
        .route("/items/", get(list_items).post(create_item))
        .route("/items", get(list_items).post(create_item))
        .route("/items/:item_id", delete(delete_item))
        .route("/metrics", get(metrics_text))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
