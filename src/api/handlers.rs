//! HTTP API handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse, Result};
use crate::item::{Item, ItemKey, ListParams, NewItem};
use crate::metrics::{self, LatencyTimer};
use crate::store::Connector;

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "backend-api";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Opens one database session per request.
    pub connector: Arc<dyn Connector>,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state around a connector.
    pub fn new(connector: impl Connector) -> Self {
        Self {
            connector: Arc::new(connector),
            metrics: None,
        }
    }

    /// Attach the Prometheus handle served at `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "healthy".
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Root information response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    /// Greeting.
    pub message: &'static str,
    /// Project name.
    pub project: &'static str,
    /// Where the interactive docs live.
    pub docs: &'static str,
}

/// Delete confirmation.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Confirmation naming the deleted id.
    pub message: String,
}

/// Health check handler - always returns 200, never touches the database.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Root handler - API information.
#[utoipa::path(
    get,
    path = "/",
    tag = "Root",
    responses((status = 200, description = "API information", body = RootResponse))
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to the Todo microservice API",
        project: "Todo microservices",
        docs: "/docs",
    })
}

/// Create an item.
#[utoipa::path(
    post,
    path = "/items/",
    tag = "Items",
    request_body = NewItem,
    responses(
        (status = 200, description = "Item created", body = Item),
        (status = 422, description = "Malformed body", body = ErrorResponse),
        (status = 500, description = "Connection or statement failure", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn create_item(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewItem>, JsonRejection>,
) -> Result<Json<Item>> {
    let _timer = LatencyTimer::new("create_item");
    let Json(new_item) = body?;

    let mut session = state
        .connector
        .connect()
        .await
        .ok_or(ApiError::ConnectionFailed)?;
    let result = session.insert_item(&new_item).await;
    session.close().await;

    let item = result.inspect_err(|e| {
        warn!(error = %e, "insert failed");
        metrics::inc_db_statement_failures();
    })?;

    info!(id = item.id, name = %item.name, "item created");
    metrics::inc_items_created();
    Ok(Json(item))
}

/// List items, newest first.
///
/// An unreachable database yields an empty list rather than an error.
#[utoipa::path(
    get,
    path = "/items/",
    tag = "Items",
    params(ListParams),
    responses(
        (status = 200, description = "Items, newest first", body = [Item]),
        (status = 422, description = "Malformed query", body = ErrorResponse),
        (status = 500, description = "Statement failure", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn list_items(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Item>>> {
    let _timer = LatencyTimer::new("list_items");
    let Query(params) = query?;
    debug!(skip = params.skip, limit = params.limit, "listing items");

    let Some(mut session) = state.connector.connect().await else {
        warn!("database not accessible, returning empty list");
        return Ok(Json(Vec::new()));
    };
    let result = session.list_items(params.skip, params.limit).await;
    session.close().await;

    let items = result.inspect_err(|e| {
        warn!(error = %e, "list failed");
        metrics::inc_db_statement_failures();
    })?;

    debug!(count = items.len(), "items listed");
    Ok(Json(items))
}

/// Delete an item by id.
#[utoipa::path(
    delete,
    path = "/items/{item_id}",
    tag = "Items",
    params(("item_id" = i64, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 404, description = "No such item", body = ErrorResponse),
        (status = 422, description = "Malformed id", body = ErrorResponse),
        (status = 500, description = "Connection or statement failure", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn delete_item(
    State(state): State<AppState>,
    path: std::result::Result<Path<ItemKey>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let _timer = LatencyTimer::new("delete_item");
    let Path(item_id) = path?;

    let mut session = state
        .connector
        .connect()
        .await
        .ok_or(ApiError::ConnectionFailed)?;
    let result = session.delete_item(item_id).await;
    session.close().await;

    let deleted = result.inspect_err(|e| {
        warn!(error = %e, "delete failed");
        metrics::inc_db_statement_failures();
    })?;

    match deleted {
        Some(id) => {
            info!(id, "item deleted");
            metrics::inc_items_deleted();
            Ok(Json(MessageResponse {
                message: format!("Item {id} deleted successfully"),
            }))
        }
        None => {
            debug!(id = item_id, "no item to delete");
            Err(ApiError::NotFound(item_id))
        }
    }
}

/// Prometheus exposition - 404 when no recorder is installed.
pub async fn metrics_text(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => {
            handle.run_upkeep();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                handle.render(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
