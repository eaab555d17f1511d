//! OpenAPI document served under `/docs`.

use utoipa::OpenApi;

use super::handlers;
use crate::error::ErrorResponse;
use crate::item::{Item, NewItem};

/// Generated OpenAPI description of the service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Todo microservice API",
        description = "REST API for managing a task list"
    ),
    paths(
        handlers::health,
        handlers::root,
        handlers::create_item,
        handlers::list_items,
        handlers::delete_item,
    ),
    components(schemas(
        Item,
        NewItem,
        ErrorResponse,
        handlers::HealthResponse,
        handlers::RootResponse,
        handlers::MessageResponse,
    )),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Root", description = "API information"),
        (name = "Items", description = "Task CRUD")
    )
)]
pub struct ApiDoc;
