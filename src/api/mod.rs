//! HTTP API module: item CRUD, health, metrics, and docs.

pub mod docs;
pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
