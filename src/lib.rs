//! Todo microservice REST API.
//!
//! A small task-list service: create, list and delete items stored in a
//! PostgreSQL `items` table, plus health and information endpoints. Each
//! request opens its own database connection, runs one statement and closes
//! the connection again.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Storage and HTTP error types
//! - [`item`]: Request/response schemas
//! - [`store`]: Per-request database sessions (PostgreSQL and in-memory)
//! - [`api`]: HTTP handlers and router
//! - [`metrics`]: Prometheus counters and latency histograms
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod item;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, Result, StoreError};
