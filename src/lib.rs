// Library root for the Visual Code Notebook API

pub mod api_doc;
pub mod client;
pub mod config;
pub mod contract;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;

use axum::{routing::get, Router};

use crate::config::Config;
use crate::contract::HEALTH_PATH;
use crate::handlers::health_check;
use crate::middleware::create_middleware_stack;

// Re-export commonly used types
pub use client::{ApiClient, ClientError};
pub use contract::HealthResponse;
pub use db::Database;
pub use error::ApiError;
pub use models::{NewNotebook, NewTag, NewUser, Notebook, NotebookChanges, NotebookTag, Tag, User};

/// Builds the router with all endpoints and middleware.
/// The HTTP surface is stateless; storage is not reachable from any route.
pub fn create_router(config: &Config) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_check))
        // `/openapi.json` and `/docs`
        .merge(api_doc::swagger_ui())
        .layer(create_middleware_stack(config.cors_allowed_origin.clone()))
}
