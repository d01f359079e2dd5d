//! Product catalog HTTP presentation layer
//!
//! This crate provides the REST API for the catalog: routing, request
//! validation, rate limiting, CORS, admin authentication and the JSON
//! envelope every response is wrapped in.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::{ApiError, ApiResponse, ErrorResponse};
pub use middleware::{
    CorsLayer, CorsPolicy, RateLimits, RequestIdLayer, ViewerAuthLayer, spawn_cleanup_task,
};
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
