//! Route definitions
//!
//! Every catalog route gets its own rate limit policy, applied before caller
//! authentication. Health, readiness and the OpenAPI document are unlimited.

use axum::{
    Router,
    routing::{MethodRouter, get, post, put},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    error::ApiError,
    handlers, openapi,
    middleware::{CorsLayer, CorsPolicy, RateLimits, RatePolicy, RequestIdLayer, ViewerAuthLayer},
    state::AppState,
};

/// Wrap `route` in caller authentication and then the `policy` rate limit
fn limited(
    route: MethodRouter<AppState>,
    limits: &RateLimits,
    policy: RatePolicy,
    auth: &ViewerAuthLayer,
) -> MethodRouter<AppState> {
    route
        .route_layer(auth.clone())
        .route_layer(limits.layer(policy))
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// Create the main router with all routes
pub fn create_router(state: AppState, limits: &RateLimits, auth: &ViewerAuthLayer) -> Router {
    let admin = limits.admin;

    let products = limited(
        get(handlers::products::list_products),
        limits,
        limits.products,
        auth,
    )
    .merge(limited(
        post(handlers::products::create_product),
        limits,
        admin,
        auth,
    ));

    let product = limited(
        get(handlers::products::get_product),
        limits,
        limits.product,
        auth,
    )
    .merge(limited(
        put(handlers::products::update_product)
            .patch(handlers::products::update_product)
            .delete(handlers::products::delete_product),
        limits,
        admin,
        auth,
    ));

    let categories = limited(
        get(handlers::products::list_categories),
        limits,
        limits.categories,
        auth,
    );

    Router::new()
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Catalog
        .route("/products", products)
        .route("/products/categories", categories)
        .route("/products/{id}", product)
        .merge(openapi::create_openapi_routes())
        .fallback(route_not_found)
        // Attach state
        .with_state(state)
}

/// Router plus the cross-cutting layers, as served
///
/// From the outside in: CORS (answers preflight itself), request id, access
/// log, body size limit.
pub fn create_app(state: AppState, limits: &RateLimits, auth: &ViewerAuthLayer) -> Router {
    let server = &state.config.server;
    let cors = CorsPolicy::new(
        server.allowed_origins.iter().cloned(),
        state.config.environment.is_development(),
    );
    let body_limit = server.max_body_size_json_bytes;

    create_router(state, limits, auth)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(RequestIdLayer::new())
        .layer(CorsLayer::new(cors))
}
