//! OpenAPI documentation module
//!
//! Provides the OpenAPI 3 document for the catalog API, served as JSON at
//! `/api-docs/openapi.json`.

// Allow clippy warnings from macro-generated code in utoipa derive
#![allow(clippy::needless_for_each)]

use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use crate::{handlers, state::AppState};

/// Path of the generated document
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI documentation for the product catalog
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Catalog API",
        version = "0.1.0",
        description = "Admin and storefront API for a product catalog. Reads are public and show active products only; mutations need an admin API key.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Liveness and readiness endpoints"),
        (name = "products", description = "Product listing and administration")
    ),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::list_categories,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::health::ReadinessResponse,
            handlers::health::ServiceStatus,
            handlers::products::ProductResponse,
            handlers::products::ProductListResponse,
            handlers::products::PaginationResponse,
            handlers::products::DeleteResponse,
            crate::validation::ProductPayload,
            crate::validation::CreateProductRequest,
            crate::validation::UpdateProductRequest,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
#[derive(Debug)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{
                ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme,
            };

            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
            components.add_security_scheme(
                "x_api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

/// Route serving the OpenAPI document
pub fn create_openapi_routes() -> Router<AppState> {
    Router::new().route(OPENAPI_JSON_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
