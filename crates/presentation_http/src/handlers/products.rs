//! Product catalog handlers
//!
//! REST endpoints for listing, reading and administering products. Reads are
//! open to everyone with drafts hidden from public callers; mutations need an
//! admin API key.

use application::{Pagination, ProductPage};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use domain::{Product, ProductId, Viewer};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResponse},
    middleware::{AdminViewer, CurrentViewer},
    state::AppState,
    validation::{
        CreateProductRequest, ListProductsQuery, UpdateProductRequest, ValidatedJson,
        ValidatedQuery,
    },
};

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// A product as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "01928c7a-7f3e-7b4c-9d1a-3f6e2b8c4d5e",
    "name": "Ceramic Vase",
    "description": "Hand-glazed stoneware",
    "price": 29.99,
    "costPrice": 12.5,
    "images": ["https://cdn.example.com/vase.jpg"],
    "category": "Home",
    "stock": 10,
    "status": "active",
    "createdAt": "2026-01-15T09:30:00Z",
    "updatedAt": "2026-01-15T09:30:00Z"
}))]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    /// Present for administrators only; `null` when unset
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_cost_price"
    )]
    #[schema(value_type = Option<f64>, nullable)]
    pub cost_price: Option<Option<Decimal>>,
    /// Image URLs in display order
    pub images: Vec<String>,
    pub category: Option<String>,
    pub stock: u32,
    /// `draft` or `active`
    #[schema(value_type = String, example = "active")]
    pub status: domain::ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn serialize_cost_price<S: Serializer>(
    value: &Option<Option<Decimal>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float_option::serialize(&value.flatten(), serializer)
}

impl ProductResponse {
    /// Shape `product` for `viewer`; public callers never see the cost price
    pub fn from_product(product: Product, viewer: Viewer) -> Self {
        let cost_price = viewer
            .is_admin()
            .then(|| product.cost_price.map(|p| p.amount()));

        Self {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            price: product.price.amount(),
            cost_price,
            images: product.images,
            category: product.category,
            stock: product.stock,
            status: product.status,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Pagination metadata of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    /// Matching products across all pages
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        Self {
            page: p.page,
            limit: p.limit,
            total: p.total,
            total_pages: p.total_pages,
            has_more: p.has_more,
        }
    }
}

/// One page of products
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub pagination: PaginationResponse,
}

impl ProductListResponse {
    fn from_page(page: ProductPage, viewer: Viewer) -> Self {
        Self {
            products: page
                .products
                .into_iter()
                .map(|p| ProductResponse::from_product(p, viewer))
                .collect(),
            pagination: page.pagination.into(),
        }
    }
}

/// Confirmation of a deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({"message": "Product deleted successfully"}))]
pub struct DeleteResponse {
    pub message: String,
}

/// Unknown and malformed ids are both simply not found
fn product_id(raw: &str) -> Result<ProductId, ApiError> {
    ProductId::parse(raw).map_err(|_| ApiError::product_not_found())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// List products
///
/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "One page of products", body = ApiResponse<ProductListResponse>),
        (status = 400, description = "Invalid query parameters", body = crate::error::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorResponse)
    )
)]
#[instrument(skip(state, query))]
pub async fn list_products(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    ValidatedQuery(query): ValidatedQuery<ListProductsQuery>,
) -> Result<Json<ApiResponse<ProductListResponse>>, ApiError> {
    let page = state.product_service.list_products(&query, viewer).await?;

    debug!(
        returned = page.products.len(),
        total = page.pagination.total,
        "Listed products"
    );
    Ok(Json(ApiResponse::new(ProductListResponse::from_page(
        page, viewer,
    ))))
}

/// Get a product by ID
///
/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product details", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::error::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    let id = product_id(&id)?;
    let product = state.product_service.get_by_id(&id, viewer).await?;

    Ok(Json(ApiResponse::new(ProductResponse::from_product(
        product, viewer,
    ))))
}

/// Create a product
///
/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, new_product), fields(key = %admin.key_name))]
pub async fn create_product(
    State(state): State<AppState>,
    admin: AdminViewer,
    ValidatedJson(new_product): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ApiError> {
    let product = state.product_service.create(new_product).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ProductResponse::from_product(
            product,
            Viewer::Admin,
        ))),
    ))
}

/// Update a product
///
/// PUT /products/{id} and PATCH /products/{id} share partial semantics:
/// omitted fields are kept, `null` clears nullable fields.
#[utoipa::path(
    patch,
    path = "/products/{id}",
    tag = "products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, changes), fields(key = %admin.key_name))]
pub async fn update_product(
    State(state): State<AppState>,
    admin: AdminViewer,
    Path(id): Path<String>,
    ValidatedJson(changes): ValidatedJson<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    let id = product_id(&id)?;
    let product = state.product_service.update(&id, changes).await?;

    Ok(Json(ApiResponse::new(ProductResponse::from_product(
        product,
        Viewer::Admin,
    ))))
}

/// Delete a product
///
/// DELETE /products/{id}
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<DeleteResponse>),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state), fields(key = %admin.key_name))]
pub async fn delete_product(
    State(state): State<AppState>,
    admin: AdminViewer,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let id = product_id(&id)?;
    state.product_service.delete(&id).await?;

    Ok(Json(ApiResponse::new(DeleteResponse {
        message: "Product deleted successfully".to_string(),
    })))
}

/// List categories of active products
///
/// GET /products/categories
#[utoipa::path(
    get,
    path = "/products/categories",
    tag = "products",
    responses(
        (status = 200, description = "Sorted category names", body = ApiResponse<Vec<String>>),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let categories = state.product_service.list_categories().await?;
    Ok(Json(ApiResponse::new(categories)))
}
