//! Integration tests for the HTTP API over an in-memory SQLite catalog
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use application::ProductService;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum_test::{TestResponse, TestServer};
use infrastructure::{
    ApiKeyEntry, ApiKeyHasher, AppConfig, AsyncDatabase, RateLimitConfig, SqliteDatabaseHealth,
    SqliteProductRepository,
};
use presentation_http::{AppState, RateLimits, ViewerAuthLayer, routes::create_app};
use serde_json::{Value, json};

const ADMIN_KEY: &str = "sk-test-admin";

async fn create_test_server_with(rate_limit: RateLimitConfig) -> TestServer {
    let db = AsyncDatabase::in_memory()
        .await
        .expect("Failed to open database");
    db.migrate().await.expect("Failed to migrate");

    let repository = Arc::new(SqliteProductRepository::new(db.pool().clone()));
    let health = Arc::new(SqliteDatabaseHealth::new(db.pool().clone()));
    let service = ProductService::new(repository).with_database_health(health);

    let mut config = AppConfig::default();
    config.security.api_keys = vec![ApiKeyEntry {
        hash: ApiKeyHasher::new().hash(ADMIN_KEY).unwrap(),
        name: "tests".to_string(),
    }];
    config.security.rate_limit = rate_limit;

    let limits = RateLimits::from_config(&config.security.rate_limit);
    let auth = ViewerAuthLayer::from_api_keys(&config.security.api_keys);
    let app = create_app(AppState::new(service, config), &limits, &auth);

    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_server() -> TestServer {
    create_test_server_with(RateLimitConfig {
        enabled: false,
        ..RateLimitConfig::default()
    })
    .await
}

fn api_key() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(ADMIN_KEY),
    )
}

async fn create_product(server: &TestServer, body: Value) -> Value {
    let (name, value) = api_key();
    let response = server
        .post("/products")
        .add_header(name, value)
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["data"].clone()
}

async fn admin_get(server: &TestServer, path: &str) -> TestResponse {
    let (name, value) = api_key();
    server.get(path).add_header(name, value).await
}

// ============ Health Endpoint Tests ============

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let server = create_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn readiness_endpoint_checks_database() {
    let server = create_test_server().await;

    let response = server.get("/ready").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ready"], true);
    assert_eq!(body["database"]["healthy"], true);
    assert!(body["database"]["version"].as_str().unwrap().starts_with("SQLite "));
    assert!(body["database"]["responseTimeMs"].is_u64());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = create_test_server().await;

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/products"].is_object());
}

// ============ Product CRUD Tests ============

#[tokio::test]
async fn create_then_fetch_product() {
    let server = create_test_server().await;

    let created = create_product(
        &server,
        json!({
            "name": "  Ceramic Vase ",
            "price": 48,
            "costPrice": 20.5,
            "category": "Home",
            "stock": 3,
            "status": "active",
            "images": ["https://cdn.example.com/vase.jpg"]
        }),
    )
    .await;

    let id = created["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(created["name"], "Ceramic Vase");
    assert_eq!(created["price"], 48.0);
    assert_eq!(created["costPrice"], 20.5);
    assert_eq!(created["stock"], 3);
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let response = server.get(&format!("/products/{id}")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Ceramic Vase");
    assert!(body["data"].get("costPrice").is_none());
}

#[tokio::test]
async fn created_ids_are_distinct() {
    let server = create_test_server().await;

    let a = create_product(&server, json!({"name": "A", "price": 1})).await;
    let b = create_product(&server, json!({"name": "B", "price": 1})).await;

    assert_ne!(a["id"], b["id"]);
}

#[tokio::test]
async fn create_defaults_optional_fields() {
    let server = create_test_server().await;

    let created = create_product(&server, json!({"name": "Mug", "price": 9.99})).await;

    assert_eq!(created["status"], "draft");
    assert_eq!(created["stock"], 0);
    assert_eq!(created["images"], json!([]));
    assert!(created["description"].is_null());
    assert!(created["costPrice"].is_null());
}

#[tokio::test]
async fn draft_is_hidden_from_public_but_visible_to_admin() {
    let server = create_test_server().await;
    let created = create_product(&server, json!({"name": "Secret", "price": 5})).await;
    let path = format!("/products/{}", created["id"].as_str().unwrap());

    let public = server.get(&path).await;
    public.assert_status_not_found();
    let body: Value = public.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Product not found");

    admin_get(&server, &path).await.assert_status_ok();
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
    let server = create_test_server().await;
    let created = create_product(
        &server,
        json!({"name": "Lamp", "price": 30, "description": "Brass", "stock": 1}),
    )
    .await;
    let path = format!("/products/{}", created["id"].as_str().unwrap());

    let (name, value) = api_key();
    let response = server
        .patch(&path)
        .add_header(name, value)
        .json(&json!({"stock": 5}))
        .await;

    response.assert_status_ok();
    let updated: Value = response.json::<Value>()["data"].clone();
    assert_eq!(updated["stock"], 5);
    assert_eq!(updated["name"], "Lamp");
    assert_eq!(updated["description"], "Brass");
    assert_eq!(updated["price"], 30.0);
    assert_eq!(updated["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn put_with_null_clears_nullable_field() {
    let server = create_test_server().await;
    let created = create_product(
        &server,
        json!({"name": "Rug", "price": 80, "category": "Home", "costPrice": 40}),
    )
    .await;
    let path = format!("/products/{}", created["id"].as_str().unwrap());

    let (name, value) = api_key();
    let response = server
        .put(&path)
        .add_header(name, value)
        .json(&json!({"category": null, "costPrice": null}))
        .await;

    response.assert_status_ok();
    let updated: Value = response.json::<Value>()["data"].clone();
    assert!(updated["category"].is_null());
    assert!(updated["costPrice"].is_null());
    assert_eq!(updated["name"], "Rug");
}

#[tokio::test]
async fn update_unknown_product_is_not_found() {
    let server = create_test_server().await;

    let (name, value) = api_key();
    let response = server
        .patch("/products/does-not-exist")
        .add_header(name, value)
        .json(&json!({"stock": 1}))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn delete_product_then_missing() {
    let server = create_test_server().await;
    let created = create_product(&server, json!({"name": "Chair", "price": 60})).await;
    let path = format!("/products/{}", created["id"].as_str().unwrap());

    let (name, value) = api_key();
    let response = server
        .delete(&path)
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "Product deleted successfully");

    let again = server.delete(&path).add_header(name, value).await;
    again.assert_status_not_found();
}

// ============ Authentication Tests ============

#[tokio::test]
async fn mutations_require_admin_key() {
    let server = create_test_server().await;

    let response = server
        .post("/products")
        .json(&json!({"name": "Nope", "price": 1}))
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body, json!({"success": false, "error": "Unauthorized"}));

    let response = server
        .post("/products")
        .add_header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_static("Bearer wrong-key"),
        )
        .json(&json!({"name": "Nope", "price": 1}))
        .await;
    response.assert_status_unauthorized();

    server
        .delete("/products/anything")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let server = create_test_server().await;

    let response = server
        .post("/products")
        .add_header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {ADMIN_KEY}")).unwrap(),
        )
        .json(&json!({"name": "Stool", "price": 15}))
        .await;

    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn unauthorized_is_checked_before_body_validation() {
    let server = create_test_server().await;

    let response = server.post("/products").json(&json!({"price": -1})).await;

    response.assert_status_unauthorized();
}

// ============ Validation Tests ============

#[tokio::test]
async fn invalid_product_reports_field_errors() {
    let server = create_test_server().await;

    let (name, value) = api_key();
    let response = server
        .post("/products")
        .add_header(name, value)
        .json(&json!({"name": "   ", "price": 0, "status": "archived"}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation failed");
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["price"].is_array());
    assert!(body["errors"]["status"].is_array());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let server = create_test_server().await;

    let (name, value) = api_key();
    let response = server
        .post("/products")
        .add_header(name, value)
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn invalid_query_is_bad_request() {
    let server = create_test_server().await;

    let response = server.get("/products?limit=500").await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["errors"]["limit"].is_array());

    server
        .get("/products?sortBy=color")
        .await
        .assert_status_bad_request();
}

// ============ Listing Tests ============

#[tokio::test]
async fn example_vase_flow() {
    let server = create_test_server().await;
    create_product(
        &server,
        json!({"name": "Vase", "price": 48, "status": "active"}),
    )
    .await;

    let active: Value = admin_get(&server, "/products?status=active").await.json();
    let names: Vec<&str> = active["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Vase"]);

    let drafts: Value = admin_get(&server, "/products?status=draft").await.json();
    assert_eq!(drafts["data"]["products"], json!([]));
    assert_eq!(drafts["data"]["pagination"]["total"], 0);

    let categories: Value = server.get("/products/categories").await.json();
    assert_eq!(categories, json!({"success": true, "data": []}));
}

#[tokio::test]
async fn public_listing_sees_active_only() {
    let server = create_test_server().await;
    create_product(&server, json!({"name": "Live", "price": 1, "status": "active"})).await;
    create_product(&server, json!({"name": "Hidden", "price": 1})).await;

    let body: Value = server.get("/products?status=draft").await.json();

    let products = body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Live");
    assert!(products[0].get("costPrice").is_none());

    let admin: Value = admin_get(&server, "/products").await.json();
    assert_eq!(admin["data"]["pagination"]["total"], 2);
}

#[tokio::test]
async fn search_is_case_insensitive() {
    let server = create_test_server().await;
    create_product(
        &server,
        json!({"name": "Ceramic Vase", "price": 25, "status": "active"}),
    )
    .await;
    create_product(
        &server,
        json!({"name": "Oak Table", "price": 250, "status": "active", "description": "Solid OAK"}),
    )
    .await;

    let body: Value = server.get("/products?search=vase").await.json();
    let products = body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Ceramic Vase");

    let body: Value = server.get("/products?search=solid%20oak").await.json();
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn pagination_metadata_and_sorting() {
    let server = create_test_server().await;
    for (name, price) in [("A", 3), ("B", 1), ("C", 5), ("D", 2), ("E", 4)] {
        create_product(
            &server,
            json!({"name": name, "price": price, "status": "active"}),
        )
        .await;
    }

    let body: Value = server
        .get("/products?page=2&limit=2&sortBy=price&sortOrder=asc")
        .await
        .json();

    let names: Vec<&str> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["A", "E"]);
    assert_eq!(
        body["data"]["pagination"],
        json!({"page": 2, "limit": 2, "total": 5, "totalPages": 3, "hasMore": true})
    );

    let last: Value = server.get("/products?page=3&limit=2").await.json();
    assert_eq!(last["data"]["products"].as_array().unwrap().len(), 1);
    assert_eq!(last["data"]["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn categories_are_distinct_sorted_and_active_only() {
    let server = create_test_server().await;
    for (name, category, status) in [
        ("A", "Kitchen", "active"),
        ("B", "Garden", "active"),
        ("C", "Kitchen", "active"),
        ("D", "Office", "draft"),
    ] {
        create_product(
            &server,
            json!({"name": name, "price": 1, "category": category, "status": status}),
        )
        .await;
    }

    let body: Value = server.get("/products/categories").await.json();

    assert_eq!(body["data"], json!(["Garden", "Kitchen"]));
}

// ============ Boundary Tests ============

#[tokio::test]
async fn rate_limit_denies_after_max_requests() {
    let server = create_test_server_with(RateLimitConfig {
        product_max: 2,
        ..RateLimitConfig::default()
    })
    .await;
    let forwarded = (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static("203.0.113.7"),
    );

    for remaining in ["1", "0"] {
        let response = server
            .get("/products/unknown")
            .add_header(forwarded.0.clone(), forwarded.1.clone())
            .await;
        response.assert_status_not_found();
        assert_eq!(response.header("x-ratelimit-remaining"), remaining);
    }

    let response = server
        .get("/products/unknown")
        .add_header(forwarded.0.clone(), forwarded.1.clone())
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    let body: Value = response.json();
    assert_eq!(body["error"], "Rate limit exceeded. Try again later.");

    // another client has its own window
    server
        .get("/products/unknown")
        .add_header(forwarded.0, HeaderValue::from_static("198.51.100.1"))
        .await
        .assert_status_not_found();

    // health is never limited
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn preflight_is_answered_with_no_content() {
    let server = create_test_server().await;

    let response = server
        .method(Method::OPTIONS, "/products")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://localhost:5173"),
        )
        .await;

    response.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(
        response.header("access-control-allow-origin"),
        "http://localhost:5173"
    );
    assert_eq!(response.header("access-control-max-age"), "86400");
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let server = create_test_server().await;

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-42"),
        )
        .await;

    assert_eq!(response.header("x-request-id"), "req-42");
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let server = create_test_server().await;

    let response = server.get("/nope").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}
