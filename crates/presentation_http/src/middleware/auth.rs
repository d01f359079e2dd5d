//! Admin API key authentication
//!
//! [`ViewerAuthLayer`] reads `Authorization: Bearer <key>` or
//! `X-API-Key: <key>` and checks it against the configured Argon2id hashes.
//! It never rejects a request: a valid key marks the caller as
//! [`Viewer::Admin`], anything else as [`Viewer::Public`]. Routes that need an
//! administrator ask for the [`AdminViewer`] extractor, which answers 401.

use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    response::Response,
};
use domain::Viewer;
use infrastructure::{ApiKeyEntry, ApiKeyVerifier};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Alternative header for clients that cannot set `Authorization`
pub const API_KEY_HEADER: &str = "x-api-key";

/// Name of the configured key that authenticated the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedKey(pub String);

/// Presented credential, if any
fn presented_key(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    let api_key = || {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    bearer
        .filter(|k| !k.is_empty())
        .or_else(|| api_key().filter(|k| !k.is_empty()))
        .map(str::to_string)
}

/// Layer resolving the caller's [`Viewer`]
#[derive(Clone, Debug)]
pub struct ViewerAuthLayer {
    verifier: Arc<ApiKeyVerifier>,
}

impl ViewerAuthLayer {
    #[must_use]
    pub fn new(verifier: ApiKeyVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Build from configured key entries; plaintext entries are skipped
    #[must_use]
    pub fn from_api_keys(entries: &[ApiKeyEntry]) -> Self {
        Self::new(ApiKeyVerifier::from_config(entries))
    }

    /// Everyone is public
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(ApiKeyVerifier::default())
    }
}

impl<S> Layer<S> for ViewerAuthLayer {
    type Service = ViewerAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ViewerAuth {
            inner,
            verifier: Arc::clone(&self.verifier),
        }
    }
}

/// Middleware service resolving the caller's [`Viewer`]
#[derive(Clone, Debug)]
pub struct ViewerAuth<S> {
    inner: S,
    verifier: Arc<ApiKeyVerifier>,
}

impl<S> Service<Request> for ViewerAuth<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let verifier = Arc::clone(&self.verifier);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let key_name = match presented_key(req.headers()) {
                Some(key) if !verifier.is_empty() => {
                    // Argon2 verification is CPU bound
                    tokio::task::spawn_blocking(move || verifier.verify(&key).map(str::to_string))
                        .await
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "API key verification task failed");
                            None
                        })
                },
                Some(_) => {
                    debug!("API key presented but none configured");
                    None
                },
                None => None,
            };

            let viewer = if let Some(name) = key_name {
                debug!(key_name = %name, "Admin API key accepted");
                req.extensions_mut().insert(AuthenticatedKey(name));
                Viewer::Admin
            } else {
                Viewer::Public
            };
            req.extensions_mut().insert(viewer);

            inner.call(req).await
        })
    }
}

/// The caller's viewer role; public when no auth layer ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrentViewer(pub Viewer);

impl<S> FromRequestParts<S> for CurrentViewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts.extensions.get::<Viewer>().copied().unwrap_or_default(),
        ))
    }
}

/// An authenticated administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminViewer {
    /// Name of the key used
    pub key_name: String,
}

impl<S> FromRequestParts<S> for AdminViewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_admin = parts
            .extensions
            .get::<Viewer>()
            .is_some_and(Viewer::is_admin);
        match parts.extensions.get::<AuthenticatedKey>() {
            Some(AuthenticatedKey(name)) if is_admin => Ok(Self {
                key_name: name.clone(),
            }),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use infrastructure::ApiKeyHasher;
    use tower::ServiceExt;

    use super::*;

    async fn viewer_handler(CurrentViewer(viewer): CurrentViewer) -> &'static str {
        if viewer.is_admin() { "admin" } else { "public" }
    }

    async fn admin_handler(admin: AdminViewer) -> String {
        admin.key_name
    }

    fn app(keys: &[(&str, &str)]) -> Router {
        let hasher = ApiKeyHasher::new();
        let entries: Vec<ApiKeyEntry> = keys
            .iter()
            .map(|(name, key)| ApiKeyEntry {
                hash: hasher.hash(key).unwrap(),
                name: (*name).to_string(),
            })
            .collect();
        Router::new()
            .route("/viewer", get(viewer_handler))
            .route("/admin", get(admin_handler))
            .layer(ViewerAuthLayer::from_api_keys(&entries))
    }

    async fn call(app: Router, uri: &str, header: Option<(&str, &str)>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn no_credentials_means_public() {
        let (status, body) = call(app(&[("ops", "sk-ops")]), "/viewer", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "public");
    }

    #[tokio::test]
    async fn bearer_key_means_admin() {
        let (_, body) = call(
            app(&[("ops", "sk-ops")]),
            "/viewer",
            Some(("authorization", "Bearer sk-ops")),
        )
        .await;
        assert_eq!(body, "admin");
    }

    #[tokio::test]
    async fn x_api_key_header_means_admin() {
        let (status, body) = call(
            app(&[("ops", "sk-ops")]),
            "/admin",
            Some(("x-api-key", "sk-ops")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ops");
    }

    #[tokio::test]
    async fn wrong_key_is_public_not_rejected() {
        let (status, body) = call(
            app(&[("ops", "sk-ops")]),
            "/viewer",
            Some(("authorization", "Bearer sk-wrong")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "public");
    }

    #[tokio::test]
    async fn admin_route_rejects_public_callers() {
        let (status, body) = call(app(&[("ops", "sk-ops")]), "/admin", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("\"error\":\"Unauthorized\""));

        let (status, _) = call(
            app(&[("ops", "sk-ops")]),
            "/admin",
            Some(("authorization", "Basic dXNlcjpwYXNz")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn no_keys_configured_means_nobody_is_admin() {
        let (status, _) = call(
            app(&[]),
            "/admin",
            Some(("authorization", "Bearer anything")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bearer_takes_precedence_over_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer first".parse().unwrap());
        headers.insert(API_KEY_HEADER, "second".parse().unwrap());
        assert_eq!(presented_key(&headers).as_deref(), Some("first"));

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(presented_key(&headers).as_deref(), Some("second"));
    }
}
