//! CORS middleware
//!
//! The policy is fixed at start-up. Preflight requests are answered with
//! `204 No Content` before any other layer runs; every other response gets
//! the same CORS headers appended.

use std::{
    collections::HashSet,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ORIGIN, VARY,
        },
    },
    response::Response,
};
use tower::{Layer, Service};

/// Front-end origins accepted in every environment
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:3000",
];

const ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-API-Key";
const MAX_AGE_SECS: &str = "86400";

/// Which origins may call the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    origins: HashSet<String>,
    allow_any: bool,
}

impl CorsPolicy {
    /// Default origins plus `extra`; `allow_any` echoes every origin back
    pub fn new<I, O>(extra: I, allow_any: bool) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        let mut origins: HashSet<String> = DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|o| (*o).to_string())
            .collect();
        origins.extend(
            extra
                .into_iter()
                .map(|o| {
                    let o: String = o.into();
                    o.trim().trim_end_matches('/').to_string()
                })
                .filter(|o| !o.is_empty()),
        );
        Self { origins, allow_any }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allow_any || self.origins.contains(origin)
    }

    /// Add the CORS headers for a request from `origin`
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(origin) = origin.filter(|o| o.to_str().is_ok_and(|o| self.is_allowed(o))) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }

    /// Empty `204` answer to a preflight request
    pub fn preflight(&self, origin: Option<&HeaderValue>) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        self.apply(origin, response.headers_mut());
        response
    }
}

/// Layer applying a [`CorsPolicy`]
#[derive(Debug, Clone)]
pub struct CorsLayer {
    policy: Arc<CorsPolicy>,
}

impl CorsLayer {
    pub fn new(policy: CorsPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = Cors<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Cors {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

/// Middleware service for CORS
#[derive(Debug, Clone)]
pub struct Cors<S> {
    inner: S,
    policy: Arc<CorsPolicy>,
}

impl<S> Service<Request> for Cors<S>
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

    fn call(&mut self, req: Request) -> Self::Future {
        let policy = Arc::clone(&self.policy);
        let origin = req.headers().get(ORIGIN).cloned();

        if req.method() == Method::OPTIONS {
            return Box::pin(async move { Ok(policy.preflight(origin.as_ref())) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let mut response = inner.call(req).await?;
            policy.apply(origin.as_ref(), response.headers_mut());
            Ok(response)
        })
    }
}
