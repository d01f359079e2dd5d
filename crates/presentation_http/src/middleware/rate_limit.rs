//! Rate limiting middleware
//!
//! Fixed-window counter keyed by `"{route tag}:{client ip}"`. State lives in
//! process memory, so limits are per server instance.

use std::{
    collections::HashMap,
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use infrastructure::RateLimitConfig;
use tokio::sync::RwLock;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Header carrying the number of requests left in the current window
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Limit applied to one group of routes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RatePolicy {
    /// Key prefix separating route groups
    pub tag: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

impl RatePolicy {
    pub const fn new(tag: &'static str, max_requests: u32, window: Duration) -> Self {
        Self {
            tag,
            max_requests,
            window,
        }
    }
}

/// Outcome of one check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window closes
    pub reset_in: Duration,
}

impl RateDecision {
    /// Whole seconds until the window closes, rounded up
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs();
        if self.reset_in.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// Shared window table
#[derive(Debug, Default)]
pub struct RateLimiterState {
    windows: RwLock<HashMap<String, Window>>,
}

impl RateLimiterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request for `key` now
    pub async fn check(&self, key: &str, max_requests: u32, window: Duration) -> RateDecision {
        self.check_at(key, max_requests, window, Instant::now()).await
    }

    /// Count a request for `key` at `now`.
    ///
    /// The write lock is held for the whole read-modify-write.
    pub async fn check_at(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
        now: Instant,
    ) -> RateDecision {
        let mut windows = self.windows.write().await;

        match windows.get_mut(key) {
            Some(entry) if now <= entry.resets_at => {
                let reset_in = entry.resets_at.saturating_duration_since(now);
                if entry.count >= max_requests {
                    return RateDecision {
                        allowed: false,
                        remaining: 0,
                        reset_in,
                    };
                }
                entry.count += 1;
                RateDecision {
                    allowed: true,
                    remaining: max_requests.saturating_sub(entry.count),
                    reset_in,
                }
            },
            _ => {
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        resets_at: now + window,
                    },
                );
                RateDecision {
                    allowed: true,
                    remaining: max_requests.saturating_sub(1),
                    reset_in: window,
                }
            },
        }
    }

    /// Drop windows that closed more than `max_age` ago
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        self.cleanup_at(max_age, Instant::now()).await
    }

    async fn cleanup_at(&self, max_age: Duration, now: Instant) -> usize {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.resets_at) <= max_age);
        before - windows.len()
    }

    /// Number of tracked keys
    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.read().await.is_empty()
    }
}

/// Route policies built from configuration, sharing one window table
#[derive(Clone, Debug)]
pub struct RateLimits {
    state: Arc<RateLimiterState>,
    enabled: bool,
    /// `GET /products`
    pub products: RatePolicy,
    /// `GET /products/{id}`
    pub product: RatePolicy,
    /// `GET /products/categories`
    pub categories: RatePolicy,
    /// Mutating admin routes
    pub admin: RatePolicy,
}

impl RateLimits {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_secs.max(1));
        Self {
            state: Arc::new(RateLimiterState::new()),
            enabled: config.enabled,
            products: RatePolicy::new("products", config.products_max, window),
            product: RatePolicy::new("product", config.product_max, window),
            categories: RatePolicy::new("categories", config.categories_max, window),
            admin: RatePolicy::new("admin", config.admin_max, window),
        }
    }

    /// Layer enforcing `policy`
    pub fn layer(&self, policy: RatePolicy) -> RateLimiterLayer {
        RateLimiterLayer {
            state: Arc::clone(&self.state),
            policy,
            enabled: self.enabled,
        }
    }

    /// Window table, for the cleanup task
    #[must_use]
    pub fn state(&self) -> Arc<RateLimiterState> {
        Arc::clone(&self.state)
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Layer that applies one rate policy
#[derive(Clone, Debug)]
pub struct RateLimiterLayer {
    state: Arc<RateLimiterState>,
    policy: RatePolicy,
    enabled: bool,
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            state: Arc::clone(&self.state),
            policy: self.policy,
            enabled: self.enabled,
        }
    }
}

/// Middleware service for rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiter<S> {
    inner: S,
    state: Arc<RateLimiterState>,
    policy: RatePolicy,
    enabled: bool,
}

impl<S> Service<Request> for RateLimiter<S>
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
        let enabled = self.enabled;
        let state = Arc::clone(&self.state);
        let policy = self.policy;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !enabled {
                return inner.call(req).await;
            }

            let key = format!("{}:{}", policy.tag, client_ip(&req));
            let decision = state
                .check(&key, policy.max_requests, policy.window)
                .await;

            if !decision.allowed {
                warn!(key = %key, "Rate limit exceeded");
                return Ok(ApiError::RateLimited {
                    retry_after_secs: decision.retry_after_secs(),
                }
                .into_response());
            }

            debug!(key = %key, remaining = decision.remaining, "Rate limit check passed");
            let mut response = inner.call(req).await?;
            response.headers_mut().insert(
                RATE_LIMIT_REMAINING_HEADER,
                HeaderValue::from(decision.remaining),
            );
            Ok(response)
        })
    }
}

/// Best-effort client address: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer
fn client_ip(req: &Request) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |ConnectInfo(addr)| addr.ip().to_string())
}

/// Periodically drop expired windows so the table does not grow without bound
pub fn spawn_cleanup_task(
    state: Arc<RateLimiterState>,
    interval: Duration,
    max_age: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.cleanup(max_age).await;
            if removed > 0 {
                debug!(removed, "Rate limiter windows cleaned up");
            }
        }
    })
}
