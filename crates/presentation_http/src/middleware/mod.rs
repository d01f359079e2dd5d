//! HTTP middleware components
//!
//! Cross-cutting layers: CORS, request ids, rate limiting and caller
//! authentication.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AdminViewer, AuthenticatedKey, CurrentViewer, ViewerAuth, ViewerAuthLayer};
pub use cors::{Cors, CorsLayer, CorsPolicy};
pub use rate_limit::{
    RateDecision, RateLimiter, RateLimiterLayer, RateLimiterState, RateLimits, RatePolicy,
    spawn_cleanup_task,
};
pub use request_id::{RequestId, RequestIdLayer};
