//! Access-control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → ip_filter.rs (client address allow-list)
//!     → cors.rs (origin headers, preflight answered here)
//!     → auth.rs (bearer token, attaches Caller)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Fixed order, each stage may short-circuit with a full response
//! - Fail closed: every denial is a uniform 403 with no detail
//! - Policy is immutable and shared through an Arc

pub mod auth;
pub mod cors;
pub mod ip_filter;
pub mod policy;

pub use auth::{bearer_auth_middleware, verify_token, AuthError, Caller, TokenClaims};
pub use cors::{apply_cors, cors_middleware};
pub use ip_filter::{check_client_allowed, ip_filter_middleware, IpDecision};
pub use policy::{AccessPolicy, OriginPolicy};

use axum::{middleware, Router};
use std::sync::Arc;

/// Wrap `router` in the full pipeline: IP → CORS → Auth.
pub fn protect<S>(router: Router<S>, policy: Arc<AccessPolicy>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // Layers run outermost-last: the IP filter sees the request first.
    router
        .layer(middleware::from_fn_with_state(policy.clone(), bearer_auth_middleware))
        .layer(middleware::from_fn_with_state(policy.clone(), cors_middleware))
        .layer(middleware::from_fn_with_state(policy, ip_filter_middleware))
}

/// Wrap `router` in the CORS stage only.
pub fn cors_only<S>(router: Router<S>, policy: Arc<AccessPolicy>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(policy, cors_middleware))
}
