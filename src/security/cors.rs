//! CORS policy stage.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::security::{AccessPolicy, OriginPolicy};

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Compute the CORS response headers for a request carrying `origin`.
///
/// Methods and headers are always advertised; the allow-origin header is only
/// set when the origin matches the policy.
pub fn apply_cors(policy: &AccessPolicy, origin: Option<&HeaderValue>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    match policy.origins() {
        OriginPolicy::Any => {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }
        OriginPolicy::List(allowed) => {
            if let Some(origin) = origin {
                let matches = origin
                    .to_str()
                    .map(|o| allowed.contains(o))
                    .unwrap_or(false);
                if matches {
                    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
                    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
                }
            }
        }
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers
}

pub async fn cors_middleware(
    State(policy): State<Arc<AccessPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let headers = apply_cors(&policy, request.headers().get(header::ORIGIN));

    // Preflight never reaches later stages.
    if request.method() == Method::OPTIONS {
        return (StatusCode::OK, headers).into_response();
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(headers);
    response
}
