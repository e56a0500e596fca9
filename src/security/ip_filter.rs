//! Client address allow-listing.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::security::AccessPolicy;

/// Outcome of the address check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpDecision {
    Allow,
    Deny,
}

/// Decide whether `remote` may talk to us.
///
/// An empty allow-list disables the filter. When the filter is active and the
/// peer address is unknown the request is denied.
pub fn check_client_allowed(policy: &AccessPolicy, remote: Option<IpAddr>) -> IpDecision {
    if !policy.ip_filter_enabled() {
        return IpDecision::Allow;
    }
    match remote {
        Some(ip) if policy.is_ip_allowed(ip) => IpDecision::Allow,
        _ => IpDecision::Deny,
    }
}

pub async fn ip_filter_middleware(
    State(policy): State<Arc<AccessPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match check_client_allowed(&policy, remote) {
        IpDecision::Allow => next.run(request).await,
        IpDecision::Deny => {
            tracing::warn!(
                client = ?remote,
                path = %request.uri().path(),
                "Client address not in allow-list"
            );
            metrics::record_denied("ip");
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessConfig;

    fn policy(ips: &[&str]) -> AccessPolicy {
        AccessPolicy::from_config(&AccessConfig {
            allowed_ips: ips.iter().map(|s| s.to_string()).collect(),
            ..AccessConfig::default()
        })
    }

    #[test]
    fn disabled_filter_allows_unknown_peer() {
        assert_eq!(check_client_allowed(&policy(&[]), None), IpDecision::Allow);
    }

    #[test]
    fn listed_address_allowed_others_denied() {
        let policy = policy(&["203.0.113.7"]);
        assert_eq!(
            check_client_allowed(&policy, Some("203.0.113.7".parse().unwrap())),
            IpDecision::Allow
        );
        assert_eq!(
            check_client_allowed(&policy, Some("203.0.113.8".parse().unwrap())),
            IpDecision::Deny
        );
        assert_eq!(check_client_allowed(&policy, None), IpDecision::Deny);
    }
}
