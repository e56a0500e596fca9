//! Process-wide access policy.

use std::collections::HashSet;
use std::net::IpAddr;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::config::AccessConfig;

/// How the CORS stage treats the `Origin` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// A `*` entry was configured.
    Any,
    /// Exact-match list.
    List(HashSet<String>),
}

/// Immutable access policy shared by every request.
///
/// Built once at startup from [`AccessConfig`] and handed out behind an `Arc`;
/// nothing mutates it afterwards, so concurrent reads need no locking.
pub struct AccessPolicy {
    origins: OriginPolicy,
    allowed_ips: HashSet<IpAddr>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPolicy")
            .field("origins", &self.origins)
            .field("allowed_ips", &self.allowed_ips)
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

impl AccessPolicy {
    /// Build the policy. Unparseable addresses are skipped with a warning;
    /// config validation rejects them before this point.
    pub fn from_config(config: &AccessConfig) -> Self {
        let origins = if config.cors_origins.iter().any(|o| o == "*") {
            OriginPolicy::Any
        } else {
            OriginPolicy::List(config.cors_origins.iter().cloned().collect())
        };

        let allowed_ips = config
            .allowed_ips
            .iter()
            .filter_map(|raw| match raw.parse::<IpAddr>() {
                Ok(ip) => Some(ip.to_canonical()),
                Err(e) => {
                    tracing::warn!(address = %raw, error = %e, "Ignoring invalid allow-list entry");
                    None
                }
            })
            .collect();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Signature only. exp/nbf may be fractional NumericDates, which the
        // decoder cannot parse, so the bearer stage checks them itself.
        // No audience is configured, so `aud` is not checked either.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            origins,
            allowed_ips,
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn origins(&self) -> &OriginPolicy {
        &self.origins
    }

    /// True when the IP allow-list is active.
    pub fn ip_filter_enabled(&self) -> bool {
        !self.allowed_ips.is_empty()
    }

    pub fn is_ip_allowed(&self, ip: IpAddr) -> bool {
        self.allowed_ips.contains(&ip.to_canonical())
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    pub(crate) fn validation(&self) -> &Validation {
        &self.validation
    }
}
