//! Bearer-token verification stage.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::security::AccessPolicy;

const SCHEME: &str = "bearer ";

/// Why a token was refused. Logged, never sent to the client.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("invalid Authorization scheme")]
    InvalidScheme,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Claims written into tokens minted by this crate (CLI `token`, tests).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Claims as read back from an incoming token. Time claims are NumericDates,
/// which may carry a fractional part.
#[derive(Debug, Deserialize)]
struct ReceivedClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    exp: Option<f64>,
    #[serde(default)]
    nbf: Option<f64>,
}

impl ReceivedClaims {
    /// `exp` and `nbf` are checked only when present, with no leeway.
    fn check_times(&self, now: f64) -> Result<(), AuthError> {
        if self.exp.is_some_and(|exp| now >= exp) {
            return Err(AuthError::Expired);
        }
        if self.nbf.is_some_and(|nbf| now < nbf) {
            return Err(AuthError::NotYetValid);
        }
        Ok(())
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Context attached to authenticated requests.
#[derive(Clone, Debug)]
pub struct Caller {
    pub subject: Option<String>,
}

/// Verify an `Authorization` header value against the policy secret.
pub fn verify_token(
    policy: &AccessPolicy,
    authorization: Option<&HeaderValue>,
) -> Result<Caller, AuthError> {
    let raw = authorization
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidScheme)?;

    let has_scheme = raw
        .get(..SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEME));
    if !has_scheme {
        return Err(AuthError::InvalidScheme);
    }
    let token = raw[SCHEME.len()..].trim();

    let data =
        jsonwebtoken::decode::<ReceivedClaims>(token, policy.decoding_key(), policy.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed(e.to_string()),
            })?;
    data.claims.check_times(now_seconds())?;

    Ok(Caller {
        subject: data.claims.sub,
    })
}

pub async fn bearer_auth_middleware(
    State(policy): State<Arc<AccessPolicy>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match verify_token(&policy, request.headers().get(header::AUTHORIZATION)) {
        Ok(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                reason = %e,
                path = %request.uri().path(),
                "Rejected bearer token"
            );
            metrics::record_denied("auth");
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessConfig;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret";

    fn policy() -> AccessPolicy {
        AccessPolicy::from_config(&AccessConfig {
            jwt_secret: SECRET.into(),
            ..AccessConfig::default()
        })
    }

    fn token(secret: &str, exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            sub: Some("ops".into()),
            exp: Some(now + exp_offset_secs),
            iat: Some(now),
            nbf: None,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn valid_token_passes_with_any_scheme_case() {
        let policy = policy();
        let token = token(SECRET, 3600);

        let caller = verify_token(&policy, Some(&header(&format!("Bearer {}", token)))).unwrap();
        assert_eq!(caller.subject.as_deref(), Some("ops"));
        assert!(verify_token(&policy, Some(&header(&format!("bEaReR  {} ", token)))).is_ok());
    }

    #[test]
    fn token_without_exp_is_accepted() {
        let claims = TokenClaims::default();
        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&policy(), Some(&header(&format!("Bearer {}", token)))).is_ok());
    }

    fn signed(claims: serde_json::Value) -> HeaderValue {
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        header(&format!("Bearer {}", token))
    }

    #[test]
    fn audience_claim_is_not_checked() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let value = signed(serde_json::json!({ "sub": "ops", "aud": "log-viewer", "exp": exp }));

        let caller = verify_token(&policy(), Some(&value)).unwrap();
        assert_eq!(caller.subject.as_deref(), Some("ops"));

        let value = signed(serde_json::json!({ "aud": ["a", "b"] }));
        assert!(verify_token(&policy(), Some(&value)).is_ok());
    }

    #[test]
    fn fractional_numeric_dates_are_honoured() {
        let now = chrono::Utc::now().timestamp() as f64;

        let live = signed(serde_json::json!({ "exp": now + 3600.5, "nbf": now - 0.25 }));
        assert!(verify_token(&policy(), Some(&live)).is_ok());

        let expired = signed(serde_json::json!({ "exp": now - 10.5 }));
        assert_eq!(verify_token(&policy(), Some(&expired)).unwrap_err(), AuthError::Expired);

        let early = signed(serde_json::json!({ "nbf": now + 600.75 }));
        assert_eq!(verify_token(&policy(), Some(&early)).unwrap_err(), AuthError::NotYetValid);
    }

    #[test]
    fn time_checks_have_no_leeway() {
        let claims = ReceivedClaims {
            sub: None,
            exp: Some(100.0),
            nbf: Some(50.0),
        };
        assert!(claims.check_times(99.9).is_ok());
        assert_eq!(claims.check_times(100.0), Err(AuthError::Expired));
        assert_eq!(claims.check_times(49.9), Err(AuthError::NotYetValid));
        assert!(claims.check_times(50.0).is_ok());
    }

    #[test]
    fn rejections_carry_a_reason() {
        let policy = policy();
        assert_eq!(verify_token(&policy, None).unwrap_err(), AuthError::MissingHeader);
        assert_eq!(
            verify_token(&policy, Some(&header("Basic dXNlcjpwYXNz"))).unwrap_err(),
            AuthError::InvalidScheme
        );
        assert_eq!(
            verify_token(&policy, Some(&header("Bear"))).unwrap_err(),
            AuthError::InvalidScheme
        );
        assert_eq!(
            verify_token(&policy, Some(&header(&format!("Bearer {}", token(SECRET, -3600)))))
                .unwrap_err(),
            AuthError::Expired
        );
        assert_eq!(
            verify_token(&policy, Some(&header(&format!("Bearer {}", token("other", 3600)))))
                .unwrap_err(),
            AuthError::InvalidSignature
        );
        assert!(matches!(
            verify_token(&policy, Some(&header("Bearer not.a.jwt"))).unwrap_err(),
            AuthError::Malformed(_)
        ));
    }
}
