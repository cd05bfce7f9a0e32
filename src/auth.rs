use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::CourseError,
};

/// Development-only header carrying a caller id (honoured in `Env::Local`).
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// The subset of the identity provider's access-token payload this service reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the caller's user UUID.
    pub sub: Uuid,
    /// Expiration Time (exp). Always validated.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    /// Audience (aud), e.g. "authenticated".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// AuthUser
///
/// The resolved caller identity. Every course operation takes one explicitly;
/// there is no ambient request context below the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// Opaque, stable user identifier issued by the identity provider.
    pub id: Uuid,
}

/// require_caller
///
/// The authorization gate: turns an optional identity into a caller or fails
/// with `Unauthenticated`. Nothing else happens before this check.
pub fn require_caller(identity: Option<Uuid>) -> Result<AuthUser, CourseError> {
    identity
        .map(|id| AuthUser { id })
        .ok_or(CourseError::Unauthenticated)
}

/// resolve_identity
///
/// Identity service binding. Resolves a fresh identity from the request headers
/// on every call:
/// 1. In `Env::Local`, a well-formed `x-user-id` header is accepted as is.
/// 2. Otherwise a `Bearer` JWT signed with the configured secret, carrying the
///    configured audience and an unexpired `exp`, yields its `sub`.
///
/// Any failure resolves to `None`.
pub fn resolve_identity(headers: &HeaderMap, config: &AppConfig) -> Option<Uuid> {
    if config.env == Env::Local {
        let dev_id = headers
            .get(DEV_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok());
        if dev_id.is_some() {
            return dev_id;
        }
    }

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?
        .strip_prefix("Bearer ")?;

    decode_token(token, config).map(|claims| claims.sub)
}

/// Validates signature, expiry and audience. `None` on any failure.
pub fn decode_token(token: &str, config: &AppConfig) -> Option<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_audience(&[config.jwt_audience.as_str()]);

    decode::<Claims>(token, &decoding_key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// AuthUser Extractor Implementation
///
/// Lets handlers take `AuthUser` as an argument. Rejects with
/// `CourseError::Unauthenticated` (401) before any other extractor runs when it
/// is listed first.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = CourseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        require_caller(resolve_identity(&parts.headers, &config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn gate_rejects_missing_identity() {
        assert!(matches!(require_caller(None), Err(CourseError::Unauthenticated)));
        let id = Uuid::new_v4();
        assert_eq!(require_caller(Some(id)).unwrap(), AuthUser { id });
    }

    #[test]
    fn dev_header_only_counts_locally() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(DEV_USER_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        let local = AppConfig::default();
        assert_eq!(resolve_identity(&headers, &local), Some(id));

        let production = AppConfig {
            env: Env::Production,
            ..AppConfig::default()
        };
        assert_eq!(resolve_identity(&headers, &production), None);
    }

    #[test]
    fn malformed_dev_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(DEV_USER_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(resolve_identity(&headers, &AppConfig::default()), None);
    }
}
