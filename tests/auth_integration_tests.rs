use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::FromRequestParts,
    http::{Request, header},
};
use coursehub::{
    AppState, CourseError, InMemoryRepository,
    auth::{AuthUser, Claims, decode_token, resolve_identity},
    config::{AppConfig, Env},
    repository::RepositoryState,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use uuid::Uuid;

// --- Test Utilities ---

fn production_config() -> AppConfig {
    AppConfig {
        env: Env::Production,
        jwt_secret: "production-test-secret".to_string(),
        ..AppConfig::default()
    }
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn token(sub: Uuid, exp: usize, aud: &str, secret: &str) -> String {
    let claims = Claims {
        sub,
        exp,
        iat: now(),
        aud: Some(aud.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn valid_token(sub: Uuid, config: &AppConfig) -> String {
    token(sub, now() + 3600, &config.jwt_audience, &config.jwt_secret)
}

async fn extract(config: AppConfig, request: Request<()>) -> Result<AuthUser, CourseError> {
    let state = AppState::new(
        Arc::new(InMemoryRepository::new()) as RepositoryState,
        config,
    );
    let (mut parts, _) = request.into_parts();
    AuthUser::from_request_parts(&mut parts, &state).await
}

// --- Tests ---

#[tokio::test]
async fn test_valid_bearer_token_resolves_subject() {
    let config = production_config();
    let user = Uuid::new_v4();
    let request = Request::builder()
        .header(header::AUTHORIZATION, format!("Bearer {}", valid_token(user, &config)))
        .body(())
        .unwrap();

    let caller = extract(config, request).await.unwrap();
    assert_eq!(caller.id, user);
}

#[tokio::test]
async fn test_missing_header_is_unauthenticated() {
    let request = Request::builder().body(()).unwrap();
    let result = extract(production_config(), request).await;
    assert!(matches!(result, Err(CourseError::Unauthenticated)));
}

#[tokio::test]
async fn test_non_bearer_scheme_is_unauthenticated() {
    let config = production_config();
    let request = Request::builder()
        .header(
            header::AUTHORIZATION,
            format!("Token {}", valid_token(Uuid::new_v4(), &config)),
        )
        .body(())
        .unwrap();
    assert!(extract(config, request).await.is_err());
}

#[test]
fn test_expired_token_is_rejected() {
    let config = production_config();
    let expired = token(Uuid::new_v4(), now() - 3600, "authenticated", &config.jwt_secret);
    assert!(decode_token(&expired, &config).is_none());
}

#[test]
fn test_wrong_secret_is_rejected() {
    let config = production_config();
    let forged = token(Uuid::new_v4(), now() + 3600, "authenticated", "some-other-secret");
    assert!(decode_token(&forged, &config).is_none());
}

#[test]
fn test_wrong_audience_is_rejected() {
    let config = production_config();
    let foreign = token(Uuid::new_v4(), now() + 3600, "service_role", &config.jwt_secret);
    assert!(decode_token(&foreign, &config).is_none());
}

#[test]
fn test_dev_header_is_ignored_in_production() {
    let config = production_config();
    let request = Request::builder()
        .header("x-user-id", Uuid::new_v4().to_string())
        .body(())
        .unwrap();
    let (parts, _) = request.into_parts();
    assert_eq!(resolve_identity(&parts.headers, &config), None);
}

#[test]
fn test_bearer_token_also_works_locally() {
    let config = AppConfig::default();
    let user = Uuid::new_v4();
    let request = Request::builder()
        .header(header::AUTHORIZATION, format!("Bearer {}", valid_token(user, &config)))
        .body(())
        .unwrap();
    let (parts, _) = request.into_parts();
    assert_eq!(resolve_identity(&parts.headers, &config), Some(user));
}
