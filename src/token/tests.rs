//! Tests for the token module

use super::*;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use test_case::test_case;

fn jwt_expiring_in(seconds: i64) -> String {
    let claims = TokenClaims {
        sub: Some("user-42".to_string()),
        exp: Some((Utc::now() + Duration::seconds(seconds)).timestamp()),
        iat: Some(Utc::now().timestamp()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"server-side-secret"),
    )
    .unwrap()
}

// ============================================================================
// TokenPair
// ============================================================================

#[test]
fn test_token_pair_serde_camel_case() {
    let pair = TokenPair::new("access-1", "refresh-1");
    let json = serde_json::to_value(&pair).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"accessToken": "access-1", "refreshToken": "refresh-1"})
    );

    let parsed: TokenPair = serde_json::from_str(r#"{"accessToken": "a"}"#).unwrap();
    assert_eq!(parsed, TokenPair::access_only("a"));
}

#[test]
fn test_token_pair_logged_out_without_access_token() {
    assert!(TokenPair::new("a", "r").is_logged_in());
    assert!(!TokenPair::default().is_logged_in());
}

#[test]
fn test_with_access_token_keeps_refresh_token() {
    let pair = TokenPair::new("old", "refresh-1");
    let renewed = pair.with_access_token("new");
    assert_eq!(renewed.access_token, "new");
    assert_eq!(renewed.refresh_token(), Some("refresh-1"));
}

#[test]
fn test_empty_refresh_token_is_absent() {
    let pair = TokenPair {
        access_token: "a".to_string(),
        refresh_token: Some(String::new()),
    };
    assert_eq!(pair.refresh_token(), None);
}

// ============================================================================
// Claims and validity
// ============================================================================

#[test]
fn test_decode_claims() {
    let token = jwt_expiring_in(600);
    let claims = decode_claims(&token).unwrap();
    assert_eq!(claims.sub.as_deref(), Some("user-42"));
    assert!(claims.expires_at().unwrap() > Utc::now());
}

#[test_case(3600, true ; "expires in an hour")]
#[test_case(5, true ; "expires shortly")]
#[test_case(-5, false ; "just expired")]
#[test_case(-3600, false ; "expired an hour ago")]
fn test_is_token_valid(offset_seconds: i64, expected: bool) {
    assert_eq!(is_token_valid(&jwt_expiring_in(offset_seconds)), expected);
}

#[test]
fn test_garbage_token_is_invalid() {
    assert!(!is_token_valid("not-a-jwt"));
    assert!(!is_token_valid(""));
}

#[test]
fn test_token_without_exp_is_invalid() {
    let claims = TokenClaims {
        sub: Some("user".to_string()),
        exp: None,
        iat: None,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap();
    assert!(!is_token_valid(&token));
}

// ============================================================================
// MemoryTokenStore
// ============================================================================

#[tokio::test]
async fn test_memory_store_lifecycle() {
    let store = MemoryTokenStore::new();
    assert_eq!(store.tokens().await.unwrap(), None);
    assert_eq!(store.access_token().await.unwrap(), None);

    store
        .set_tokens(TokenPair::new("access-1", "refresh-1"))
        .await
        .unwrap();
    assert_eq!(
        store.access_token().await.unwrap().as_deref(),
        Some("access-1")
    );

    store.clear_tokens().await.unwrap();
    assert_eq!(store.tokens().await.unwrap(), None);
}

#[tokio::test]
async fn test_memory_store_empty_access_token_reads_as_absent() {
    let store = MemoryTokenStore::with_tokens(TokenPair {
        access_token: String::new(),
        refresh_token: Some("refresh-1".to_string()),
    });
    assert_eq!(store.access_token().await.unwrap(), None);
    assert!(store.tokens().await.unwrap().is_some());
}

#[tokio::test]
async fn test_store_validity_check() {
    let store = MemoryTokenStore::new();
    assert!(store.is_token_valid(&jwt_expiring_in(60)));
    assert!(!store.is_token_valid(&jwt_expiring_in(-60)));
}

// ============================================================================
// FileTokenStore
// ============================================================================

#[tokio::test]
async fn test_file_store_missing_file_is_logged_out() {
    let dir = tempdir().unwrap();
    let store = FileTokenStore::open(dir.path().join("tokens.json")).unwrap();
    assert_eq!(store.tokens().await.unwrap(), None);
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("tokens.json");

    let store = FileTokenStore::open(&path).unwrap();
    store
        .set_tokens(TokenPair::new("access-1", "refresh-1"))
        .await
        .unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reopened = FileTokenStore::open(&path).unwrap();
    assert_eq!(
        reopened.tokens().await.unwrap(),
        Some(TokenPair::new("access-1", "refresh-1"))
    );
}

#[tokio::test]
async fn test_file_store_clear_removes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    let store = FileTokenStore::open(&path).unwrap();
    store.set_tokens(TokenPair::access_only("a")).await.unwrap();
    store.clear_tokens().await.unwrap();

    assert!(!path.exists());
    assert_eq!(store.access_token().await.unwrap(), None);

    // Clearing twice is fine
    store.clear_tokens().await.unwrap();
}

#[tokio::test]
async fn test_file_store_rejects_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = FileTokenStore::open(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse token file"));
}
