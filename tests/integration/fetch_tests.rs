//! Expiring link redemption tests: round trip, expiry, replay and tampering.

use http::StatusCode;

use image_tier_links::link::{ExpiringLinkIssuer, SigningKey};

use super::test_utils::{fetch_path, rep, TestApp, ORIGINAL_BYTES, SECRET, T0, THUMB400_BYTES};

/// Mint a link as `erin` and return its path and query.
async fn expiring_path(app: &TestApp, image_id: &str, kind: &str, seconds: u64) -> String {
    let link = app
        .link(
            "erin",
            image_id,
            &format!("representation={}&expiresIn={}", kind, seconds),
        )
        .await;
    fetch_path(link["url"].as_str().unwrap()).to_string()
}

fn token_of(path: &str) -> &str {
    path.split("token=").nth(1).unwrap()
}

#[tokio::test]
async fn test_fetch_round_trip() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "original", 600).await;

    // No account header: the token is the credential
    let response = app.get(&path, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], ORIGINAL_BYTES);
    assert_eq!(response.header("content-type"), Some("image/jpeg"));
    assert_eq!(response.header("cache-control"), Some("private, max-age=600"));
}

#[tokio::test]
async fn test_fetch_derived_representation() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "thumb400", 300).await;

    let response = app.get(&path, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], THUMB400_BYTES);
}

#[tokio::test]
async fn test_cache_max_age_caps_lifetime() {
    let app = TestApp::with(|state| state.with_cache_max_age(60));
    let path = expiring_path(&app, "ent-img", "original", 600).await;

    let response = app.get(&path, None).await;
    assert_eq!(response.header("cache-control"), Some("private, max-age=60"));
}

#[tokio::test]
async fn test_fetch_at_expiry_boundary() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "original", 300).await;

    app.clock.set(T0 + 300);
    let response = app.get(&path, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("cache-control"), Some("private, max-age=0"));

    app.clock.set(T0 + 301);
    let response = app.get(&path, None).await;
    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.error_type(), "link_expired");
}

#[tokio::test]
async fn test_expired_link_never_reaches_storage() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "original", 300).await;

    app.clock.advance(10_000);
    let response = app.get(&path, None).await;

    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(app.store.fetch_count(), 0);
}

#[tokio::test]
async fn test_replay_against_other_image() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "original", 300).await;

    let replayed = path.replacen("/images/ent-img/", "/images/ent-fresh/", 1);
    let response = app.get(&replayed, None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "image_mismatch");
}

#[tokio::test]
async fn test_replay_against_other_representation() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "thumb200", 300).await;

    let swapped = path.replacen("representation=thumb200", "representation=original", 1);
    let response = app.get(&swapped, None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "representation_mismatch");
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "original", 300).await;
    let token = token_of(&path);

    // Swap one payload character for another base64url character
    let mut chars: Vec<char> = token.chars().collect();
    chars[5] = if chars[5] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    let response = app
        .get(&path.replace(token, &tampered), None)
        .await;

    assert!(
        response.status == StatusCode::FORBIDDEN || response.status == StatusCode::BAD_REQUEST,
        "unexpected status {}",
        response.status
    );
    assert!(matches!(
        response.error_type().as_str(),
        "invalid_signature" | "malformed_token"
    ));
    assert_eq!(app.store.fetch_count(), 0);
}

#[tokio::test]
async fn test_token_from_other_key() {
    let app = TestApp::new();
    let forged = ExpiringLinkIssuer::new(SigningKey::new("some-other-secret-of-enough-length"))
        .issue("ent-img", &rep("original"), 300, T0)
        .encode();

    let response = app
        .get(
            &format!("/images/ent-img/fetch?representation=original&token={}", forged),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "invalid_signature");
}

#[tokio::test]
async fn test_malformed_token() {
    let app = TestApp::new();

    let response = app
        .get(
            "/images/ent-img/fetch?representation=original&token=not-a-token",
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_type(), "malformed_token");
}

#[tokio::test]
async fn test_missing_token_parameter() {
    let app = TestApp::new();

    let response = app
        .get("/images/ent-img/fetch?representation=original", None)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_type(), "malformed_token");
    assert_eq!(response.json()["status"], 400);
}

#[tokio::test]
async fn test_invalid_representation_name_is_mismatch() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "original", 300).await;

    let renamed = path.replacen("representation=original", "representation=ORIGINAL", 1);
    let response = app.get(&renamed, None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "representation_mismatch");
    assert_eq!(app.store.fetch_count(), 0);
}

#[tokio::test]
async fn test_missing_representation_is_mismatch() {
    let app = TestApp::new();
    let path = expiring_path(&app, "ent-img", "original", 300).await;

    let stripped = path.replacen("representation=original&", "", 1);
    let response = app.get(&stripped, None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "representation_mismatch");
}

#[tokio::test]
async fn test_valid_token_for_missing_object() {
    let app = TestApp::new();
    let token = ExpiringLinkIssuer::new(SigningKey::new(SECRET))
        .issue("ghost", &rep("original"), 300, T0)
        .encode();

    let response = app
        .get(
            &format!("/images/ghost/fetch?representation=original&token={}", token),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_type(), "not_found");
    assert_eq!(app.store.fetch_count(), 1);
}
