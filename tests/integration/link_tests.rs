//! Link request tests: tier gating, expiry bounds, ownership and identity.

use http::StatusCode;

use super::test_utils::{TestApp, T0};

// =============================================================================
// Basic tier
// =============================================================================

#[tokio::test]
async fn test_basic_static_thumbnail() {
    let app = TestApp::new();

    let link = app
        .link("alice", "basic-img", "representation=thumb200")
        .await;

    assert_eq!(link["kind"], "static");
    assert_eq!(link["representation"], "thumb200");
    assert_eq!(link["url"], "/images/basic-img/representations/thumb200");
    assert!(link.get("expires_at").is_none());
}

#[tokio::test]
async fn test_basic_original_forbidden() {
    let app = TestApp::new();

    let response = app
        .get("/images/basic-img/link?representation=original", Some("alice"))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "tier_forbidden");
    assert_eq!(response.json()["status"], 403);
}

#[tokio::test]
async fn test_basic_larger_thumbnail_forbidden() {
    let app = TestApp::new();

    let response = app
        .get("/images/basic-img/link?representation=thumb400", Some("alice"))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "tier_forbidden");
}

#[tokio::test]
async fn test_basic_expiring_not_allowed() {
    let app = TestApp::new();

    let response = app
        .get(
            "/images/basic-img/link?representation=thumb200&expiresIn=300",
            Some("alice"),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "expiring_links_not_allowed");
}

// =============================================================================
// Premium tier
// =============================================================================

#[tokio::test]
async fn test_premium_static_original() {
    let app = TestApp::new();

    let link = app
        .link("paula", "premium-img", "representation=original")
        .await;
    assert_eq!(link["kind"], "static");

    let link = app
        .link("paula", "premium-img", "representation=thumb400")
        .await;
    assert_eq!(link["kind"], "static");
}

#[tokio::test]
async fn test_premium_expiring_not_allowed() {
    let app = TestApp::new();

    let response = app
        .get(
            "/images/premium-img/link?representation=original&expiresIn=600",
            Some("paula"),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "expiring_links_not_allowed");
}

// =============================================================================
// Enterprise tier
// =============================================================================

#[tokio::test]
async fn test_enterprise_expiry_bounds() {
    let app = TestApp::new();

    for (seconds, expected) in [
        (299, StatusCode::UNPROCESSABLE_ENTITY),
        (300, StatusCode::OK),
        (30000, StatusCode::OK),
        (30001, StatusCode::UNPROCESSABLE_ENTITY),
    ] {
        let response = app
            .get(
                &format!(
                    "/images/ent-img/link?representation=original&expiresIn={}",
                    seconds
                ),
                Some("erin"),
            )
            .await;
        assert_eq!(response.status, expected, "expiresIn={}", seconds);

        if expected == StatusCode::UNPROCESSABLE_ENTITY {
            assert_eq!(response.error_type(), "expiry_out_of_range");
        }
    }
}

#[tokio::test]
async fn test_enterprise_expiring_link() {
    let app = TestApp::new();

    let link = app
        .link("erin", "ent-img", "representation=original&expiresIn=300")
        .await;

    assert_eq!(link["kind"], "expiring");
    assert_eq!(link["representation"], "original");
    assert_eq!(link["expires_at"], T0 + 300);

    let url = link["url"].as_str().unwrap();
    assert!(url.starts_with("/images/ent-img/fetch?representation=original&token="));
}

#[tokio::test]
async fn test_enterprise_static_link_still_available() {
    let app = TestApp::new();

    let link = app
        .link("erin", "ent-img", "representation=thumb400")
        .await;

    assert_eq!(link["kind"], "static");
}

#[tokio::test]
async fn test_expiring_links_are_deterministic() {
    let app = TestApp::new();
    let query = "representation=original&expiresIn=900";

    let first = app.link("erin", "ent-img", query).await;
    let second = app.link("erin", "ent-img", query).await;
    assert_eq!(first["url"], second["url"]);

    app.clock.advance(1);
    let later = app.link("erin", "ent-img", query).await;
    assert_ne!(first["url"], later["url"]);
    assert_eq!(later["expires_at"], T0 + 901);
}

// =============================================================================
// Availability and ownership
// =============================================================================

#[tokio::test]
async fn test_representation_not_generated_yet() {
    let app = TestApp::new();

    let response = app
        .get("/images/ent-fresh/link?representation=thumb200", Some("erin"))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_type(), "representation_unavailable");
}

#[tokio::test]
async fn test_unavailable_wins_over_forbidden() {
    let app = TestApp::new();

    // thumb800 is neither generated nor exposed on Basic
    let response = app
        .get("/images/basic-img/link?representation=thumb800", Some("alice"))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_type(), "representation_unavailable");
}

#[tokio::test]
async fn test_other_owners_image_not_found() {
    let app = TestApp::new();

    let response = app
        .get("/images/ent-img/link?representation=thumb200", Some("alice"))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_type(), "image_not_found");
}

#[tokio::test]
async fn test_unknown_image_not_found() {
    let app = TestApp::new();

    let response = app
        .get("/images/nope/link?representation=original", Some("erin"))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_type(), "image_not_found");
}

#[tokio::test]
async fn test_invalid_representation_name() {
    let app = TestApp::new();

    let response = app
        .get("/images/ent-img/link?representation=ORIGINAL", Some("erin"))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_type(), "representation_unavailable");
}

#[tokio::test]
async fn test_invalid_name_on_foreign_image_is_image_not_found() {
    let app = TestApp::new();

    let response = app
        .get("/images/ent-img/link?representation=ORIGINAL", Some("alice"))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_type(), "image_not_found");
}

#[tokio::test]
async fn test_missing_representation_parameter() {
    let app = TestApp::new();

    let response = app.get("/images/ent-img/link", Some("erin")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_type(), "invalid_request");
}

// =============================================================================
// Unparseable lifetimes
// =============================================================================

const BAD_LIFETIMES: [&str; 4] = ["-5", "18446744073709551616", "soon", ""];

#[tokio::test]
async fn test_bad_lifetime_on_basic_is_not_allowed() {
    let app = TestApp::new();

    for raw in BAD_LIFETIMES {
        let response = app
            .get(
                &format!(
                    "/images/basic-img/link?representation=thumb200&expiresIn={}",
                    raw
                ),
                Some("alice"),
            )
            .await;

        assert_eq!(response.status, StatusCode::FORBIDDEN, "expiresIn={:?}", raw);
        assert_eq!(response.error_type(), "expiring_links_not_allowed");
    }
}

#[tokio::test]
async fn test_bad_lifetime_on_enterprise_is_out_of_range() {
    let app = TestApp::new();

    for raw in BAD_LIFETIMES {
        let response = app
            .get(
                &format!(
                    "/images/ent-img/link?representation=original&expiresIn={}",
                    raw
                ),
                Some("erin"),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::UNPROCESSABLE_ENTITY,
            "expiresIn={:?}",
            raw
        );
        assert_eq!(response.error_type(), "expiry_out_of_range");
    }
}

#[tokio::test]
async fn test_bad_lifetime_after_tier_check() {
    let app = TestApp::new();

    let response = app
        .get(
            "/images/basic-img/link?representation=original&expiresIn=-5",
            Some("alice"),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "tier_forbidden");
}

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn test_missing_account_header() {
    let app = TestApp::new();

    let response = app
        .get("/images/basic-img/link?representation=thumb200", None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_type(), "unauthenticated");
}

#[tokio::test]
async fn test_unassigned_account_gets_default_tier() {
    let app = TestApp::new();

    // An unassigned account owns nothing, so check its tier via the listing
    let response = app.get("/images", Some("newcomer")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["tier"], "Basic");
}

// =============================================================================
// Deployment options
// =============================================================================

#[tokio::test]
async fn test_conceal_representations() {
    let app = TestApp::with(|state| state.with_conceal_representations(true));

    let forbidden = app
        .get("/images/basic-img/link?representation=original", Some("alice"))
        .await;
    let missing = app
        .get("/images/ent-fresh/link?representation=thumb200", Some("erin"))
        .await;

    assert_eq!(forbidden.status, StatusCode::NOT_FOUND);
    assert_eq!(forbidden.error_type(), "representation_unavailable");
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error_type(), forbidden.error_type());
}

#[tokio::test]
async fn test_conceal_keeps_expiry_errors() {
    let app = TestApp::with(|state| state.with_conceal_representations(true));

    let response = app
        .get(
            "/images/basic-img/link?representation=thumb200&expiresIn=300",
            Some("alice"),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_type(), "expiring_links_not_allowed");
}

#[tokio::test]
async fn test_public_url_prefixes_links() {
    let app = TestApp::with(|state| state.with_public_url("https://img.example.com/"));

    let link = app
        .link("alice", "basic-img", "representation=thumb200")
        .await;
    assert_eq!(
        link["url"],
        "https://img.example.com/images/basic-img/representations/thumb200"
    );

    let link = app
        .link("erin", "ent-img", "representation=original&expiresIn=300")
        .await;
    assert!(link["url"]
        .as_str()
        .unwrap()
        .starts_with("https://img.example.com/images/ent-img/fetch?"));
}
