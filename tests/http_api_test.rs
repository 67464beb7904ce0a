//! End-to-end HTTP tests over in-memory stores: health, authentication,
//! event management and profile endpoints.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use common::{create_event, send, signup_and_login, test_app};
use serde_json::json;

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn readiness_reports_both_backends() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["database"], true);
    assert_eq!(body["sessions"], true);
}

#[tokio::test]
async fn signup_login_and_me_round_trip() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "name": "Alice",
            "email": "Alice@Example.com",
            "password": "correct horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // Emails are stored lowercased.
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "user");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = test_app();
    signup_and_login(&app, "Alice", "alice@example.com", "correct horse", None).await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() {
    let app = test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "whatever1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_signup_is_a_conflict() {
    let app = test_app();
    signup_and_login(&app, "Alice", "alice@example.com", "correct horse", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "name": "Imposter",
            "email": "ALICE@example.com",
            "password": "correct horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_TAKEN");
}

#[tokio::test]
async fn signup_validates_email_and_password() {
    let app = test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "name": "Bob", "email": "not-an-email", "password": "long enough" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "name": "Bob", "email": "bob@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = test_app();
    let token = signup_and_login(&app, "Alice", "alice@example.com", "correct horse", None).await;

    let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_all_invalidates_every_session() {
    let app = test_app();
    let first = signup_and_login(&app, "Alice", "alice@example.com", "correct horse", None).await;

    // A second login from another device.
    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", "/auth/logout-all", Some(&first), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for token in [&first, &second] {
        let (status, _) = send(&app, "GET", "/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = test_app();
    let (status, _) = send(&app, "GET", "/auth/me", Some("not-a-uuid"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_can_manage_events() {
    let app = test_app();
    let admin = signup_and_login(&app, "Admin", "admin@example.com", "admin pass", Some("admin")).await;

    let event_id = create_event(&app, &admin, "Jazz Night", 100).await;

    // Anyone can read.
    let (status, body) = send(&app, "GET", &format!("/api/events/{event_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Jazz Night");
    assert_eq!(body["attendees"], 100);
    assert_eq!(body["organizer"], "admin@example.com");

    // Partial update.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/events/{event_id}"),
        Some(&admin),
        Some(json!({ "price": "$30", "attendees": 80 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "$30");
    assert_eq!(body["attendees"], 80);
    assert_eq!(body["name"], "Jazz Night");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/events/{event_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/events/{event_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_admins_cannot_manage_events() {
    let app = test_app();
    let user = signup_and_login(&app, "Alice", "alice@example.com", "correct horse", None).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        Some(&user),
        Some(json!({ "name": "Rogue Event", "date": "2026-09-01", "attendees": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // No token at all.
    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        None,
        Some(json!({ "name": "Rogue Event", "date": "2026-09-01", "attendees": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn event_creation_is_validated() {
    let app = test_app();
    let admin = signup_and_login(&app, "Admin", "admin@example.com", "admin pass", Some("admin")).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        Some(&admin),
        Some(json!({ "name": "   ", "date": "2026-09-01", "attendees": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        Some(&admin),
        Some(json!({ "name": "Ok", "date": "2026-09-01", "attendees": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn event_listing_supports_name_search() {
    let app = test_app();
    let admin = signup_and_login(&app, "Admin", "admin@example.com", "admin pass", Some("admin")).await;

    create_event(&app, &admin, "Jazz Night", 50).await;
    create_event(&app, &admin, "Tech Meetup", 50).await;
    create_event(&app, &admin, "Late Night Jazz", 50).await;

    let (status, body) = send(&app, "GET", "/api/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);

    let (status, body) = send(&app, "GET", "/api/events?search=jazz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    // Blank search behaves like no filter.
    let (_, body) = send(&app, "GET", "/api/events?search=%20", None, None).await;
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn empty_image_url_clears_the_image() {
    let app = test_app();
    let admin = signup_and_login(&app, "Admin", "admin@example.com", "admin pass", Some("admin")).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/events",
        Some(&admin),
        Some(json!({
            "name": "Gallery Opening",
            "date": "2026-09-01",
            "attendees": 30,
            "image_url": "https://example.com/art.jpg",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["image_url"], "https://example.com/art.jpg");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/events/{event_id}"),
        Some(&admin),
        Some(json!({ "image_url": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["image_url"].is_null());
}

#[tokio::test]
async fn profile_can_be_read_and_renamed() {
    let app = test_app();
    let token = signup_and_login(&app, "Alice", "alice@example.com", "correct horse", None).await;

    let (status, body) = send(&app, "GET", "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");

    let (status, body) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "name": "  Alice Cooper  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Cooper");

    let (status, _) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&token),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
