mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn register_then_login_yields_a_working_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "name": "Siti",
                "email": "siti@example.com",
                "password": "correct-horse-battery"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = read_json(response).await;
    assert_eq!(user["role"], "customer");
    // The hash must never leak into responses.
    assert!(user.get("password_hash").is_none());

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "siti@example.com", "password": "correct-horse-battery" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = read_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request(Method::GET, "/api/v1/orders", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    let body = json!({
        "name": "Siti",
        "email": "dup@example.com",
        "password": "long-enough-password"
    });

    let response = app
        .request(Method::POST, "/auth/register", Some(body.clone()), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::POST, "/auth/register", Some(body), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_read_the_same() {
    let app = TestApp::new().await;
    app.request(
        Method::POST,
        "/auth/register",
        Some(json!({
            "name": "Siti",
            "email": "known@example.com",
            "password": "long-enough-password"
        })),
        None,
    )
    .await;

    let wrong_password = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "known@example.com", "password": "incorrect-password" })),
            None,
        )
        .await;
    let unknown_email = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "whatever-password" })),
            None,
        )
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let a = read_json(wrong_password).await;
    let b = read_json(unknown_email).await;
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
async fn garbage_tokens_are_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::GET,
            "/api/v1/orders",
            None,
            Some("not-a-real-token"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
