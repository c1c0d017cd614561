mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::json;

async fn create_post(app: &TestApp, body: serde_json::Value) -> serde_json::Value {
    let response = app.as_admin(Method::POST, "/api/v1/admin/blog", Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await["data"].clone()
}

#[tokio::test]
async fn slug_is_derived_from_title() {
    let app = TestApp::new().await;
    let post = create_post(
        &app,
        json!({ "title": "Grand Opening: Our New Store!", "content": "We are open." }),
    )
    .await;
    assert_eq!(post["slug"], "grand-opening-our-new-store");
    assert_eq!(post["status"], "draft");
}

#[tokio::test]
async fn slug_collision_gets_a_timestamp_suffix() {
    let app = TestApp::new().await;
    let first = create_post(&app, json!({ "title": "Holiday Sale", "content": "a" })).await;
    let second = create_post(&app, json!({ "title": "Holiday Sale", "content": "b" })).await;

    assert_eq!(first["slug"], "holiday-sale");
    let second_slug = second["slug"].as_str().unwrap();
    assert_ne!(second_slug, "holiday-sale");
    assert!(second_slug.starts_with("holiday-sale-"));
}

#[tokio::test]
async fn editing_a_post_keeps_its_own_slug_unsuffixed() {
    let app = TestApp::new().await;
    let post = create_post(&app, json!({ "title": "Care Guide", "content": "v1" })).await;
    let uri = format!("/api/v1/admin/blog/{}", post["id"].as_str().unwrap());

    // Same title again: the post collides only with itself, so the slug
    // must come back unchanged.
    let response = app
        .as_admin(
            Method::PATCH,
            &uri,
            Some(json!({ "title": "Care Guide", "content": "v2" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await["data"].clone();
    assert_eq!(updated["slug"], "care-guide");
    assert_eq!(updated["content"], "v2");
}

#[tokio::test]
async fn publishing_stamps_published_at() {
    let app = TestApp::new().await;
    let post = create_post(
        &app,
        json!({ "title": "Launch Notes", "content": "hi", "status": "published" }),
    )
    .await;
    assert_eq!(post["status"], "published");
    assert!(post["published_at"].is_string());
}

#[tokio::test]
async fn scheduling_requires_a_future_timestamp() {
    let app = TestApp::new().await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/admin/blog",
            Some(json!({
                "title": "Past Post",
                "content": "x",
                "status": "scheduled",
                "scheduled_for": "2020-01-01T00:00:00Z"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/admin/blog",
            Some(json!({ "title": "No Date", "content": "x", "status": "scheduled" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn drafts_are_invisible_to_the_public() {
    let app = TestApp::new().await;
    let draft = create_post(&app, json!({ "title": "Secret Draft", "content": "shh" })).await;
    let published = create_post(
        &app,
        json!({ "title": "Public Post", "content": "hello", "status": "published" }),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/blog/secret-draft", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::GET, "/api/v1/blog/public-post", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/api/v1/blog", None, None).await;
    let items = read_json(response).await["data"]["items"].clone();
    let slugs: Vec<String> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap().to_string())
        .collect();
    assert!(slugs.contains(&published["slug"].as_str().unwrap().to_string()));
    assert!(!slugs.contains(&draft["slug"].as_str().unwrap().to_string()));
}

#[tokio::test]
async fn publish_due_promotes_overdue_scheduled_posts() {
    let app = TestApp::new().await;

    // Schedule one hour out, then rewind the stored timestamp so it is due.
    let post = create_post(
        &app,
        json!({
            "title": "Scheduled Announcement",
            "content": "soon",
            "status": "scheduled",
            "scheduled_for": (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339()
        }),
    )
    .await;

    {
        use sea_orm::{ActiveModelTrait, EntityTrait, Set};
        use storefront_api::entities::blog_post;
        use uuid::Uuid;

        let id = Uuid::parse_str(post["id"].as_str().unwrap()).unwrap();
        let stored = blog_post::Entity::find_by_id(id)
            .one(&app.state.db)
            .await
            .unwrap()
            .unwrap();
        let mut active: blog_post::ActiveModel = stored.into();
        active.scheduled_for = Set(Some(chrono::Utc::now() - chrono::Duration::minutes(5)));
        active.update(&app.state.db).await.unwrap();
    }

    let response = app
        .as_admin(Method::POST, "/api/v1/admin/blog/publish-due", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = read_json(response).await["data"].clone();
    assert_eq!(data["published"], 1);

    let uri = format!("/api/v1/blog/{}", post["slug"].as_str().unwrap());
    let response = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let promoted = read_json(response).await["data"].clone();
    assert_eq!(promoted["status"], "published");
    assert!(promoted["published_at"].is_string());
}

#[tokio::test]
async fn blog_admin_routes_are_role_gated() {
    let app = TestApp::new().await;
    let response = app
        .as_customer(
            Method::POST,
            "/api/v1/admin/blog",
            Some(json!({ "title": "Nope", "content": "nope" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
