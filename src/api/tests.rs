use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use super::create_router;
use crate::actions::articles::{self, NewArticleInput};
use crate::actions::images;
use crate::actions::posts::{self, NewPostInput};
use crate::testutil::{png, register_user, test_state, TestUser};
use crate::AppState;

const BOUNDARY: &str = "blogcmsboundary";

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn session_request(method: &str, uri: &str, user: &TestUser) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("session={}", user.session_token))
}

fn multipart_png(field: &str, file_name: &str) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(b"\x89PNG\r\n\x1a\nfake");
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

/// A post with one article holding one image, created through the actions.
async fn seed_post(state: &AppState, user: &TestUser) -> (String, String, String) {
    let post = posts::create_post(
        state,
        &user.current,
        &NewPostInput {
            title: "My First Post".to_string(),
        },
    )
    .await
    .data
    .unwrap();
    let article = articles::create_article(
        state,
        &user.current,
        &post.id,
        &NewArticleInput {
            title: Some("Intro".to_string()),
            text: "Hello".to_string(),
            index: Some(0),
        },
    )
    .await
    .data
    .unwrap();
    let image = images::create_article_image(state, &user.current, &article.id, &png("a.png"), None)
        .await
        .data
        .unwrap();
    (post.id, article.id, image.id)
}

fn app(state: &std::sync::Arc<AppState>) -> Router {
    create_router(state.clone())
}

#[tokio::test]
async fn test_health_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);

    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri("/_internal/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_public_post_requires_a_valid_key() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    let user = register_user(&state, "ana@example.com").await;
    let (post_id, article_id, image_id) = seed_post(&state, &user).await;
    let uri = format!("/api/cms/posts/{post_id}");

    let response = app(&state)
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Unauthorized");

    let garbage = format!("sk_{}", "0".repeat(64));
    assert_eq!(garbage.len(), user.api_key.len());
    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {garbage}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", user.api_key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"], post_id.as_str());
    assert_eq!(json["title"], "My First Post");
    assert_eq!(json["articles"][0]["id"], article_id.as_str());
    assert_eq!(json["articles"][0]["text"], "Hello");
    assert_eq!(json["articles"][0]["images"][0]["id"], image_id.as_str());
}

#[tokio::test]
async fn test_public_image_accepts_quoted_bearer() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    let user = register_user(&state, "ana@example.com").await;
    let (_, _, image_id) = seed_post(&state, &user).await;

    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri(format!("/api/cms/images/{image_id}"))
                .header(header::AUTHORIZATION, format!("\"Bearer {}\"", user.api_key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], image_id.as_str());
    assert_eq!(json["original_name"], "a.png");
}

#[tokio::test]
async fn test_public_api_reports_missing_rows_as_plain_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    let user = register_user(&state, "ana@example.com").await;

    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri("/api/cms/posts/does-not-exist")
                .header(header::AUTHORIZATION, format!("Bearer {}", user.api_key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Not Found");
}

#[tokio::test]
async fn test_app_routes_without_session_sign_out() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);

    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri("/app/posts")
                .header(header::COOKIE, "session=ss_unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/auth");
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("session=") && c.contains("Max-Age=0")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("user_api_key=") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn test_register_sets_both_auth_cookies() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);

    let response = app(&state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"name":"Ana","email":"ana@example.com","password":"correct horse"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let session = cookies.iter().find(|c| c.starts_with("session=ss_")).unwrap();
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Strict"));
    assert!(cookies.iter().any(|c| c.starts_with("user_api_key=sk_")));

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["user"]["email"], "ana@example.com");
    assert!(json["data"]["user"].get("password_hash").is_none());
    assert!(json["data"].get("session_token").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    register_user(&state, "ana@example.com").await;

    let response = app(&state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"name":"Ana","email":"ana@example.com","password":"correct horse"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    register_user(&state, "ana@example.com").await;

    let response = app(&state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"ana@example.com","password":"wrong pass"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Invalid email and/or password");
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    let user = register_user(&state, "ana@example.com").await;

    let response = app(&state)
        .oneshot(
            session_request("POST", "/app/posts", &user)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_foreign_posts_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    let owner = register_user(&state, "ana@example.com").await;
    let other = register_user(&state, "bob@example.com").await;
    let (post_id, _, _) = seed_post(&state, &owner).await;

    let response = app(&state)
        .oneshot(
            session_request("DELETE", &format!("/app/posts/{post_id}"), &other)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(state.db.get_post(&post_id).unwrap().is_some());
}

#[tokio::test]
async fn test_upload_then_delete_article_image() {
    let dir = tempfile::tempdir().unwrap();
    let (state, media) = test_state(&dir);
    let user = register_user(&state, "ana@example.com").await;
    let post = state.db.create_post(user.current.id(), "Post").unwrap();
    let article = state.db.create_article(&post.id, None, "Body", 0).unwrap();

    let response = app(&state)
        .oneshot(
            session_request("POST", &format!("/app/articles/{}/images", article.id), &user)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(multipart_png("file", "photo.png"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let image_id = json["data"]["id"].as_str().unwrap().to_string();
    let asset_id = json["data"]["asset_id"].as_str().unwrap().to_string();
    assert_eq!(json["data"]["index"], 0);

    let response = app(&state)
        .oneshot(
            session_request("DELETE", &format!("/app/images/{image_id}"), &user)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(media.removed(), vec![asset_id]);
    assert!(state.db.get_image(&image_id).unwrap().is_none());
    assert!(state.db.list_images_by_article(&article.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_reorder_articles_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    let user = register_user(&state, "ana@example.com").await;
    let post = state.db.create_post(user.current.id(), "My First Post").unwrap();
    let hello = state.db.create_article(&post.id, None, "Hello", 0).unwrap();
    let world = state.db.create_article(&post.id, None, "World", 1).unwrap();

    let body = serde_json::json!([
        {"id": world.id, "index": 0},
        {"id": hello.id, "index": 1},
    ]);
    let response = app(&state)
        .oneshot(
            session_request("PUT", &format!("/app/posts/{}/articles/order", post.id), &user)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&state)
        .oneshot(
            session_request("GET", &format!("/app/posts/{}", post.id), &user)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let texts: Vec<&str> = json["data"]["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["World", "Hello"]);
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _media) = test_state(&dir);
    let user = register_user(&state, "ana@example.com").await;

    let response = app(&state)
        .oneshot(
            session_request("POST", "/auth/logout", &user)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&state)
        .oneshot(
            session_request("GET", "/app/settings/user", &user)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_local_media_route_serves_uploaded_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (state, media) = test_state(&dir);
    let user = register_user(&state, "ana@example.com").await;
    images::create_user_image(&state, &user.current, &png("a.png"), None).await;
    let asset_id = media.stored().remove(0);

    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri(format!("/media/{asset_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"\x89PNG\r\n\x1a\nfake");
}
