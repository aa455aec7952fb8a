mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{bearer, create_test_user, get_request, json_body, json_request, test_app, test_state};
use nursery::nursery_core::LocalFileStorage;
use nursery::nursery_models::UserType;
use nursery::router::init_router;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "nursery-test-boundary";

/// App whose uploads land in a throwaway directory.
fn upload_app(pool: PgPool) -> axum::Router {
    let dir = std::env::temp_dir().join(format!("nursery-media-{}", Uuid::new_v4()));
    let mut state = test_state(pool);
    state.storage = Arc::new(LocalFileStorage::new(dir, "/media".to_string()));
    init_router(state)
}

fn upload_request(story_id: &str, token: &str, files: usize) -> Request<Body> {
    let mut body = String::new();
    for i in 0..files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"photo{i}.png\"\r\nContent-Type: image/png\r\n\r\npixels{i}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(format!("/api/v1/stories/{}/attachments", story_id))
        .header("authorization", bearer(token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_like_toggles(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    tx.commit().await.unwrap();

    let app = test_app(pool.clone());
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/stories",
            Some(&teacher.token),
            json!({ "title": "Sports day", "content": "Photos from today", "story_type": "photo" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let story = json_body(response).await;
    assert_eq!(story["author"]["role"], "teacher");
    let like_uri = format!("/api/v1/stories/{}/like", story["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(json_request("POST", &like_uri, Some(&parent.token), json!({})))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["liked"], true);
    assert_eq!(body["likes_count"], 1);

    let response = app
        .oneshot(json_request("POST", &like_uri, Some(&parent.token), json!({})))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["liked"], false);
    assert_eq!(body["likes_count"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_author_or_admin_deletes_comment(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    let other_parent = create_test_user(&mut tx, UserType::Parent).await;
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    tx.commit().await.unwrap();

    let app = test_app(pool.clone());
    let story = json_body(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/stories",
                Some(&teacher.token),
                json!({ "title": "Art corner", "content": "Finger painting" }),
            ))
            .await
            .unwrap(),
    )
    .await;
    let story_id = story["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/stories/{}/comments", story_id),
            Some(&parent.token),
            json!({ "comment_text": "Lovely!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment = json_body(response).await;
    let comment_uri = format!(
        "/api/v1/stories/comments/{}",
        comment["id"].as_str().unwrap()
    );

    let response = app
        .clone()
        .oneshot(json_request("DELETE", &comment_uri, Some(&other_parent.token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request("DELETE", &comment_uri, Some(&admin.token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(
            &format!("/api/v1/stories/{}/comments", story_id),
            Some(&parent.token),
        ))
        .await
        .unwrap();
    let comments = json_body(response).await;
    assert_eq!(comments.as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_attachment_uploads_respect_author_and_limit(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    let other_teacher = create_test_user(&mut tx, UserType::Teacher).await;
    tx.commit().await.unwrap();

    let app = upload_app(pool.clone());
    let story = json_body(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/stories",
                Some(&teacher.token),
                json!({ "title": "Garden day", "content": "Planting sunflowers" }),
            ))
            .await
            .unwrap(),
    )
    .await;
    let story_id = story["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(upload_request(&story_id, &other_teacher.token, 1))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(upload_request(&story_id, &teacher.token, 2))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["attachments"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(upload_request(&story_id, &teacher.token, 4))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Maximum 5 files can be attached.");

    let response = app
        .oneshot(upload_request(&story_id, &teacher.token, 3))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM story_attachments WHERE story_id = $1",
    )
    .bind(Uuid::parse_str(&story_id).unwrap())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(stored, 5);
}
