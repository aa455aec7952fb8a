mod common;

use axum::http::StatusCode;
use common::{
    TEST_PASSWORD, create_test_user, generate_unique_email, get_request, json_body, json_request,
    test_app,
};
use nursery::nursery_models::UserType;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn new_teacher(email: &str) -> serde_json::Value {
    json!({
        "first_name": "Grace",
        "last_name": "Mensah",
        "email": email,
        "password": TEST_PASSWORD,
        "subjects": "Phonics",
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_created_teachers_get_sequential_employee_ids(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    tx.commit().await.unwrap();

    let app = test_app(pool);
    let mut employee_ids = Vec::new();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/admin/teachers",
                Some(&admin.token),
                new_teacher(&generate_unique_email()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["password_change_required"], true);
        employee_ids.push(body["employee_id"].as_str().unwrap().to_string());
    }

    assert_eq!(employee_ids, vec!["TCH0001", "TCH0002"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_explicit_employee_id_must_be_unique(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    tx.commit().await.unwrap();

    let app = test_app(pool);
    for (expected, email) in [
        (StatusCode::CREATED, generate_unique_email()),
        (StatusCode::BAD_REQUEST, generate_unique_email()),
    ] {
        let mut body = new_teacher(&email);
        body["employee_id"] = json!("EMP-7");
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/admin/teachers",
                Some(&admin.token),
                body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleted_teacher_token_stops_working(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    tx.commit().await.unwrap();

    let app = test_app(pool);
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/teacher/my-classes", Some(&teacher.token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/v1/admin/teachers/{}", teacher.profile_id),
            Some(&admin.token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/api/v1/teacher/my-classes", Some(&teacher.token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
