mod common;

use axum::http::StatusCode;
use common::{
    create_test_class, create_test_student, create_test_user, enroll_test_student, json_body,
    json_request, link_test_child, test_app,
};
use nursery::nursery_models::UserType;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn active_enrollments(pool: &PgPool, student_id: Uuid) -> Vec<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT class_id FROM class_student_enrollments WHERE student_id = $1 AND is_active = true",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_assigning_to_new_class_moves_enrollment(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    let class_a = create_test_class(&mut tx, "BUT-01", 10).await;
    let class_b = create_test_class(&mut tx, "SUN-01", 10).await;
    let student = create_test_student(&mut tx, "STU20250001").await;
    tx.commit().await.unwrap();

    let app = test_app(pool.clone());

    for class_id in [class_a, class_b] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/admin/assign-students",
                Some(&admin.token),
                json!({
                    "teacher_id": teacher.profile_id,
                    "class_id": class_id,
                    "student_ids": [student],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(active_enrollments(&pool, student).await, vec![class_b]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_assigning_past_capacity_is_rejected(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    let class_id = create_test_class(&mut tx, "OWL-01", 1).await;
    let first = create_test_student(&mut tx, "STU20250001").await;
    let second = create_test_student(&mut tx, "STU20250002").await;
    tx.commit().await.unwrap();

    let app = test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/admin/assign-students",
            Some(&admin.token),
            json!({
                "teacher_id": teacher.profile_id,
                "class_id": class_id,
                "student_ids": [first, second],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(active_enrollments(&pool, first).await.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reassign_checks_source_class(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    let class_a = create_test_class(&mut tx, "BUT-01", 10).await;
    let class_b = create_test_class(&mut tx, "SUN-01", 10).await;
    let class_c = create_test_class(&mut tx, "OWL-01", 10).await;
    let student = create_test_student(&mut tx, "STU20250001").await;
    enroll_test_student(&mut tx, class_a, student).await;
    tx.commit().await.unwrap();

    let app = test_app(pool.clone());
    let reassign = |from_class_id: Uuid| {
        json_request(
            "POST",
            "/api/v1/admin/reassign-students",
            Some(&admin.token),
            json!({
                "student_ids": [student],
                "from_class_id": from_class_id,
                "to_class_id": class_c,
            }),
        )
    };

    let response = app.clone().oneshot(reassign(class_b)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "One or more students are not enrolled in the source class."
    );
    assert_eq!(active_enrollments(&pool, student).await, vec![class_a]);

    let response = app.oneshot(reassign(class_a)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["moved_count"], 1);
    assert_eq!(active_enrollments(&pool, student).await, vec![class_c]);
}

async fn pending_request(pool: &PgPool, parent_id: Uuid, student_id: Uuid, class_id: Uuid) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO enrollment_requests (parent_id, student_id, class_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(parent_id)
    .bind(student_id)
    .bind(class_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn review(token: &str, request_id: Uuid, action: &str) -> axum::http::Request<axum::body::Body> {
    json_request(
        "POST",
        &format!("/api/v1/admin/enrollment-requests/{}/{}", request_id, action),
        Some(token),
        json!({}),
    )
}

#[sqlx::test(migrations = "./migrations")]
async fn test_approving_request_enrolls_child(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    let class_id = create_test_class(&mut tx, "BUT-01", 10).await;
    let child = create_test_student(&mut tx, "STU20250001").await;
    link_test_child(&mut tx, parent.profile_id, child).await;
    tx.commit().await.unwrap();

    let request_id = pending_request(&pool, parent.profile_id, child, class_id).await;
    let app = test_app(pool.clone());

    let response = app
        .clone()
        .oneshot(review(&admin.token, request_id, "approve"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "approved");
    assert_eq!(active_enrollments(&pool, child).await, vec![class_id]);

    let response = app
        .oneshot(review(&admin.token, request_id, "reject"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "This enrollment request has already been approved."
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rejecting_request_leaves_child_unenrolled(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    let class_id = create_test_class(&mut tx, "BUT-01", 10).await;
    let child = create_test_student(&mut tx, "STU20250001").await;
    link_test_child(&mut tx, parent.profile_id, child).await;
    tx.commit().await.unwrap();

    let request_id = pending_request(&pool, parent.profile_id, child, class_id).await;
    let response = test_app(pool.clone())
        .oneshot(review(&admin.token, request_id, "reject"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "rejected");
    assert!(active_enrollments(&pool, child).await.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_approval_respects_class_capacity(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let admin = create_test_user(&mut tx, UserType::Admin).await;
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    let class_id = create_test_class(&mut tx, "OWL-01", 1).await;
    let enrolled = create_test_student(&mut tx, "STU20250001").await;
    let child = create_test_student(&mut tx, "STU20250002").await;
    enroll_test_student(&mut tx, class_id, enrolled).await;
    link_test_child(&mut tx, parent.profile_id, child).await;
    tx.commit().await.unwrap();

    let request_id = pending_request(&pool, parent.profile_id, child, class_id).await;
    let response = test_app(pool.clone())
        .oneshot(review(&admin.token, request_id, "approve"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(active_enrollments(&pool, child).await.is_empty());

    let status = sqlx::query_scalar::<_, String>("SELECT status FROM enrollment_requests WHERE id = $1")
        .bind(request_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "pending");
}
