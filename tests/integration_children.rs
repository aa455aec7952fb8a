mod common;

use axum::http::StatusCode;
use chrono::{Local, Months};
use common::{
    create_test_class, create_test_student, create_test_user, get_request, json_body,
    json_request, link_test_child, test_app,
};
use nursery::nursery_models::UserType;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn new_child() -> serde_json::Value {
    let date_of_birth = Local::now()
        .date_naive()
        .checked_sub_months(Months::new(36))
        .unwrap();
    json!({
        "student_name": "amara  nwosu",
        "date_of_birth": date_of_birth,
        "gender": "Female",
        "relationship_type": "mother",
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_adds_child_once(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    tx.commit().await.unwrap();

    let app = test_app(pool);
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/parent/children",
            Some(&parent.token),
            new_child(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["student_name"], "Amara Nwosu");
    assert_eq!(body["relationship_type"], "mother");
    assert_eq!(body["is_primary_contact"], false);
    assert_eq!(body["pickup_authorized"], true);
    assert!(body["student_code"].as_str().unwrap().starts_with("STU"));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/parent/children",
            Some(&parent.token),
            new_child(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("already added a child"));

    let response = app
        .oneshot(get_request("/api/v1/parent/children", Some(&parent.token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_child_requires_relationship_type(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    tx.commit().await.unwrap();

    let mut body = new_child();
    body.as_object_mut().unwrap().remove("relationship_type");

    let response = test_app(pool)
        .oneshot(json_request(
            "POST",
            "/api/v1/parent/children",
            Some(&parent.token),
            body,
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollment_request_is_created_once(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    let class_id = create_test_class(&mut tx, "BUT-01", 10).await;
    let child = create_test_student(&mut tx, "STU20250001").await;
    link_test_child(&mut tx, parent.profile_id, child).await;
    tx.commit().await.unwrap();

    let app = test_app(pool);
    let request = || {
        json_request(
            "POST",
            &format!("/api/v1/parent/children/{}/request-enrollment", child),
            Some(&parent.token),
            json!({ "class_id": class_id, "notes": "Mornings only" }),
        )
    };

    let response = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["request"]["status"], "pending");
    assert_eq!(body["request"]["class_id"], class_id.to_string());

    let response = app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "An enrollment request for this class is already pending."
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parents_only_see_their_own_children(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    let stranger = create_test_user(&mut tx, UserType::Parent).await;
    let child = create_test_student(&mut tx, "STU20250001").await;
    link_test_child(&mut tx, parent.profile_id, child).await;
    tx.commit().await.unwrap();

    let response = test_app(pool)
        .oneshot(get_request(
            &format!("/api/v1/parent/children/{}", child),
            Some(&stranger.token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_monthly_attendance_for_child(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    let class_id = create_test_class(&mut tx, "BUT-01", 10).await;
    let child = create_test_student(&mut tx, "STU20250001").await;
    link_test_child(&mut tx, parent.profile_id, child).await;
    for (date, status) in [
        ("2024-03-04", "present"),
        ("2024-03-05", "present"),
        ("2024-03-06", "early_departure"),
        ("2024-03-07", "absent"),
        ("2024-04-01", "late"),
        ("2023-12-01", "present"),
    ] {
        sqlx::query(
            "INSERT INTO daily_attendance (class_id, student_id, attendance_date, status)
             VALUES ($1, $2, $3::date, $4)",
        )
        .bind(class_id)
        .bind(child)
        .bind(date)
        .bind(status)
        .execute(&mut *tx)
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();

    let app = test_app(pool);
    let uri = |year: &str| format!("/api/v1/parent/children/{}/attendance?year={}", child, year);

    let response = app
        .clone()
        .oneshot(get_request(&uri("2024"), Some(&parent.token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let months = json_body(response).await;
    let months = months.as_array().unwrap();
    assert_eq!(months.len(), 12);
    assert_eq!(months[0]["month"], "Jan");
    assert_eq!(months[2]["present"], 2);
    assert_eq!(months[2]["absent"], 1);
    assert_eq!(months[3]["late"], 1);
    assert_eq!(months[11]["present"], 0);

    let response = app
        .oneshot(get_request(&uri("20x4"), Some(&parent.token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_child_attendance_hidden_from_other_parents(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let parent = create_test_user(&mut tx, UserType::Parent).await;
    let stranger = create_test_user(&mut tx, UserType::Parent).await;
    let child = create_test_student(&mut tx, "STU20250001").await;
    link_test_child(&mut tx, parent.profile_id, child).await;
    tx.commit().await.unwrap();

    let response = test_app(pool)
        .oneshot(get_request(
            &format!("/api/v1/parent/children/{}/attendance", child),
            Some(&stranger.token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
