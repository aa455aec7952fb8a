mod common;

use axum::http::StatusCode;
use chrono::{Days, Local};
use common::{
    TestUser, assign_test_teacher, create_test_class, create_test_student, create_test_user,
    enroll_test_student, json_body, json_request, test_app,
};
use nursery::nursery_models::UserType;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

struct Classroom {
    teacher: TestUser,
    class_id: Uuid,
    student: Uuid,
}

/// One class with an assigned teacher and one enrolled student.
async fn classroom(pool: &PgPool) -> Classroom {
    let mut tx = pool.begin().await.unwrap();
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    let class_id = create_test_class(&mut tx, "BEE-01", 10).await;
    let student = create_test_student(&mut tx, "STU20250001").await;
    assign_test_teacher(&mut tx, class_id, teacher.profile_id).await;
    enroll_test_student(&mut tx, class_id, student).await;
    tx.commit().await.unwrap();

    Classroom {
        teacher,
        class_id,
        student,
    }
}

fn mark(token: &str, class_id: Uuid, date: String, records: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    json_request(
        "POST",
        "/api/v1/teacher/attendance/mark",
        Some(token),
        json!({
            "class_id": class_id,
            "attendance_date": date,
            "attendance_records": records,
        }),
    )
}

fn today() -> String {
    Local::now().date_naive().to_string()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_attendance_cannot_be_marked_twice(pool: PgPool) {
    let room = classroom(&pool).await;
    let app = test_app(pool.clone());
    let records = json!([{ "student_id": room.student, "status": "present" }]);

    let response = app
        .clone()
        .oneshot(mark(&room.teacher.token, room.class_id, today(), records.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(mark(&room.teacher.token, room.class_id, today(), records))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("already"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unassigned_teacher_cannot_mark_attendance(pool: PgPool) {
    let room = classroom(&pool).await;
    let mut tx = pool.begin().await.unwrap();
    let other = create_test_user(&mut tx, UserType::Teacher).await;
    tx.commit().await.unwrap();

    let response = test_app(pool)
        .oneshot(mark(
            &other.token,
            room.class_id,
            today(),
            json!([{ "student_id": room.student, "status": "present" }]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "You are not assigned to this class.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_future_attendance_date_is_rejected(pool: PgPool) {
    let room = classroom(&pool).await;
    let tomorrow = Local::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap()
        .to_string();

    let response = test_app(pool)
        .oneshot(mark(
            &room.teacher.token,
            room.class_id,
            tomorrow,
            json!([{ "student_id": room.student, "status": "present" }]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["details"]["attendance_date"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_empty_attendance_records_are_rejected(pool: PgPool) {
    let room = classroom(&pool).await;

    let response = test_app(pool)
        .oneshot(mark(&room.teacher.token, room.class_id, today(), json!([])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"]["attendance_records"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_outside_the_class_are_rejected(pool: PgPool) {
    let room = classroom(&pool).await;
    let mut tx = pool.begin().await.unwrap();
    let outsider = create_test_student(&mut tx, "STU20250002").await;
    tx.commit().await.unwrap();

    let response = test_app(pool.clone())
        .oneshot(mark(
            &room.teacher.token,
            room.class_id,
            today(),
            json!([
                { "student_id": room.student, "status": "present" },
                { "student_id": outsider, "status": "absent" },
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM daily_attendance WHERE class_id = $1")
        .bind(room.class_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}
