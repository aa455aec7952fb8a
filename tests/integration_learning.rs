mod common;

use axum::http::StatusCode;
use common::{
    assign_test_teacher, create_test_class, create_test_student, create_test_user,
    enroll_test_student, json_body, json_request, test_app,
};
use nursery::nursery_models::UserType;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "./migrations")]
async fn test_recorded_session_counts_present_students(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    let class_id = create_test_class(&mut tx, "BUT-01", 10).await;
    let ada = create_test_student(&mut tx, "STU20250001").await;
    let ben = create_test_student(&mut tx, "STU20250002").await;
    let cai = create_test_student(&mut tx, "STU20250003").await;
    assign_test_teacher(&mut tx, class_id, teacher.profile_id).await;
    for student in [ada, ben, cai] {
        enroll_test_student(&mut tx, class_id, student).await;
    }
    tx.commit().await.unwrap();

    let response = test_app(pool.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/teacher/learning-activities/record",
            Some(&teacher.token),
            json!({
                "class_id": class_id,
                "session_date": "2025-03-10",
                "title": "Counting with beads",
                "category": "numeracy",
                "duration_minutes": 30,
                "start_time": "09:30:00",
                "end_time": "10:00:00",
                "student_records": [
                    { "student_id": ada, "participation_level": "excellent" },
                    { "student_id": ben, "was_present": false },
                    { "student_id": cai, "was_present": true, "participation_level": "good" },
                ],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["attendance_count"], 2);
    assert_eq!(body["activity_name"], "Counting with beads");
    assert_eq!(body["student_records"].as_array().unwrap().len(), 3);

    let stored = sqlx::query_scalar::<_, i32>(
        "SELECT attendance_count FROM class_learning_sessions WHERE class_id = $1",
    )
    .bind(class_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(stored, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_session_rejects_students_outside_class(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let teacher = create_test_user(&mut tx, UserType::Teacher).await;
    let class_id = create_test_class(&mut tx, "BUT-01", 10).await;
    let outsider = create_test_student(&mut tx, "STU20250001").await;
    assign_test_teacher(&mut tx, class_id, teacher.profile_id).await;
    tx.commit().await.unwrap();

    let response = test_app(pool.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/teacher/learning-activities/record",
            Some(&teacher.token),
            json!({
                "class_id": class_id,
                "session_date": "2025-03-10",
                "title": "Finger painting",
                "category": "art",
                "duration_minutes": 45,
                "student_records": [{ "student_id": outsider }],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let sessions = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM class_learning_sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(sessions, 0);
}
