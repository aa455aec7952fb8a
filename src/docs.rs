use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use nursery_core::{PaginationMeta, PaginationParams};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_parent,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::verify_email,
        crate::modules::auth::controller::resend_verification,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::auth::controller::validate_reset_token,
        crate::modules::auth::controller::change_password,
        crate::modules::auth::controller::get_profile,
        crate::modules::auth::controller::update_profile,
        crate::modules::auth::controller::health,
        crate::modules::teachers::controller::list_teachers,
        crate::modules::teachers::controller::create_teacher,
        crate::modules::teachers::controller::get_teacher,
        crate::modules::teachers::controller::update_teacher,
        crate::modules::teachers::controller::delete_teacher,
        crate::modules::teachers::controller::reset_teacher_password,
        crate::modules::admins::controller::list_admins,
        crate::modules::admins::controller::create_admin,
        crate::modules::admins::controller::get_admin,
        crate::modules::admins::controller::update_admin,
        crate::modules::admins::controller::delete_admin,
        crate::modules::admins::controller::reset_admin_password,
        crate::modules::classes::controller::list_classes,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::unassign_all_students,
        crate::modules::classes::controller::unassign_all_teachers,
        crate::modules::students::controller::list_students,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::assignments::controller::list_teacher_assignments,
        crate::modules::assignments::controller::assign_students,
        crate::modules::assignments::controller::reassign_students,
        crate::modules::assignments::controller::remove_student_assignment,
        crate::modules::assignments::controller::assign_teacher_to_class,
        crate::modules::assignments::controller::remove_teacher_from_class,
        crate::modules::assignments::controller::dashboard_stats,
        crate::modules::assignments::controller::list_enrollment_requests,
        crate::modules::assignments::controller::approve_enrollment_request,
        crate::modules::assignments::controller::reject_enrollment_request,
        crate::modules::teacher_portal::controller::my_classes,
        crate::modules::teacher_portal::controller::class_students,
        crate::modules::teacher_portal::controller::class_students_with_parents,
        crate::modules::teacher_portal::controller::class_marked_dates,
        crate::modules::attendance::controller::mark_attendance,
        crate::modules::attendance::controller::list_attendance,
        crate::modules::attendance::controller::update_attendance,
        crate::modules::learning::controller::list_activities,
        crate::modules::learning::controller::create_activity,
        crate::modules::learning::controller::update_activity,
        crate::modules::learning::controller::delete_activity,
        crate::modules::learning::controller::activity_catalog,
        crate::modules::learning::controller::record_session,
        crate::modules::learning::controller::list_sessions,
        crate::modules::learning::controller::get_session,
        crate::modules::children::controller::list_children,
        crate::modules::children::controller::add_child,
        crate::modules::children::controller::children_summary,
        crate::modules::children::controller::get_child,
        crate::modules::children::controller::update_child,
        crate::modules::children::controller::remove_child,
        crate::modules::children::controller::available_classes,
        crate::modules::children::controller::request_enrollment,
        crate::modules::children::controller::child_learning_activities,
        crate::modules::children::controller::child_attendance,
        crate::modules::stories::controller::list_stories,
        crate::modules::stories::controller::create_story,
        crate::modules::stories::controller::get_story,
        crate::modules::stories::controller::update_story,
        crate::modules::stories::controller::delete_story,
        crate::modules::stories::controller::upload_attachments,
        crate::modules::stories::controller::delete_attachment,
        crate::modules::stories::controller::toggle_like,
        crate::modules::stories::controller::list_comments,
        crate::modules::stories::controller::create_comment,
        crate::modules::stories::controller::update_comment,
        crate::modules::stories::controller::delete_comment,
    ),
    components(
        schemas(ErrorResponse, MessageResponse, PaginationMeta, PaginationParams)
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login, tokens and profile"),
        (name = "Teachers", description = "Teacher accounts, managed by admins"),
        (name = "Admins", description = "Administrator accounts, managed by super admins"),
        (name = "Classes", description = "Class management"),
        (name = "Students", description = "Student records"),
        (name = "Assignments", description = "Class enrollment, teacher assignment and enrollment requests"),
        (name = "Teacher Portal", description = "A teacher's classes and students"),
        (name = "Attendance", description = "Daily attendance marking"),
        (name = "Learning", description = "Activity catalog and learning sessions"),
        (name = "Children", description = "Parent portal"),
        (name = "Stories", description = "Newsfeed with attachments, likes and comments")
    ),
    info(
        title = "Nursery API",
        version = "0.1.0",
        description = "Backend for running a nursery: classes, enrollment, attendance, learning records and a parent newsfeed.",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
