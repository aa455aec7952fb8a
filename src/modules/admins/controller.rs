use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AdminResetPasswordDto, AdminWithUser, CreateAdminDto, PaginatedAdminsResponse,
    StaffFilterParams, UpdateAdminDto,
};
use super::service::AdminService;
use crate::middleware::auth::RequireSuperAdmin;
use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/v1/admin/admins",
    params(StaffFilterParams),
    responses(
        (status = 200, description = "Admins", body = PaginatedAdminsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Super admins only", body = ErrorResponse)
    ),
    tag = "Admins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _super_admin))]
pub async fn list_admins(
    State(state): State<AppState>,
    _super_admin: RequireSuperAdmin,
    Query(filters): Query<StaffFilterParams>,
) -> Result<Json<PaginatedAdminsResponse>, AppError> {
    let admins = AdminService::list_admins(&state.db, filters).await?;
    Ok(Json(admins))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/admins",
    request_body = CreateAdminDto,
    responses(
        (status = 201, description = "Admin created", body = AdminWithUser),
        (status = 400, description = "Validation error or email taken", body = ErrorResponse),
        (status = 403, description = "Super admins only", body = ErrorResponse)
    ),
    tag = "Admins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _super_admin, dto))]
pub async fn create_admin(
    State(state): State<AppState>,
    _super_admin: RequireSuperAdmin,
    ValidatedJson(dto): ValidatedJson<CreateAdminDto>,
) -> Result<(StatusCode, Json<AdminWithUser>), AppError> {
    let temporary_password = dto.password.clone();
    let admin = AdminService::create_admin(&state.db, dto).await?;

    let email_service = state.email_service();
    let content = email_service.account_created_email(
        &format!("{} {}", admin.first_name, admin.last_name),
        &admin.email,
        &temporary_password,
        "administrator",
    );
    email_service
        .send_or_log("account_created", &admin.email, content)
        .await;

    Ok((StatusCode::CREATED, Json(admin)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/admins/{id}",
    params(("id" = Uuid, Path, description = "Admin profile ID")),
    responses(
        (status = 200, description = "Admin", body = AdminWithUser),
        (status = 404, description = "Admin not found", body = ErrorResponse)
    ),
    tag = "Admins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _super_admin))]
pub async fn get_admin(
    State(state): State<AppState>,
    _super_admin: RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminWithUser>, AppError> {
    let admin = AdminService::get_admin(&state.db, id).await?;
    Ok(Json(admin))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/admins/{id}",
    params(("id" = Uuid, Path, description = "Admin profile ID")),
    request_body = UpdateAdminDto,
    responses(
        (status = 200, description = "Admin updated", body = AdminWithUser),
        (status = 400, description = "Validation error or self-deactivation", body = ErrorResponse),
        (status = 404, description = "Admin not found", body = ErrorResponse)
    ),
    tag = "Admins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, super_admin, dto))]
pub async fn update_admin(
    State(state): State<AppState>,
    RequireSuperAdmin(super_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAdminDto>,
) -> Result<Json<AdminWithUser>, AppError> {
    let admin = AdminService::update_admin(&state.db, id, super_admin.user_id()?, dto).await?;
    Ok(Json(admin))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/admins/{id}",
    params(("id" = Uuid, Path, description = "Admin profile ID")),
    responses(
        (status = 200, description = "Admin deactivated", body = MessageResponse),
        (status = 400, description = "Cannot deactivate yourself", body = ErrorResponse),
        (status = 404, description = "Admin not found", body = ErrorResponse)
    ),
    tag = "Admins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, super_admin))]
pub async fn delete_admin(
    State(state): State<AppState>,
    RequireSuperAdmin(super_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    AdminService::delete_admin(&state.db, id, super_admin.user_id()?).await?;
    Ok(Json(MessageResponse::new("Admin deactivated successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/admins/{id}/reset-password",
    params(("id" = Uuid, Path, description = "Admin profile ID")),
    request_body = AdminResetPasswordDto,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 404, description = "Admin not found", body = ErrorResponse)
    ),
    tag = "Admins",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _super_admin, dto))]
pub async fn reset_admin_password(
    State(state): State<AppState>,
    _super_admin: RequireSuperAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AdminResetPasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let admin = AdminService::reset_password(&state.db, id, dto).await?;
    Ok(Json(MessageResponse::new(format!(
        "Password reset for {} {}. They must change it at next login.",
        admin.first_name, admin.last_name
    ))))
}
