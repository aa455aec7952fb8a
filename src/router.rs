use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::role::{require_admin, require_parent, require_super_admin, require_teacher};
use crate::modules::admins::init_admins_router;
use crate::modules::assignments::init_assignments_router;
use crate::modules::attendance::init_attendance_router;
use crate::modules::auth::{init_auth_public_router, init_auth_router};
use crate::modules::children::init_children_router;
use crate::modules::classes::init_classes_router;
use crate::modules::learning::{init_activity_catalog_router, init_learning_sessions_router};
use crate::modules::stories::init_stories_router;
use crate::modules::students::init_students_router;
use crate::modules::teacher_portal::init_teacher_portal_router;
use crate::modules::teachers::init_teachers_router;
use crate::state::AppState;

fn auth_routes(state: &AppState) -> Router<AppState> {
    let mut public = init_auth_public_router();
    if let Some(config) = state.rate_limit_config.auth_governor_config() {
        public = public.layer(GovernorLayer::new(Arc::new(config)));
    }
    public.merge(init_auth_router())
}

/// `/admin`: admins only, with `/admins` further limited to super admins.
fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/teachers", init_teachers_router())
        .nest("/classes", init_classes_router())
        .nest("/students", init_students_router())
        .nest("/learning-activities", init_activity_catalog_router())
        .merge(init_assignments_router())
        .nest(
            "/admins",
            init_admins_router().route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_super_admin,
            )),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
}

fn teacher_routes(state: &AppState) -> Router<AppState> {
    init_teacher_portal_router()
        .nest("/attendance", init_attendance_router())
        .nest("/learning-activities", init_learning_sessions_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_teacher))
}

fn parent_routes(state: &AppState) -> Router<AppState> {
    init_children_router()
        .route_layer(middleware::from_fn_with_state(state.clone(), require_parent))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(&state))
        .nest("/admin", admin_routes(&state))
        .nest("/teacher", teacher_routes(&state))
        .nest("/parent", parent_routes(&state))
        .nest("/stories", init_stories_router());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .nest_service("/media", ServeDir::new(&state.storage_config.media_root))
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
