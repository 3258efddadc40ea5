use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use corbel_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;
mod platform;

use cors::build_cors_layer;
use platform::build_platform_routes;

pub fn build_router<Store>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/authorization/check",
            post(handlers::authorization::check_permission_handler),
        )
        .route(
            "/api/authorization/projects/{project_id}/check",
            post(handlers::authorization::check_project_permission_handler),
        )
        .route(
            "/api/authorization/effective-permissions",
            get(handlers::authorization::effective_permissions_handler),
        )
        .route(
            "/api/catalog/permissions",
            get(handlers::catalog::list_permissions_handler),
        )
        .route(
            "/api/catalog/templates",
            get(handlers::catalog::list_role_templates_handler),
        )
        .route(
            "/api/catalog/templates/{template_id}",
            get(handlers::catalog::role_template_handler),
        )
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::roles::get_role_handler).patch(handlers::roles::update_role_handler),
        )
        .route(
            "/api/roles/{role_id}/deactivate",
            post(handlers::roles::deactivate_role_handler),
        )
        .route(
            "/api/role-assignments",
            get(handlers::assignments::list_role_assignments_handler)
                .post(handlers::assignments::assign_role_handler),
        )
        .route(
            "/api/role-assignments/{assignment_id}/revoke",
            post(handlers::assignments::revoke_role_assignment_handler),
        )
        .route(
            "/api/project-assignments",
            get(handlers::assignments::list_project_assignments_handler)
                .post(handlers::assignments::assign_project_role_handler),
        )
        .route(
            "/api/project-assignments/{assignment_id}/revoke",
            post(handlers::assignments::revoke_project_assignment_handler),
        )
        .route(
            "/api/audit-log",
            get(handlers::audit::list_audit_log_handler),
        )
        .route(
            "/api/tenant/members",
            post(handlers::members::add_member_handler),
        )
        .merge(build_platform_routes())
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
