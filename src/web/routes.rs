// src/web/routes.rs
use crate::{
    state::AppState,
    web::{achievement_handlers, auth_handlers, mw_admin, mw_auth, report_handlers, user_handlers},
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(app_state: AppState) -> Router {
    let upload_limit = app_state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    // --- Public ---
    let public_routes = Router::new()
        .route("/auth/login", post(auth_handlers::handle_login))
        .route("/auth/logout", post(auth_handlers::handle_logout));

    // --- Achievements (any logged-in role; the service scopes by role) ---
    let achievement_routes = Router::new()
        .route(
            "/",
            get(achievement_handlers::handle_list).post(achievement_handlers::handle_create),
        )
        .route("/{id}", axum::routing::delete(achievement_handlers::handle_delete))
        .route("/{id}/submit", post(achievement_handlers::handle_submit))
        .route("/{id}/verify", post(achievement_handlers::handle_verify))
        .route("/{id}/reject", post(achievement_handlers::handle_reject))
        .route(
            "/{id}/attachments",
            post(achievement_handlers::handle_upload_evidence)
                .layer(DefaultBodyLimit::max(upload_limit)),
        );

    // --- Users (admin only) ---
    let user_routes = Router::new()
        .route(
            "/",
            get(user_handlers::handle_list_users).post(user_handlers::handle_create_user),
        )
        .route(
            "/{id}",
            put(user_handlers::handle_update_user).delete(user_handlers::handle_delete_user),
        )
        .route("/{id}/advisor", put(user_handlers::handle_assign_advisor))
        .route_layer(middleware::from_fn(mw_admin::require_admin));

    // --- Authenticated ---
    // require_auth wraps everything above it, nested routers included
    let authenticated_routes = Router::new()
        .route("/auth/profile", get(auth_handlers::handle_profile))
        .route("/reports/statistics", get(report_handlers::handle_statistics))
        .nest("/achievements", achievement_routes)
        .nest("/users", user_routes)
        .route_layer(middleware::from_fn(mw_auth::require_auth));

    let uploads = ServeDir::new(&app_state.config.upload_dir);

    Router::new()
        .nest("/api/v1", public_routes.merge(authenticated_routes))
        .nest_service("/uploads", uploads)
        .with_state(app_state)
}
