// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{LoginRequest, UserProfile},
    services::{auth_service, user_service},
    state::AppState,
    web::{
        mw_auth::{CurrentUser, SESSION_ROLE, SESSION_USER_ID},
        response::ApiResponse,
    },
};
use axum::{extract::State, Extension, Json};
use tower_sessions::Session;

// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<UserProfile>> {
    tracing::info!("Login attempt for '{}'", req.username);

    // 1. Credentials
    let user = auth_service::authenticate(&state.db_pool, &req.username, &req.password).await?;

    let role = user.role().ok_or_else(|| {
        tracing::error!("User '{}' has unknown role '{}'", user.username, user.role_name);
        AppError::InternalServerError
    })?;

    // 2. Fresh session id, then identity + role
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("failed to cycle session id: {}", e)))?;
    session
        .insert(SESSION_USER_ID, &user.id)
        .await
        .map_err(|e| AppError::SessionError(format!("failed to store user: {}", e)))?;
    session
        .insert(SESSION_ROLE, role.as_str())
        .await
        .map_err(|e| AppError::SessionError(format!("failed to store role: {}", e)))?;

    tracing::info!("✅ Login succeeded for '{}' ({})", user.username, role);
    Ok(ApiResponse::ok("Login successful", UserProfile::from(user)))
}

// POST /api/v1/auth/logout
pub async fn handle_logout(session: Session) -> AppResult<ApiResponse<()>> {
    let user_id: Option<String> = session.get(SESSION_USER_ID).await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("failed to delete session: {}", e)))?;

    match user_id {
        Some(id) => tracing::info!("🚪 User '{}' logged out.", id),
        None => tracing::info!("🚪 Anonymous session closed."),
    }
    Ok(ApiResponse::message("Logged out"))
}

// GET /api/v1/auth/profile
pub async fn handle_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<ApiResponse<UserProfile>> {
    let user = user_service::find_user_by_id(&state.db_pool, &current.user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(ApiResponse::ok("Profile retrieved", UserProfile::from(user)))
}
