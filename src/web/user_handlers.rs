// src/web/user_handlers.rs
//! Admin-only user management.
use crate::{
    error::AppResult,
    models::{
        academic::Student,
        user::{AssignAdvisorRequest, CreateUserRequest, UpdateUserRequest, UserProfile},
    },
    services::{academic_service, user_service},
    state::AppState,
    web::response::ApiResponse,
};
use axum::{
    extract::{Path, State},
    Json,
};

// GET /api/v1/users
pub async fn handle_list_users(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<UserProfile>>> {
    let users = user_service::find_all_users(&state.db_pool).await?;
    let profiles = users.into_iter().map(UserProfile::from).collect();
    Ok(ApiResponse::ok("Users retrieved", profiles))
}

// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<ApiResponse<UserProfile>> {
    let user = user_service::create_user(&state.db_pool, &req).await?;
    Ok(ApiResponse::created("User created", UserProfile::from(user)))
}

// PUT /api/v1/users/{id}
pub async fn handle_update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserProfile>> {
    let user = user_service::update_user(&state.db_pool, &id, &req).await?;
    Ok(ApiResponse::ok("User updated", UserProfile::from(user)))
}

// DELETE /api/v1/users/{id}
pub async fn handle_delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    user_service::delete_user(&state.db_pool, &id).await?;
    Ok(ApiResponse::message("User deleted"))
}

// PUT /api/v1/users/{id}/advisor  {lecturer_id | null}
pub async fn handle_assign_advisor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AssignAdvisorRequest>,
) -> AppResult<ApiResponse<Student>> {
    let lecturer_id = req
        .lecturer_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let student = academic_service::set_student_advisor(&state.db_pool, &id, lecturer_id).await?;
    Ok(ApiResponse::ok("Advisor updated", student))
}
