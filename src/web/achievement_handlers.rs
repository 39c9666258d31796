// src/web/achievement_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::achievement::{
        AchievementFilter, AchievementPage, AchievementReference, AchievementStatus,
        AttachmentView, CreateAchievementRequest, EvidenceFile,
    },
    services::{achievement_service, upload_service},
    state::AppState,
    web::{mw_auth::CurrentUser, response::ApiResponse},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    #[serde(default)]
    pub note: String,
}

/// Blank means unset; anything non-numeric is a 400 in the usual error envelope.
fn parse_paging_param(name: &str, raw: Option<&str>) -> AppResult<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{} must be an integer", name))),
    }
}

/// Achievement ids are UUIDs; anything else is a client error.
fn parse_achievement_id(raw: &str) -> AppResult<String> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::BadRequest("Invalid achievement ID".to_string()))
}

// POST /api/v1/achievements
pub async fn handle_create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateAchievementRequest>,
) -> AppResult<ApiResponse<AchievementReference>> {
    if req.title.trim().is_empty() || req.achievement_type.trim().is_empty() {
        return Err(AppError::BadRequest("title and type are required".to_string()));
    }

    let reference = achievement_service::create_achievement(
        &state.db_pool,
        state.documents.as_ref(),
        &current.user_id,
        &req,
    )
    .await?;
    Ok(ApiResponse::created("Achievement created", reference))
}

// GET /api/v1/achievements?page&limit&status&student_id
pub async fn handle_list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<AchievementPage>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<AchievementStatus>().map_err(AppError::BadRequest)?),
    };

    let page = parse_paging_param("page", query.page.as_deref())?;
    let limit = parse_paging_param("limit", query.limit.as_deref())?;

    let mut filter = AchievementFilter::new(status, page, limit);
    if let Some(student_id) = query.student_id.filter(|s| !s.trim().is_empty()) {
        filter.student_ids = Some(vec![student_id]);
    }

    let page = achievement_service::list_achievements(
        &state.db_pool,
        state.documents.as_ref(),
        &current.user_id,
        current.role,
        filter,
    )
    .await?;
    Ok(ApiResponse::ok("Achievements retrieved", page))
}

// DELETE /api/v1/achievements/{id}
pub async fn handle_delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let id = parse_achievement_id(&id)?;
    achievement_service::delete_achievement(
        &state.db_pool,
        state.documents.as_ref(),
        &current.user_id,
        &id,
    )
    .await?;
    Ok(ApiResponse::message("Achievement deleted"))
}

// POST /api/v1/achievements/{id}/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<AchievementReference>> {
    let id = parse_achievement_id(&id)?;
    let reference = achievement_service::submit_achievement(&state.db_pool, &current.user_id, &id).await?;
    Ok(ApiResponse::ok("Achievement submitted for verification", reference))
}

// POST /api/v1/achievements/{id}/verify
pub async fn handle_verify(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<AchievementReference>> {
    let id = parse_achievement_id(&id)?;
    let reference = achievement_service::verify_achievement(&state.db_pool, &current.user_id, &id).await?;
    Ok(ApiResponse::ok("Achievement verified", reference))
}

// POST /api/v1/achievements/{id}/reject  {note}
pub async fn handle_reject(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<RejectBody>,
) -> AppResult<ApiResponse<AchievementReference>> {
    let id = parse_achievement_id(&id)?;
    if body.note.trim().is_empty() {
        return Err(AppError::BadRequest("Rejection note is required".to_string()));
    }

    let reference =
        achievement_service::reject_achievement(&state.db_pool, &current.user_id, &id, &body.note)
            .await?;
    Ok(ApiResponse::ok("Achievement rejected", reference))
}

// POST /api/v1/achievements/{id}/attachments  (multipart, field "file")
pub async fn handle_upload_evidence(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<AttachmentView>> {
    let id = parse_achievement_id(&id)?;

    // 1. Find the "file" part
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Uploaded part has no file name".to_string()))?;
        let file_type = field
            .content_type()
            .unwrap_or(DEFAULT_FILE_TYPE)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        upload = Some((file_name, file_type, bytes));
        break;
    }
    let (file_name, file_type, bytes) = upload.ok_or_else(|| {
        AppError::BadRequest("Failed to get file. Ensure the field name is 'file'".to_string())
    })?;
    tracing::info!("📥 Evidence upload '{}' ({} bytes) for achievement {}", file_name, bytes.len(), id);

    // 2. Store the bytes, then record the attachment
    let stored = upload_service::save_evidence_file(&state.config, &file_name, &bytes).await?;
    let view = achievement_service::upload_evidence(
        &state.db_pool,
        state.documents.as_ref(),
        &current.user_id,
        &id,
        EvidenceFile {
            file_name,
            file_url: stored.url,
            file_type,
        },
    )
    .await?;
    Ok(ApiResponse::ok("File uploaded successfully", view))
}
