// src/web/mw_admin.rs
use crate::{error::AppError, models::user::Role, web::mw_auth::CurrentUser};
use axum::{extract::Request, middleware::Next, response::Response, Extension};

/// Admin-only routes. Runs after `require_auth`.
pub async fn require_admin(
    Extension(current): Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if current.role != Role::Admin {
        tracing::warn!("Admin MW: access denied for {} ({})", current.user_id, current.role);
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}
