// src/web/mw_auth.rs
use crate::{error::AppError, models::user::Role};
use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

pub const SESSION_USER_ID: &str = "user_id";
pub const SESSION_ROLE: &str = "role";

/// Acting user, resolved once from the session and handed to handlers as an extension.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user_id: String,
    pub role: Role,
}

/// Rejects requests without a logged-in session (401).
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = session
        .get::<String>(SESSION_USER_ID)
        .await
        .map_err(session_read_failed)?;
    let role_name = session
        .get::<String>(SESSION_ROLE)
        .await
        .map_err(session_read_failed)?;

    let (Some(user_id), Some(role_name)) = (user_id, role_name) else {
        tracing::debug!("Auth MW: no session user");
        return Err(AppError::Unauthenticated);
    };

    let role = role_name.parse::<Role>().map_err(|e| {
        tracing::warn!("Auth MW: session for {} carries {}", user_id, e);
        AppError::Unauthenticated
    })?;

    tracing::debug!("Auth MW: user '{}' ({}) authenticated", user_id, role);
    request.extensions_mut().insert(CurrentUser { user_id, role });
    Ok(next.run(request).await)
}

fn session_read_failed<E: std::fmt::Display + std::fmt::Debug>(e: E) -> AppError {
    tracing::error!("Auth MW: failed to read session: {:?}", e);
    AppError::SessionError(format!("failed to read session: {}", e))
}
