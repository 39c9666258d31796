// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::User,
    services::user_service,
};
use sqlx::SqlitePool;

/// Checks a password against the stored bcrypt hash (off the async executor).
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &stored_hash))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking failed (verify_password): {:?}", e);
            AppError::InternalServerError
        })?
        .map_err(|e| {
            tracing::error!("bcrypt error while verifying password: {:?}", e);
            AppError::PasswordHashingError
        })
}

/// Produces a bcrypt hash for a new password.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking failed (hash_password): {:?}", e);
            AppError::InternalServerError
        })?
        .map_err(|e| {
            tracing::error!("bcrypt error while hashing password: {:?}", e);
            AppError::PasswordHashingError
        })
}

/// Resolves username + password into an active user. Unknown user and wrong
/// password produce the same error.
pub async fn authenticate(db_pool: &SqlitePool, username: &str, password: &str) -> AppResult<User> {
    let user = match user_service::find_user_by_username(db_pool, username).await? {
        Some(user) => user,
        None => {
            tracing::warn!("Login failed: unknown username '{}'", username);
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash).await? {
        tracing::warn!("Login failed: wrong password for '{}'", username);
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        tracing::warn!("Login refused: account '{}' is inactive", username);
        return Err(AppError::AccountInactive);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::test_pool, services::test_support::Fixture};

    #[tokio::test]
    async fn authenticate_accepts_right_password_only() {
        let pool = test_pool().await;
        let fx = Fixture::new(&pool).await;
        let hash = bcrypt::hash("rahasia123", 4).unwrap();
        fx.user_with_hash("test_login_user", crate::models::user::Role::Student, &hash)
            .await;

        let user = authenticate(&pool, "test_login_user", "rahasia123").await.unwrap();
        assert_eq!(user.username, "test_login_user");
        assert_eq!(user.role_name, "Mahasiswa");

        let err = authenticate(&pool, "test_login_user", "salah_pass").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = authenticate(&pool, "nobody", "rahasia123").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn inactive_accounts_cannot_log_in() {
        let pool = test_pool().await;
        let fx = Fixture::new(&pool).await;
        let hash = bcrypt::hash("pw", 4).unwrap();
        let user_id = fx
            .user_with_hash("dormant", crate::models::user::Role::Admin, &hash)
            .await;
        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(&user_id)
            .execute(&pool)
            .await
            .unwrap();

        let err = authenticate(&pool, "dormant", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::AccountInactive));
    }
}
