// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUserRequest, Role, RoleRecord, UpdateUserRequest, User},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.password_hash, u.full_name, u.role_id,
           r.name AS role_name, u.is_active, u.created_at, u.updated_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

/// True when sqlx reports a UNIQUE (or primary key) violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by id: {}", user_id);
    let sql = format!("{} WHERE u.id = ?", USER_SELECT);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_username(
    db_pool: &SqlitePool,
    username: &str,
) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by username: {}", username);
    let sql = format!("{} WHERE u.username = ?", USER_SELECT);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn find_all_users(db_pool: &SqlitePool) -> AppResult<Vec<User>> {
    let sql = format!("{} ORDER BY u.username ASC", USER_SELECT);
    let users = sqlx::query_as::<_, User>(&sql).fetch_all(db_pool).await?;
    tracing::debug!("Found {} users.", users.len());
    Ok(users)
}

pub async fn find_role_by_name(db_pool: &SqlitePool, name: &str) -> AppResult<Option<RoleRecord>> {
    let role = sqlx::query_as::<_, RoleRecord>(
        "SELECT id, name, description FROM roles WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(db_pool)
    .await?;
    Ok(role)
}

/// Creates a user and, for students and advisors, its academic profile in the
/// same transaction.
pub async fn create_user(db_pool: &SqlitePool, req: &CreateUserRequest) -> AppResult<User> {
    tracing::info!("Creating user '{}' with role '{}'", req.username, req.role_name);

    if req.username.trim().is_empty() || req.email.trim().is_empty() || req.full_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "username, email and full_name are required".to_string(),
        ));
    }
    if req.password.len() < 6 {
        return Err(AppError::BadRequest(
            "password must be at least 6 characters".to_string(),
        ));
    }

    // 1. Resolve the role
    let role = req
        .role_name
        .parse::<Role>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let role_record = find_role_by_name(db_pool, role.as_str())
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("invalid role name: {}", req.role_name)))?;

    // 2. Validate the profile data before touching the database
    let nim = non_blank(&req.nim);
    let lecturer_code = non_blank(&req.lecturer_id);
    match role {
        Role::Student if nim.is_none() => {
            return Err(AppError::BadRequest("NIM is required for Mahasiswa".to_string()));
        }
        Role::Advisor if lecturer_code.is_none() => {
            return Err(AppError::BadRequest(
                "lecturer_id (NIP) is required for Dosen Wali".to_string(),
            ));
        }
        _ => {}
    }

    let password_hash = crate::services::auth_service::hash_password(&req.password).await?;
    let user_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    // 3. User + profile atomically
    let mut tx = db_pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, full_name, role_id, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&user_id)
    .bind(req.username.trim())
    .bind(req.email.trim())
    .bind(&password_hash)
    .bind(req.full_name.trim())
    .bind(&role_record.id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
        tx.rollback().await?;
        if is_unique_violation(&e) {
            tracing::warn!("User creation failed: username or email already taken ({})", req.username);
            return Err(AppError::Conflict("Username or email already exists".to_string()));
        }
        return Err(e.into());
    }

    let profile_result = match role {
        Role::Student => {
            sqlx::query(
                r#"
                INSERT INTO students (id, user_id, nim, program_study, academic_year, advisor_id, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, NULL, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&user_id)
            .bind(nim)
            .bind(req.program_study.clone().unwrap_or_default())
            .bind(req.academic_year.clone().unwrap_or_default())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map(|_| ())
        }
        Role::Advisor => {
            sqlx::query(
                r#"
                INSERT INTO lecturers (id, user_id, lecturer_id, department, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&user_id)
            .bind(lecturer_code)
            .bind(req.department.clone().unwrap_or_default())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map(|_| ())
        }
        Role::Admin => Ok(()),
    };

    if let Err(e) = profile_result {
        tx.rollback().await?;
        if is_unique_violation(&e) {
            tracing::warn!("User creation failed: profile identifier already in use");
            return Err(AppError::Conflict("NIM or lecturer id already exists".to_string()));
        }
        return Err(e.into());
    }

    tx.commit().await?;
    tracing::info!("✅ User '{}' created.", req.username);

    find_user_by_id(db_pool, &user_id)
        .await?
        .ok_or(AppError::InternalServerError)
}

/// Partial update: only the fields present in the request change.
pub async fn update_user(
    db_pool: &SqlitePool,
    user_id: &str,
    req: &UpdateUserRequest,
) -> AppResult<User> {
    tracing::info!("Updating user {}", user_id);

    let mut user = find_user_by_id(db_pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if let Some(full_name) = non_blank(&req.full_name) {
        user.full_name = full_name.to_string();
    }
    if let Some(email) = non_blank(&req.email) {
        user.email = email.to_string();
    }
    if let Some(is_active) = req.is_active {
        user.is_active = is_active;
    }

    let result = sqlx::query(
        "UPDATE users SET full_name = ?, email = ?, is_active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(user.is_active)
    .bind(Utc::now())
    .bind(user_id)
    .execute(db_pool)
    .await;

    match result {
        Err(e) if is_unique_violation(&e) => {
            Err(AppError::Conflict("Email already exists".to_string()))
        }
        Err(e) => Err(e.into()),
        Ok(_) => {
            tracing::info!("✅ User {} updated.", user_id);
            find_user_by_id(db_pool, user_id)
                .await?
                .ok_or(AppError::NotFound("User"))
        }
    }
}

/// Hard delete. Profiles cascade; a student who still owns achievements is
/// protected by the foreign key on `achievement_references`.
pub async fn delete_user(db_pool: &SqlitePool, user_id: &str) -> AppResult<()> {
    tracing::info!("Deleting user {}", user_id);

    if find_user_by_id(db_pool, user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }

    match sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(db_pool)
        .await
    {
        Ok(_) => {
            tracing::info!("✅ User {} deleted.", user_id);
            Ok(())
        }
        Err(e) if is_foreign_key_violation(&e) => {
            tracing::warn!("Refusing to delete user {}: still referenced", user_id);
            Err(AppError::Conflict(
                "User still owns achievement records and cannot be deleted".to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
