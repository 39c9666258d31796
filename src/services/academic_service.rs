// src/services/academic_service.rs
use crate::{
    error::{AppError, AppResult},
    models::academic::{Lecturer, Student, StudentIdentity},
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const STUDENT_COLUMNS: &str =
    "id, user_id, nim, program_study, academic_year, advisor_id, created_at, updated_at";
const LECTURER_COLUMNS: &str = "id, user_id, lecturer_id, department, created_at, updated_at";

/// Student profile belonging to a user account, if any.
pub async fn find_student_by_user_id(
    db_pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Option<Student>> {
    tracing::debug!("Looking up student profile for user {}", user_id);
    let sql = format!("SELECT {} FROM students WHERE user_id = ?", STUDENT_COLUMNS);
    let student = sqlx::query_as::<_, Student>(&sql)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(student)
}

pub async fn find_student_by_id(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Student>> {
    let sql = format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS);
    let student = sqlx::query_as::<_, Student>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?;
    Ok(student)
}

/// Lecturer profile belonging to a user account, if any.
pub async fn find_lecturer_by_user_id(
    db_pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Option<Lecturer>> {
    tracing::debug!("Looking up lecturer profile for user {}", user_id);
    let sql = format!("SELECT {} FROM lecturers WHERE user_id = ?", LECTURER_COLUMNS);
    let lecturer = sqlx::query_as::<_, Lecturer>(&sql)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(lecturer)
}

pub async fn find_lecturer_by_id(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Lecturer>> {
    let sql = format!("SELECT {} FROM lecturers WHERE id = ?", LECTURER_COLUMNS);
    let lecturer = sqlx::query_as::<_, Lecturer>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?;
    Ok(lecturer)
}

/// Ids of the students currently advised by a lecturer.
pub async fn find_student_ids_by_advisor(
    db_pool: &SqlitePool,
    lecturer_id: &str,
) -> AppResult<Vec<String>> {
    let ids: Vec<String> =
        sqlx::query_scalar("SELECT id FROM students WHERE advisor_id = ? ORDER BY nim ASC")
            .bind(lecturer_id)
            .fetch_all(db_pool)
            .await?;
    tracing::debug!("Lecturer {} advises {} student(s)", lecturer_id, ids.len());
    Ok(ids)
}

/// Bulk lookup of student display data (NIM + full name).
pub async fn find_student_identities(
    db_pool: &SqlitePool,
    ids: &[String],
) -> AppResult<Vec<StudentIdentity>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT s.id, s.nim, u.full_name FROM students s LEFT JOIN users u ON u.id = s.user_id WHERE s.id IN (",
    );
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let students = query
        .build_query_as::<StudentIdentity>()
        .fetch_all(db_pool)
        .await?;
    Ok(students)
}

/// Assigns (or clears, with `None`) the advisor of the student profile owned by `user_id`.
pub async fn set_student_advisor(
    db_pool: &SqlitePool,
    user_id: &str,
    lecturer_id: Option<&str>,
) -> AppResult<Student> {
    let student = find_student_by_user_id(db_pool, user_id)
        .await?
        .ok_or(AppError::ProfileNotFound("Student"))?;

    if let Some(lecturer_id) = lecturer_id {
        if find_lecturer_by_id(db_pool, lecturer_id).await?.is_none() {
            tracing::warn!("Advisor assignment refused: lecturer {} does not exist", lecturer_id);
            return Err(AppError::BadRequest(format!(
                "Lecturer '{}' does not exist",
                lecturer_id
            )));
        }
    }

    sqlx::query("UPDATE students SET advisor_id = ?, updated_at = ? WHERE id = ?")
        .bind(lecturer_id)
        .bind(Utc::now())
        .bind(&student.id)
        .execute(db_pool)
        .await?;

    tracing::info!(
        "Advisor of student {} set to {}",
        student.nim,
        lecturer_id.unwrap_or("<none>")
    );
    find_student_by_id(db_pool, &student.id)
        .await?
        .ok_or(AppError::InternalServerError)
}
