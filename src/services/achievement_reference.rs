// src/services/achievement_reference.rs
//! SQL access to `achievement_references`, the authoritative workflow record.
//!
//! Every status update is conditional on the status the caller checked, so a
//! concurrent transition makes the update match zero rows instead of silently
//! overwriting it. Callers get `false` back in that case.

use crate::{
    error::{AppError, AppResult},
    models::achievement::{
        AchievementFilter, AchievementReference, AchievementStatus, ReferenceListRow,
        RejectRequest, SubmitRequest, VerifyRequest,
    },
};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const REFERENCE_COLUMNS: &str = "r.id, r.student_id, r.mongo_achievement_id, r.status, r.submitted_at, r.verified_at, r.verified_by, r.rejection_note, r.created_at, r.updated_at";

fn reference_write_failed(e: sqlx::Error) -> AppError {
    tracing::error!("Reference write failed: {:?}", e);
    AppError::ReferenceWriteFailed(e.to_string())
}

pub async fn insert_reference(
    db_pool: &SqlitePool,
    reference: &AchievementReference,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO achievement_references
            (id, student_id, mongo_achievement_id, status, submitted_at, verified_at, verified_by, rejection_note, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&reference.id)
    .bind(&reference.student_id)
    .bind(&reference.mongo_achievement_id)
    .bind(reference.status)
    .bind(reference.submitted_at)
    .bind(reference.verified_at)
    .bind(&reference.verified_by)
    .bind(&reference.rejection_note)
    .bind(reference.created_at)
    .bind(reference.updated_at)
    .execute(db_pool)
    .await
    .map_err(reference_write_failed)?;
    Ok(())
}

pub async fn find_reference_by_id(
    db_pool: &SqlitePool,
    id: &str,
) -> AppResult<Option<AchievementReference>> {
    tracing::debug!("Looking up achievement reference {}", id);
    let sql = format!(
        "SELECT {} FROM achievement_references r WHERE r.id = ?",
        REFERENCE_COLUMNS
    );
    let reference = sqlx::query_as::<_, AchievementReference>(&sql)
        .bind(id)
        .fetch_optional(db_pool)
        .await?;
    Ok(reference)
}

/// Appends the WHERE clause shared by the page query and the count query.
fn push_filter<'q>(query: &mut QueryBuilder<'q, Sqlite>, filter: &'q AchievementFilter) {
    query.push(" WHERE ");
    match filter.status {
        Some(status) => {
            query.push("r.status = ").push_bind(status);
        }
        None => {
            query
                .push("r.status <> ")
                .push_bind(AchievementStatus::Deleted);
        }
    }

    if let Some(student_ids) = &filter.student_ids {
        query.push(" AND r.student_id IN (");
        let mut separated = query.separated(", ");
        for id in student_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");
    }
}

/// One page of references (newest first) with student display data, plus the
/// total number of matching rows ignoring pagination.
pub async fn find_references(
    db_pool: &SqlitePool,
    filter: &AchievementFilter,
) -> AppResult<(Vec<ReferenceListRow>, i64)> {
    if matches!(&filter.student_ids, Some(ids) if ids.is_empty()) {
        return Ok((Vec::new(), 0));
    }

    // 1. Total
    let mut count_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM achievement_references r");
    push_filter(&mut count_query, filter);
    let total = count_query
        .build_query_scalar::<i64>()
        .fetch_one(db_pool)
        .await?;

    // 2. Page
    let mut page_query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {}, s.nim AS student_nim, u.full_name AS student_name \
         FROM achievement_references r \
         LEFT JOIN students s ON s.id = r.student_id \
         LEFT JOIN users u ON u.id = s.user_id",
        REFERENCE_COLUMNS
    ));
    push_filter(&mut page_query, filter);
    page_query
        .push(" ORDER BY r.created_at DESC, r.rowid DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset());

    let rows = page_query
        .build_query_as::<ReferenceListRow>()
        .fetch_all(db_pool)
        .await?;

    tracing::debug!(
        "Reference query returned {} row(s) of {} (page {}, limit {})",
        rows.len(),
        total,
        filter.page,
        filter.limit
    );
    Ok((rows, total))
}

pub async fn mark_submitted(db_pool: &SqlitePool, id: &str, req: &SubmitRequest) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE achievement_references SET status = ?, submitted_at = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(AchievementStatus::Submitted)
    .bind(req.submitted_at)
    .bind(req.submitted_at)
    .bind(id)
    .bind(AchievementStatus::Draft)
    .execute(db_pool)
    .await
    .map_err(reference_write_failed)?;
    Ok(result.rows_affected() == 1)
}

pub async fn mark_verified(db_pool: &SqlitePool, id: &str, req: &VerifyRequest) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE achievement_references SET status = ?, verified_at = ?, verified_by = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(AchievementStatus::Verified)
    .bind(req.verified_at)
    .bind(&req.verifier_id)
    .bind(req.verified_at)
    .bind(id)
    .bind(AchievementStatus::Submitted)
    .execute(db_pool)
    .await
    .map_err(reference_write_failed)?;
    Ok(result.rows_affected() == 1)
}

pub async fn mark_rejected(db_pool: &SqlitePool, id: &str, req: &RejectRequest) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE achievement_references SET status = ?, verified_at = ?, verified_by = ?, rejection_note = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(AchievementStatus::Rejected)
    .bind(req.rejected_at)
    .bind(&req.verifier_id)
    .bind(&req.note)
    .bind(req.rejected_at)
    .bind(id)
    .bind(AchievementStatus::Submitted)
    .execute(db_pool)
    .await
    .map_err(reference_write_failed)?;
    Ok(result.rows_affected() == 1)
}

pub async fn mark_deleted(db_pool: &SqlitePool, id: &str, at: DateTime<Utc>) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE achievement_references SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(AchievementStatus::Deleted)
    .bind(at)
    .bind(id)
    .bind(AchievementStatus::Draft)
    .execute(db_pool)
    .await
    .map_err(reference_write_failed)?;
    Ok(result.rows_affected() == 1)
}
