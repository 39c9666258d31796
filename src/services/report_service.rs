// src/services/report_service.rs
use crate::{
    documents::AchievementDocuments,
    error::AppResult,
    models::{
        achievement::UNKNOWN_STUDENT_NIM,
        report::{DashboardStats, TopStudent, TOP_STUDENT_LIMIT, UNKNOWN_LEADERBOARD_NAME},
    },
    services::academic_service,
};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};

/// Leaderboard and per-type counts over every live document, whatever its
/// workflow status. Either aggregation failing fails the whole call.
pub async fn get_dashboard_stats(
    db_pool: &SqlitePool,
    documents: &dyn AchievementDocuments,
) -> AppResult<DashboardStats> {
    // 1. Aggregations
    let by_type = documents.count_by_type().await?;
    let ranked = documents.top_students(TOP_STUDENT_LIMIT).await?;

    // 2. Names from the identity store, one bulk fetch
    let student_ids: Vec<String> = ranked.iter().map(|s| s.student_id.clone()).collect();
    let identities: HashMap<String, _> =
        academic_service::find_student_identities(db_pool, &student_ids)
            .await?
            .into_iter()
            .map(|identity| (identity.id.clone(), identity))
            .collect();

    // 3. Merge
    let top_students = ranked
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let (name, nim) = match identities.get(&entry.student_id) {
                Some(identity) => (
                    identity
                        .full_name
                        .clone()
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or_else(|| UNKNOWN_LEADERBOARD_NAME.to_string()),
                    identity.nim.clone(),
                ),
                None => {
                    tracing::warn!("Leaderboard student {} has no identity record", entry.student_id);
                    (
                        UNKNOWN_LEADERBOARD_NAME.to_string(),
                        UNKNOWN_STUDENT_NIM.to_string(),
                    )
                }
            };
            TopStudent {
                rank: i + 1,
                name,
                nim,
                total_points: entry.total_points,
                total_achievements: entry.total_achievements,
            }
        })
        .collect();

    let achievements_by_type: BTreeMap<String, i64> = by_type
        .into_iter()
        .map(|t| (t.achievement_type, t.count))
        .collect();

    tracing::debug!(
        "Dashboard stats: {} type(s), {} ranked student(s)",
        achievements_by_type.len(),
        student_ids.len()
    );
    Ok(DashboardStats {
        top_students,
        achievements_by_type,
    })
}
