// src/services/paired_record.rs
//! Writes that touch both stores for one achievement.
//!
//! An achievement is a document (content) paired with a relational reference
//! (workflow status). Nothing enforces the pairing across the two stores, so the
//! multi-store writes live here and nowhere else. They run sequentially and are
//! not compensated: a failure in the second write leaves the first in place and
//! is surfaced to the caller.

use crate::{
    documents::AchievementDocuments,
    error::{AppError, AppResult},
    models::{
        achievement::{AchievementReference, AchievementStatus},
        document::AchievementDocument,
    },
    services::achievement_reference,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct PairedRecords<'a> {
    db_pool: &'a SqlitePool,
    documents: &'a dyn AchievementDocuments,
}

impl<'a> PairedRecords<'a> {
    pub fn new(db_pool: &'a SqlitePool, documents: &'a dyn AchievementDocuments) -> Self {
        PairedRecords { db_pool, documents }
    }

    /// Document first, then a `draft` reference pointing at it.
    ///
    /// Document failure: nothing is written. Reference failure: the document stays
    /// behind as an orphan.
    pub async fn create(&self, document: &AchievementDocument) -> AppResult<AchievementReference> {
        let document_id = self.documents.insert(document).await.map_err(|e| {
            tracing::error!("Document insert failed for student {}: {}", document.student_id, e);
            AppError::DocumentWriteFailed(e.to_string())
        })?;

        let now = Utc::now();
        let reference = AchievementReference {
            id: Uuid::new_v4().to_string(),
            student_id: document.student_id.clone(),
            mongo_achievement_id: document_id,
            status: AchievementStatus::Draft,
            submitted_at: None,
            verified_at: None,
            verified_by: None,
            rejection_note: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = achievement_reference::insert_reference(self.db_pool, &reference).await {
            tracing::error!(
                "Orphaned achievement document {}: reference insert failed",
                reference.mongo_achievement_id
            );
            return Err(e);
        }

        Ok(reference)
    }

    /// Soft-deletes the document, then moves the reference from `draft` to `deleted`.
    ///
    /// Returns `false` when the reference was no longer `draft` at update time; the
    /// document is already marked deleted at that point.
    pub async fn soft_delete(&self, reference: &AchievementReference) -> AppResult<bool> {
        self.documents
            .soft_delete(&reference.mongo_achievement_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Soft delete of document {} failed: {}",
                    reference.mongo_achievement_id,
                    e
                );
                AppError::DocumentWriteFailed(e.to_string())
            })?;

        let updated =
            achievement_reference::mark_deleted(self.db_pool, &reference.id, Utc::now()).await;
        if updated.is_err() {
            tracing::error!(
                "Document {} is soft-deleted but reference {} is not",
                reference.mongo_achievement_id,
                reference.id
            );
        }
        updated
    }
}
