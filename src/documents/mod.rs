// src/documents/mod.rs
//! Document store access for achievement content.
//!
//! The lifecycle service only sees the `AchievementDocuments` trait; ids cross
//! the boundary as opaque strings so the relational side never depends on the
//! document store's id type.

pub mod mongo;

#[cfg(test)]
pub mod memory;

use crate::models::document::{AchievementDocument, Attachment, StudentPoints, TypeCount};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("{0}")]
    Backend(String),

    #[error("invalid document id: {0}")]
    InvalidId(String),

    #[error("document {0} not found")]
    NotFound(String),

    #[error("failed to decode document: {0}")]
    Decode(String),
}

impl From<mongodb::error::Error> for DocumentStoreError {
    fn from(e: mongodb::error::Error) -> Self {
        DocumentStoreError::Backend(e.to_string())
    }
}

impl From<bson::de::Error> for DocumentStoreError {
    fn from(e: bson::de::Error) -> Self {
        DocumentStoreError::Decode(e.to_string())
    }
}

#[async_trait]
pub trait AchievementDocuments: Send + Sync {
    /// Persists a new document and returns its id.
    async fn insert(&self, document: &AchievementDocument) -> Result<String, DocumentStoreError>;

    /// Bulk fetch by id. Soft-deleted documents and unparseable ids are skipped.
    async fn find_live_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<AchievementDocument>, DocumentStoreError>;

    /// Sets the deletion timestamp. A document that is already gone is not an error.
    async fn soft_delete(&self, id: &str) -> Result<(), DocumentStoreError>;

    /// Atomically appends one attachment.
    async fn push_attachment(
        &self,
        id: &str,
        attachment: &Attachment,
    ) -> Result<(), DocumentStoreError>;

    /// Live documents grouped by achievement type.
    async fn count_by_type(&self) -> Result<Vec<TypeCount>, DocumentStoreError>;

    /// Students ranked by summed points over live documents, best first.
    /// Ties: more achievements first, then student id ascending.
    async fn top_students(&self, limit: i64) -> Result<Vec<StudentPoints>, DocumentStoreError>;
}
