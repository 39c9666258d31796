// src/documents/memory.rs
//! In-process document store for tests, with switchable failures.

use super::{AchievementDocuments, DocumentStoreError};
use crate::models::document::{AchievementDocument, Attachment, StudentPoints, TypeCount};
use async_trait::async_trait;
use bson::DateTime;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

#[derive(Default)]
pub struct InMemoryDocuments {
    // Insertion order stands in for natural storage order
    documents: Mutex<Vec<AchievementDocument>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_aggregations: AtomicBool,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_aggregations(&self, fail: bool) {
        self.fail_aggregations.store(fail, Ordering::SeqCst);
    }

    /// Raw lookup, soft-deleted documents included.
    pub fn get(&self, id: &str) -> Option<AchievementDocument> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id_hex() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), DocumentStoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::Backend(format!("simulated {} failure", what)));
        }
        Ok(())
    }

    fn live(&self) -> Vec<AchievementDocument> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.is_live())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AchievementDocuments for InMemoryDocuments {
    async fn insert(&self, document: &AchievementDocument) -> Result<String, DocumentStoreError> {
        Self::check(&self.fail_writes, "write")?;
        self.documents.lock().unwrap().push(document.clone());
        Ok(document.id_hex())
    }

    async fn find_live_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<AchievementDocument>, DocumentStoreError> {
        Self::check(&self.fail_reads, "read")?;
        Ok(self
            .live()
            .into_iter()
            .filter(|d| ids.contains(&d.id_hex()))
            .collect())
    }

    async fn soft_delete(&self, id: &str) -> Result<(), DocumentStoreError> {
        Self::check(&self.fail_writes, "write")?;
        let mut documents = self.documents.lock().unwrap();
        if let Some(doc) = documents.iter_mut().find(|d| d.id_hex() == id && d.is_live()) {
            let now = DateTime::now();
            doc.deleted_at = Some(now);
            doc.updated_at = now;
        }
        Ok(())
    }

    async fn push_attachment(
        &self,
        id: &str,
        attachment: &Attachment,
    ) -> Result<(), DocumentStoreError> {
        Self::check(&self.fail_writes, "write")?;
        let mut documents = self.documents.lock().unwrap();
        let doc = documents
            .iter_mut()
            .find(|d| d.id_hex() == id)
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))?;
        doc.attachments.push(attachment.clone());
        doc.updated_at = DateTime::now();
        Ok(())
    }

    async fn count_by_type(&self) -> Result<Vec<TypeCount>, DocumentStoreError> {
        Self::check(&self.fail_aggregations, "aggregation")?;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for doc in self.live() {
            *counts.entry(doc.achievement_type).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(achievement_type, count)| TypeCount {
                achievement_type,
                count,
            })
            .collect())
    }

    async fn top_students(&self, limit: i64) -> Result<Vec<StudentPoints>, DocumentStoreError> {
        Self::check(&self.fail_aggregations, "aggregation")?;
        let mut totals: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for doc in self.live() {
            let entry = totals.entry(doc.student_id).or_default();
            entry.0 += doc.points;
            entry.1 += 1;
        }

        let mut ranked: Vec<StudentPoints> = totals
            .into_iter()
            .map(|(student_id, (total_points, total_achievements))| StudentPoints {
                student_id,
                total_points,
                total_achievements,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then(b.total_achievements.cmp(&a.total_achievements))
                .then(a.student_id.cmp(&b.student_id))
        });
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }
}
