// src/models/achievement.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

use super::document::Attachment;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Title shown when a reference has no live document behind it.
pub const MISSING_DOCUMENT_TITLE: &str = "[Data Missing in Document Store]";
pub const UNKNOWN_STUDENT_NAME: &str = "Unknown";
pub const UNKNOWN_STUDENT_NIM: &str = "-";

/// Workflow state of an achievement. The relational reference is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AchievementStatus {
    Draft,
    Submitted,
    Verified,
    Rejected,
    Deleted,
}

impl AchievementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementStatus::Draft => "draft",
            AchievementStatus::Submitted => "submitted",
            AchievementStatus::Verified => "verified",
            AchievementStatus::Rejected => "rejected",
            AchievementStatus::Deleted => "deleted",
        }
    }

    /// Evidence may be attached while drafting, and again after a rejection.
    pub fn accepts_evidence(&self) -> bool {
        matches!(self, AchievementStatus::Draft | AchievementStatus::Rejected)
    }
}

impl fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AchievementStatus::Draft),
            "submitted" => Ok(AchievementStatus::Submitted),
            "verified" => Ok(AchievementStatus::Verified),
            "rejected" => Ok(AchievementStatus::Rejected),
            "deleted" => Ok(AchievementStatus::Deleted),
            other => Err(format!("unknown achievement status: {}", other)),
        }
    }
}

/// Row of `achievement_references`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AchievementReference {
    pub id: String,
    pub student_id: String,
    pub mongo_achievement_id: String, // opaque document-store id, never reassigned
    pub status: AchievementStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reference with the owning student's display data joined in.
#[derive(Debug, Clone, FromRow)]
pub struct ReferenceListRow {
    #[sqlx(flatten)]
    pub reference: AchievementReference,
    pub student_nim: Option<String>,
    pub student_name: Option<String>,
}

// --- Per-transition update payloads ---

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub verifier_id: String,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RejectRequest {
    pub verifier_id: String,
    pub note: String,
    pub rejected_at: DateTime<Utc>,
}

/// An evidence file already persisted by the upload layer.
#[derive(Debug, Clone)]
pub struct EvidenceFile {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
}

// --- Listing ---

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementFilter {
    pub status: Option<AchievementStatus>,
    pub page: i64,
    pub limit: i64,
    pub student_ids: Option<Vec<String>>,
}

impl Default for AchievementFilter {
    fn default() -> Self {
        AchievementFilter {
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            student_ids: None,
        }
    }
}

impl AchievementFilter {
    pub fn new(status: Option<AchievementStatus>, page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = match limit {
            Some(l) if l >= 1 => l.min(MAX_PAGE_LIMIT),
            _ => DEFAULT_PAGE_LIMIT,
        };
        AchievementFilter {
            status,
            page,
            limit,
            student_ids: None,
        }
    }

    /// Rows to skip for a 1-indexed page. Saturates for absurd page numbers.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Body of `POST /achievements`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAchievementRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub achievement_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub points: i64,
}

/// One listing entry: reference + document merged.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementListItem {
    pub id: String,
    pub status: AchievementStatus,
    pub student_id: String,
    pub student_name: String,
    pub nim: String,
    pub title: String,
    #[serde(rename = "type")]
    pub achievement_type: String,
    pub description: String,
    pub points: i64,
    pub details: Map<String, Value>,
    pub attachments: Vec<AttachmentView>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentView {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Attachment> for AttachmentView {
    fn from(a: &Attachment) -> Self {
        AttachmentView {
            file_name: a.file_name.clone(),
            file_url: a.file_url.clone(),
            file_type: a.file_type.clone(),
            uploaded_at: a.uploaded_at.to_chrono(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementPage {
    pub items: Vec<AchievementListItem>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

impl AchievementPage {
    pub fn empty(filter: &AchievementFilter) -> Self {
        AchievementPage {
            items: Vec::new(),
            page: filter.page,
            limit: filter.limit,
            total: 0,
        }
    }
}
