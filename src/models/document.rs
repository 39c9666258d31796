// src/models/document.rs
use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Achievement content, stored in the `achievements` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AchievementDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Back-reference to `students.id`. Not a live foreign key.
    pub student_id: String,

    pub achievement_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,

    /// Type-specific fields (competition rank, publication venue, ...).
    #[serde(default)]
    pub details: Map<String, Value>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub points: i64,

    /// Set on soft delete. Live queries require the field to be absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl AchievementDocument {
    /// Hex form of the id, as kept in the relational reference.
    pub fn id_hex(&self) -> String {
        self.id.to_hex()
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime,
}

/// `{_id: <achievement_type>, count}` from the per-type grouping.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TypeCount {
    #[serde(rename = "_id")]
    pub achievement_type: String,
    pub count: i64,
}

/// `{_id: <student_id>, totalPoints, count}` from the ranking pipeline.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StudentPoints {
    #[serde(rename = "_id")]
    pub student_id: String,
    #[serde(rename = "totalPoints")]
    pub total_points: i64,
    #[serde(rename = "count")]
    pub total_achievements: i64,
}
