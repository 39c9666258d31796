// src/models/academic.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Student profile, one-to-one with a user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub id: String,
    pub user_id: String,
    pub nim: String,
    pub program_study: String,
    pub academic_year: String,
    pub advisor_id: Option<String>, // lecturers.id, null until an advisor is assigned
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lecturer profile, one-to-one with a user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lecturer {
    pub id: String,
    pub user_id: String,
    pub lecturer_id: String, // NIP / NIDN
    pub department: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Student id with the display data used by listings and the leaderboard.
#[derive(Debug, Clone, FromRow)]
pub struct StudentIdentity {
    pub id: String,
    pub nim: String,
    pub full_name: Option<String>,
}
