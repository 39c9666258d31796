// src/models/report.rs
use serde::Serialize;
use std::collections::BTreeMap;

pub const TOP_STUDENT_LIMIT: i64 = 5;
pub const UNKNOWN_LEADERBOARD_NAME: &str = "Unknown Student";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopStudent {
    pub rank: usize,
    pub name: String,
    pub nim: String,
    pub total_points: i64,
    pub total_achievements: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub top_students: Vec<TopStudent>,
    pub achievements_by_type: BTreeMap<String, i64>,
}
