// src/services/test_support.rs
//! Direct-SQL fixtures for service tests (cheap password hashes, no bcrypt cost).

use crate::{models::user::Role, seed};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct StudentHandle {
    pub user_id: String,
    pub student_id: String,
}

pub struct LecturerHandle {
    pub user_id: String,
    pub lecturer_id: String,
}

pub struct Fixture<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Fixture<'a> {
    pub async fn new(pool: &'a SqlitePool) -> Fixture<'a> {
        seed::ensure_roles(pool).await.unwrap();
        Fixture { pool }
    }

    pub async fn user_with_hash(&self, username: &str, role: Role, hash: &str) -> String {
        self.insert_user(username, &format!("Full {}", username), role, hash)
            .await
    }

    async fn insert_user(&self, username: &str, full_name: &str, role: Role, hash: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, full_name, role_id, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, (SELECT id FROM roles WHERE name = ?), 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(username)
        .bind(format!("{}@test.local", username))
        .bind(hash)
        .bind(full_name)
        .bind(role.as_str())
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .unwrap();
        id
    }

    pub async fn admin(&self, username: &str) -> String {
        self.insert_user(username, "Admin", Role::Admin, "x").await
    }

    pub async fn lecturer(&self, full_name: &str, nip: &str) -> LecturerHandle {
        let user_id = self
            .insert_user(&nip.to_lowercase(), full_name, Role::Advisor, "x")
            .await;
        let lecturer_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO lecturers (id, user_id, lecturer_id, department, created_at, updated_at) VALUES (?, ?, ?, 'Teknik Informatika', ?, ?)",
        )
        .bind(&lecturer_id)
        .bind(&user_id)
        .bind(nip)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .unwrap();
        LecturerHandle { user_id, lecturer_id }
    }

    pub async fn student(&self, full_name: &str, nim: &str, advisor: Option<&str>) -> StudentHandle {
        let user_id = self
            .insert_user(&nim.to_lowercase(), full_name, Role::Student, "x")
            .await;
        let student_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO students (id, user_id, nim, program_study, academic_year, advisor_id, created_at, updated_at) VALUES (?, ?, ?, 'Sistem Informasi', '2024', ?, ?, ?)",
        )
        .bind(&student_id)
        .bind(&user_id)
        .bind(nim)
        .bind(advisor)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .unwrap();
        StudentHandle { user_id, student_id }
    }

    /// Bare reference row pointing at a made-up document id; rows inserted later sort first.
    pub async fn reference_row(&self, student_id: &str, status: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM achievement_references")
            .fetch_one(self.pool)
            .await
            .unwrap();
        let created = Utc::now() + Duration::seconds(count);
        sqlx::query(
            "INSERT INTO achievement_references (id, student_id, mongo_achievement_id, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(student_id)
        .bind(bson::oid::ObjectId::new().to_hex())
        .bind(status)
        .bind(created)
        .bind(created)
        .execute(self.pool)
        .await
        .unwrap();
        id
    }
}
