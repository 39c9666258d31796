// src/seed.rs
use crate::{
    error::AppResult,
    models::user::{CreateUserRequest, Role},
    services::{academic_service, user_service},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const DEMO_PASSWORD: &str = "123456";
const DEMO_LECTURERS: usize = 5;
const DEMO_STUDENTS: usize = 10;

/// Inserts the fixed roles if they are missing. Safe to run on every start.
pub async fn ensure_roles(db_pool: &SqlitePool) -> AppResult<()> {
    let now = Utc::now();
    for role in Role::ALL {
        sqlx::query(
            "INSERT OR IGNORE INTO roles (id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(role.as_str())
        .bind(role.description())
        .bind(now)
        .bind(now)
        .execute(db_pool)
        .await?;
    }
    tracing::debug!("Roles ensured: {:?}", Role::ALL);
    Ok(())
}

/// Demo accounts for an empty database: one admin, five lecturers, ten students
/// (two advisees per lecturer).
pub async fn seed_demo_data(db_pool: &SqlitePool) -> AppResult<()> {
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db_pool)
        .await?;
    if users > 0 {
        tracing::info!("⚠️  Database already has users. Demo seeding skipped.");
        return Ok(());
    }

    tracing::info!("🌱 Seeding demo data...");

    user_service::create_user(
        db_pool,
        &demo_request("superadmin", "admin@unair.ac.id", "Super Administrator", Role::Admin),
    )
    .await?;

    let mut lecturer_profile_ids = Vec::with_capacity(DEMO_LECTURERS);
    for i in 1..=DEMO_LECTURERS {
        let mut req = demo_request(
            &format!("dosen{}", i),
            &format!("dosen{}@unair.ac.id", i),
            &format!("Dr. Dosen {}", i),
            Role::Advisor,
        );
        req.lecturer_id = Some(format!("NIP{:03}", i));
        req.department = Some("Teknik Informatika".to_string());
        let user = user_service::create_user(db_pool, &req).await?;

        if let Some(lecturer) = academic_service::find_lecturer_by_user_id(db_pool, &user.id).await? {
            lecturer_profile_ids.push(lecturer.id);
        }
        tracing::info!("✅ Lecturer {} created (user: dosen{})", i, i);
    }

    for i in 1..=DEMO_STUDENTS {
        let mut req = demo_request(
            &format!("mhs{}", i),
            &format!("mhs{}@unair.ac.id", i),
            &format!("Mahasiswa {}", i),
            Role::Student,
        );
        req.nim = Some(format!("NIM{:03}", i));
        req.program_study = Some("Sistem Informasi".to_string());
        req.academic_year = Some("2024".to_string());
        let user = user_service::create_user(db_pool, &req).await?;

        let advisor = lecturer_profile_ids.get((i - 1) / 2);
        academic_service::set_student_advisor(db_pool, &user.id, advisor.map(String::as_str)).await?;
        tracing::info!("✅ Student {} created -> advisor: lecturer {}", i, (i - 1) / 2 + 1);
    }

    tracing::info!("🎉 Demo seeding finished. Password for every demo account: '{}'", DEMO_PASSWORD);
    Ok(())
}

fn demo_request(username: &str, email: &str, full_name: &str, role: Role) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
        full_name: full_name.to_string(),
        role_name: role.as_str().to_string(),
        nim: None,
        program_study: None,
        academic_year: None,
        lecturer_id: None,
        department: None,
    }
}
