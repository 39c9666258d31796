// src/models/user.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

/// The fixed set of roles. Every user has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Admin")]
    Admin,
    #[serde(rename = "Dosen Wali")]
    Advisor,
    #[serde(rename = "Mahasiswa")]
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Advisor, Role::Student];

    /// Name stored in the `roles` table and carried in the session.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Advisor => "Dosen Wali",
            Role::Student => "Mahasiswa",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Advisor => "Verifikator",
            Role::Student => "Pelapor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role name: {}", self.0)
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

// Row of `users` joined with its role name
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role_id: String,
    pub role_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role_name.parse().ok()
    }
}

/// What the API exposes about a user (no credential hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role_name,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RoleRecord {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(rename = "role")]
    pub role_name: String,

    // Student profile
    #[serde(default)]
    pub nim: Option<String>,
    #[serde(default)]
    pub program_study: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,

    // Lecturer profile
    #[serde(default)]
    pub lecturer_id: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Body of `PUT /users/{id}/advisor`: lecturer profile id, or null to clear.
#[derive(Debug, Deserialize)]
pub struct AssignAdvisorRequest {
    pub lecturer_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!("Dosen Wali".parse::<Role>(), Ok(Role::Advisor));
    }

    #[test]
    fn role_names_are_case_sensitive() {
        assert!("mahasiswa".parse::<Role>().is_err());
        assert!("Dosen".parse::<Role>().is_err());
    }
}
