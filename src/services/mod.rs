// src/services/mod.rs
pub mod academic_service;
pub mod achievement_reference;
pub mod achievement_service;
pub mod auth_service;
pub mod paired_record;
pub mod report_service;
pub mod upload_service;
pub mod user_service;

#[cfg(test)]
pub mod test_support;
