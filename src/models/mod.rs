// src/models/mod.rs
pub mod academic;
pub mod achievement;
pub mod document;
pub mod report;
pub mod user;
