// src/web/mod.rs
pub mod achievement_handlers;
pub mod auth_handlers;
pub mod mw_admin;
pub mod mw_auth;
pub mod report_handlers;
pub mod response;
pub mod routes;
pub mod user_handlers;
