// src/web/report_handlers.rs
use crate::{
    error::AppResult, models::report::DashboardStats, services::report_service, state::AppState,
    web::response::ApiResponse,
};
use axum::extract::State;

// GET /api/v1/reports/statistics
pub async fn handle_statistics(State(state): State<AppState>) -> AppResult<ApiResponse<DashboardStats>> {
    let stats = report_service::get_dashboard_stats(&state.db_pool, state.documents.as_ref()).await?;
    Ok(ApiResponse::ok("Statistics retrieved", stats))
}
