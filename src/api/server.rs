use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub status: String,
    pub version: String,
    pub build_time: String,
    pub database: bool,
}

/// Liveness + version info / 健康检查
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthInfo>> {
    let database = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    Json(ApiResponse::success(HealthInfo {
        status: if database { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_time: env!("BUILD_TIME").to_string(),
        database,
    }))
}
