//! Search endpoints / 搜索接口
//!
//! The public endpoint forwards a free-text query plus a page window to the
//! ranker. Admin endpoints expose index status and the stale sweep / full
//! rebuild, which run in the background and refuse to overlap themselves.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use blog_admin_backend::search::{IndexStats, PageRequest, RankedPage, SearchError};

use super::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// 搜索关键字 / free-text query
    pub words: String,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// 博客文章内容全文检索 / Full-text article search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ApiResponse<RankedPage>> {
    let page = PageRequest {
        offset: req.offset,
        limit: req.limit,
    };

    match state.ranker.search(&req.words, page).await {
        Ok(result) => Json(ApiResponse::success(result)),
        Err(e @ SearchError::InvalidPage { .. }) => Json(ApiResponse::error(&e.to_string())),
        Err(SearchError::Storage(e)) => {
            // Never degraded to an empty-but-successful page / 不吞掉存储错误
            tracing::error!("Search failed: {}", e);
            Json(ApiResponse::error("搜索失败"))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexStatusResponse {
    pub status: String,
    pub stats: IndexStats,
    pub sweep_processed: u64,
    pub sweep_error: Option<String>,
    pub last_sweep_time: Option<i64>,
}

pub async fn get_index_status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<IndexStatusResponse>> {
    let stats = match state.pipeline.index().stats().await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to read index stats: {}", e);
            return Json(ApiResponse::error("获取索引状态失败"));
        }
    };

    let progress = state.sweep_state.get_progress();
    let status = if progress.is_running {
        "sweeping"
    } else if progress.error.is_some() {
        "error"
    } else {
        "idle"
    };

    Json(ApiResponse::success(IndexStatusResponse {
        status: status.to_string(),
        stats,
        sweep_processed: progress.processed,
        sweep_error: progress.error,
        last_sweep_time: progress.last_done_time,
    }))
}

/// 补漏扫描：重建所有过期/缺失的索引记录 / Catch up any Stale entries
pub async fn trigger_sweep(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    if state.sweep_state.is_running() {
        return Json(ApiResponse::error("扫描正在进行中"));
    }

    let state_clone = state.clone();
    tokio::spawn(async move {
        // The run slot inside sweep() is the actual overlap guard
        if let Err(e) = state_clone
            .pipeline
            .sweep(
                &state_clone.store,
                &state_clone.sweep_state,
                state_clone.sweep_concurrency,
            )
            .await
        {
            tracing::error!("Sweep failed: {}", e);
        }
    });

    Json(ApiResponse::success(()))
}

/// 停止正在进行的扫描 / Stop a running sweep
pub async fn stop_sweep(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    if !state.sweep_state.is_running() {
        return Json(ApiResponse::error("没有正在运行的扫描任务"));
    }

    state.sweep_state.cancel();
    tracing::info!("Sweep cancellation requested");
    Json(ApiResponse::success(()))
}

/// 清空并全量重建索引 / Clear and rebuild the whole index
pub async fn rebuild_index(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    if state.sweep_state.is_running() {
        return Json(ApiResponse::error("扫描正在进行中"));
    }

    let state_clone = state.clone();
    tokio::spawn(async move {
        if let Err(e) = state_clone
            .pipeline
            .rebuild(
                &state_clone.store,
                &state_clone.sweep_state,
                state_clone.sweep_concurrency,
            )
            .await
        {
            tracing::error!("Index rebuild failed: {}", e);
        }
    });

    Json(ApiResponse::success(()))
}
