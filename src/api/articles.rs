//! Article CRUD handlers / 文章管理接口
//!
//! Every create/update hands the saved article to the indexing pipeline.
//! An index write failure is reported in the response but never rolls back
//! the article save; the stale entry is picked up by the next save or sweep.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use blog_admin_backend::models::{
    Article, ArticleQuery, ArticleSummary, SaveArticleRequest, UpdateArticleRequest,
};

use super::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub items: Vec<ArticleSummary>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct SaveArticleResponse {
    pub article: Article,
    /// Whether the keyword index is consistent after this save / 保存后索引是否一致
    pub indexed: bool,
    pub index_error: Option<String>,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticleQuery>,
) -> Json<ApiResponse<ArticleListResponse>> {
    match state.store.list(&query).await {
        Ok((items, total)) => Json(ApiResponse::success(ArticleListResponse { items, total })),
        Err(e) => {
            tracing::error!("Failed to list articles: {}", e);
            Json(ApiResponse::error("查询文章列表失败"))
        }
    }
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ApiResponse<Article>> {
    match state.store.get(&id).await {
        Ok(Some(article)) => Json(ApiResponse::success(article)),
        Ok(None) => Json(ApiResponse::error("文章不存在")),
        Err(e) => {
            tracing::error!("Failed to load article {}: {}", id, e);
            Json(ApiResponse::error("查询文章失败"))
        }
    }
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveArticleRequest>,
) -> Json<ApiResponse<SaveArticleResponse>> {
    let article = match state.store.create(req).await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Failed to create article: {}", e);
            return Json(ApiResponse::error("保存文章失败"));
        }
    };

    Json(ApiResponse::success(index_after_save(&state, article).await))
}

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateArticleRequest>,
) -> Json<ApiResponse<SaveArticleResponse>> {
    let article = match state.store.update(&id, req).await {
        Ok(Some(a)) => a,
        Ok(None) => return Json(ApiResponse::error("文章不存在")),
        Err(e) => {
            tracing::error!("Failed to update article {}: {}", id, e);
            return Json(ApiResponse::error("更新文章失败"));
        }
    };

    Json(ApiResponse::success(index_after_save(&state, article).await))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ApiResponse<()>> {
    match state.store.delete(&id).await {
        Ok(true) => {}
        Ok(false) => return Json(ApiResponse::error("文章不存在")),
        Err(e) => {
            tracing::error!("Failed to delete article {}: {}", id, e);
            return Json(ApiResponse::error("删除文章失败"));
        }
    }

    // Entry removal is unconditional; the article never outlives its entry
    if let Err(e) = state.pipeline.on_article_deleted(&id).await {
        tracing::error!("Failed to remove index entry for {}: {}", id, e);
        return Json(ApiResponse::error("文章已删除，但索引记录清理失败"));
    }

    Json(ApiResponse::success(()))
}

async fn index_after_save(state: &AppState, article: Article) -> SaveArticleResponse {
    match state.pipeline.on_article_saved(&article).await {
        Ok(_) => SaveArticleResponse {
            article,
            indexed: true,
            index_error: None,
        },
        Err(e) => {
            // Surfaced but not fatal; the digest mismatch self-heals later
            tracing::warn!("Indexing failed for article {}: {}", article.id, e);
            SaveArticleResponse {
                article,
                indexed: false,
                index_error: Some(e.to_string()),
            }
        }
    }
}
