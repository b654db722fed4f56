use std::sync::Arc;

use sqlx::SqlitePool;

use blog_admin_backend::search::{IndexingPipeline, SearchRanker, SweepState};
use blog_admin_backend::store::ArticleStore;

pub struct AppState {
    pub db: SqlitePool,
    pub store: ArticleStore,
    pub pipeline: Arc<IndexingPipeline>,
    pub ranker: SearchRanker,
    pub sweep_state: Arc<SweepState>,
    /// Concurrent article tasks during a sweep / 扫描并发度
    pub sweep_concurrency: usize,
}
