use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::sqlite::SqlitePool;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use blog_admin_backend::search::{IndexingPipeline, KeywordIndex, SearchRanker, SweepState};
use blog_admin_backend::store::ArticleStore;
use blog_admin_backend::{config, db};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_admin_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().expect("Failed to load configuration");
    tracing::info!(
        "Server will listen on {}:{}",
        app_config.server.host,
        app_config.server.port
    );

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| app_config.get_database_url());

    let pool = SqlitePool::connect(&database_url).await?;
    db::apply_pragmas(&pool).await?;
    db::run_migrations(&pool).await?;

    let index = KeywordIndex::new(pool.clone());
    index.init().await?;

    let store = ArticleStore::new(pool.clone());
    let pipeline = Arc::new(IndexingPipeline::new(index.clone()));
    let ranker = SearchRanker::new(index, store.clone(), app_config.search.max_page_limit);
    let sweep_state = Arc::new(SweepState::new());

    let state = Arc::new(AppState {
        db: pool,
        store,
        pipeline,
        ranker,
        sweep_state,
        sweep_concurrency: app_config.search.sweep_concurrency,
    });

    // Startup catch-up: index anything left Stale by a crash or failed
    // write / 启动时补一次索引
    {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = state
                .pipeline
                .sweep(&state.store, &state.sweep_state, state.sweep_concurrency)
                .await
            {
                tracing::warn!("Startup index sweep failed: {}", e);
            }
        });
    }

    let app = Router::new()
        .route("/api/health", get(api::server::health_check))
        .route("/api/articles", get(api::articles::list_articles))
        .route("/api/articles", post(api::articles::create_article))
        .route("/api/articles/:id", get(api::articles::get_article))
        .route("/api/articles/:id", post(api::articles::update_article))
        .route("/api/articles/:id/delete", post(api::articles::delete_article))
        .route("/api/search", post(api::search::search))
        // 搜索管理API
        .route("/api/admin/search/status", get(api::search::get_index_status))
        .route("/api/admin/search/sweep", post(api::search::trigger_sweep))
        .route("/api/admin/search/sweep/stop", post(api::search::stop_sweep))
        .route("/api/admin/search/rebuild", post(api::search::rebuild_index))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
