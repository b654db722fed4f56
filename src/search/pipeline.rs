//! Indexing pipeline / 索引流水线
//!
//! Keeps every article's keyword entry consistent with its current body,
//! re-tokenizing exactly once per content change. The digest comparison is
//! the gate: two fixed-size values are compared, never full bodies.
//!
//! State per article (stored digest vs freshly computed digest):
//! - Unindexed: no entry exists
//! - Stale: entry exists, digests differ
//! - Fresh: digests match, entry untouched on save
//!
//! 保存时触发，不依赖后台线程；可选的补漏扫描（sweep）不会与自身并发。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use parking_lot::RwLock;

use crate::models::Article;
use crate::store::ArticleStore;

use super::error::IndexError;
use super::hasher;
use super::index::KeywordIndex;
use super::schema::{EntryState, KeywordIndexEntry};
use super::tokenizer;

pub struct IndexingPipeline {
    index: KeywordIndex,
    /// Tokenization passes actually performed; unchanged content performs
    /// none / 实际执行的分词次数
    tokenize_passes: AtomicU64,
}

impl IndexingPipeline {
    pub fn new(index: KeywordIndex) -> Self {
        Self {
            index,
            tokenize_passes: AtomicU64::new(0),
        }
    }

    pub fn index(&self) -> &KeywordIndex {
        &self.index
    }

    /// Number of tokenization passes performed so far / 已执行的分词次数
    pub fn tokenize_passes(&self) -> u64 {
        self.tokenize_passes.load(Ordering::SeqCst)
    }

    /// Invoked after every article create/update / 文章保存后调用
    ///
    /// Returns the entry state found before the call: `Fresh` means the save
    /// did not change the body and no work was done.
    pub async fn on_article_saved(&self, article: &Article) -> Result<EntryState, IndexError> {
        self.index_body(&article.id, &article.content).await
    }

    /// Invoked after article deletion; removes the entry unconditionally
    /// / 文章删除后调用，无条件移除索引记录
    pub async fn on_article_deleted(&self, article_id: &str) -> Result<(), IndexError> {
        self.index.remove(article_id).await?;
        tracing::debug!("Index entry removed for article {}", article_id);
        Ok(())
    }

    async fn index_body(&self, article_id: &str, content: &str) -> Result<EntryState, IndexError> {
        let digest = hasher::digest(content);

        let prior = match self.index.get_digest(article_id).await? {
            None => EntryState::Unindexed,
            Some(d) if d == digest => EntryState::Fresh,
            Some(_) => EntryState::Stale,
        };

        if prior == EntryState::Fresh {
            tracing::debug!("Article {} unchanged, index untouched", article_id);
            return Ok(prior);
        }

        let tokens = tokenizer::tokenize(content);
        self.tokenize_passes.fetch_add(1, Ordering::SeqCst);

        self.index
            .put_entry(&KeywordIndexEntry {
                article_id: article_id.to_string(),
                digest,
                tokens,
            })
            .await?;

        tracing::info!("Article {} re-indexed (was {:?})", article_id, prior);
        Ok(prior)
    }

    /// Re-index every Unindexed/Stale article / 补漏扫描
    ///
    /// Fan-out across articles with bounded concurrency; article-level tasks
    /// share no mutable state. Returns `Ok(None)` when a sweep is already in
    /// flight (a sweep never runs concurrently with itself).
    pub async fn sweep(
        &self,
        store: &ArticleStore,
        state: &SweepState,
        concurrency: usize,
    ) -> Result<Option<SweepSummary>, IndexError> {
        self.run_sweep(store, state, concurrency, false).await
    }

    /// Drop the whole index and re-index everything / 清空并全量重建
    pub async fn rebuild(
        &self,
        store: &ArticleStore,
        state: &SweepState,
        concurrency: usize,
    ) -> Result<Option<SweepSummary>, IndexError> {
        self.run_sweep(store, state, concurrency, true).await
    }

    async fn run_sweep(
        &self,
        store: &ArticleStore,
        state: &SweepState,
        concurrency: usize,
        clear_first: bool,
    ) -> Result<Option<SweepSummary>, IndexError> {
        if !state.try_start() {
            tracing::debug!("Sweep already running, skipping");
            return Ok(None);
        }

        if clear_first {
            if let Err(e) = self.index.clear().await {
                state.finish(Some(e.to_string()));
                return Err(e);
            }
        }

        // Entries whose article is gone never show up in the sources below,
        // so they are dropped here / 顺带清理无主索引记录
        match self.index.prune_orphans().await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Pruned {} orphaned index entries", n),
            Err(e) => {
                state.finish(Some(e.to_string()));
                return Err(e);
            }
        }

        let sources = match store.load_index_sources().await {
            Ok(s) => s,
            Err(e) => {
                state.finish(Some(e.to_string()));
                return Err(IndexError::Persistence(e));
            }
        };

        let visited = Arc::new(AtomicU64::new(0));
        let reindexed = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));
        let concurrency = concurrency.max(1);

        stream::iter(sources)
            .for_each_concurrent(concurrency, |(article_id, content)| {
                let visited = visited.clone();
                let reindexed = reindexed.clone();
                let failed = failed.clone();
                async move {
                    if state.is_cancelled() {
                        return;
                    }
                    visited.fetch_add(1, Ordering::SeqCst);
                    match self.index_body(&article_id, &content).await {
                        Ok(EntryState::Fresh) => {}
                        Ok(_) => {
                            reindexed.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => {
                            // Stale detection self-heals on the next attempt
                            tracing::warn!("Sweep failed to index article {}: {}", article_id, e);
                            failed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    state.increment();
                }
            })
            .await;

        let summary = SweepSummary {
            scanned: visited.load(Ordering::SeqCst),
            reindexed: reindexed.load(Ordering::SeqCst),
            failed: failed.load(Ordering::SeqCst),
        };

        let error = if summary.failed > 0 {
            Some(format!("{} article(s) failed to index", summary.failed))
        } else {
            None
        };
        state.finish(error);

        tracing::info!(
            "Sweep done: {} scanned, {} re-indexed, {} failed",
            summary.scanned,
            summary.reindexed,
            summary.failed
        );
        Ok(Some(summary))
    }
}

/// Outcome of one sweep pass / 一次扫描的结果
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SweepSummary {
    /// Articles actually visited; a cancelled sweep stops short
    /// / 实际访问的文章数，取消后不再累计
    pub scanned: u64,
    pub reindexed: u64,
    pub failed: u64,
}

/// Sweep progress snapshot / 扫描进度快照
#[derive(Debug, Clone, serde::Serialize)]
pub struct SweepProgress {
    pub is_running: bool,
    pub processed: u64,
    pub error: Option<String>,
    pub last_done_time: Option<i64>,
}

impl Default for SweepProgress {
    fn default() -> Self {
        Self {
            is_running: false,
            processed: 0,
            error: None,
            last_done_time: None,
        }
    }
}

/// Sweep run-state / 扫描运行状态
///
/// The running flag is acquired with a compare-exchange, so two callers can
/// never drive a sweep at the same time.
pub struct SweepState {
    running: AtomicBool,
    processed: AtomicU64,
    cancel_flag: AtomicBool,
    progress: RwLock<SweepProgress>,
}

impl SweepState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            processed: AtomicU64::new(0),
            cancel_flag: AtomicBool::new(false),
            progress: RwLock::new(SweepProgress::default()),
        }
    }

    /// Try to acquire the run slot / 尝试占用运行槽位
    pub fn try_start(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.cancel_flag.store(false, Ordering::SeqCst);
        self.processed.store(0, Ordering::SeqCst);
        let mut progress = self.progress.write();
        progress.is_running = true;
        progress.processed = 0;
        progress.error = None;
        true
    }

    pub fn increment(&self) {
        let count = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        self.progress.write().processed = count;
    }

    pub fn finish(&self, error: Option<String>) {
        self.running.store(false, Ordering::SeqCst);
        let mut progress = self.progress.write();
        progress.is_running = false;
        progress.error = error;
        progress.last_done_time = Some(chrono::Utc::now().timestamp());
    }

    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn get_progress(&self) -> SweepProgress {
        self.progress.read().clone()
    }
}

impl Default for SweepState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::SaveArticleRequest;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn setup() -> (SqlitePool, ArticleStore, IndexingPipeline) {
        // 单连接，保证内存库在各查询间共享 / single connection shares the :memory: db
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        let index = KeywordIndex::new(pool.clone());
        index.init().await.unwrap();
        let store = ArticleStore::new(pool.clone());
        (pool, store, IndexingPipeline::new(index))
    }

    fn req(title: &str, path: &str, content: &str) -> SaveArticleRequest {
        SaveArticleRequest {
            title: title.to_string(),
            path: path.to_string(),
            categories: vec![],
            tags: vec![],
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_save_indexes() {
        let (_pool, store, pipeline) = setup().await;
        let article = store.create(req("t", "/t", "Rust 异步编程")).await.unwrap();

        let prior = pipeline.on_article_saved(&article).await.unwrap();
        assert_eq!(prior, EntryState::Unindexed);
        assert_eq!(pipeline.tokenize_passes(), 1);

        let stored = pipeline.index().get_digest(&article.id).await.unwrap();
        assert_eq!(stored.as_deref(), Some(article.content_hash.as_str()));
    }

    #[tokio::test]
    async fn test_idempotent_resave_skips_tokenization() {
        let (_pool, store, pipeline) = setup().await;
        let article = store.create(req("t", "/t", "同样的内容 same content")).await.unwrap();

        pipeline.on_article_saved(&article).await.unwrap();
        let digest_before = pipeline.index().get_digest(&article.id).await.unwrap();

        // Re-save with identical content / 内容不变再次保存
        let prior = pipeline.on_article_saved(&article).await.unwrap();
        assert_eq!(prior, EntryState::Fresh);
        assert_eq!(pipeline.tokenize_passes(), 1);

        let digest_after = pipeline.index().get_digest(&article.id).await.unwrap();
        assert_eq!(digest_before, digest_after);
    }

    #[tokio::test]
    async fn test_edit_invalidates_and_replaces_tokens() {
        let (_pool, store, pipeline) = setup().await;
        let article = store.create(req("t", "/t", "cooking recipes")).await.unwrap();
        pipeline.on_article_saved(&article).await.unwrap();

        let updated = store
            .update_content(&article.id, "rust systems design")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(updated.content_hash, article.content_hash);

        let prior = pipeline.on_article_saved(&updated).await.unwrap();
        assert_eq!(prior, EntryState::Stale);
        assert_eq!(pipeline.tokenize_passes(), 2);

        // Old token set fully discarded, not merged / 旧词集整体丢弃
        let fresh = pipeline.index().load_fresh().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].tokens.contains("rust"));
        assert!(!fresh[0].tokens.contains("cooking"));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (_pool, store, pipeline) = setup().await;
        let article = store.create(req("t", "/t", "rust design")).await.unwrap();
        pipeline.on_article_saved(&article).await.unwrap();

        store.delete(&article.id).await.unwrap();
        pipeline.on_article_deleted(&article.id).await.unwrap();

        assert!(pipeline.index().get_digest(&article.id).await.unwrap().is_none());
        assert!(pipeline.index().load_fresh().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_catches_up_stale_entries() {
        let (_pool, store, pipeline) = setup().await;
        let a = store.create(req("a", "/a", "第一篇 文章")).await.unwrap();
        let b = store.create(req("b", "/b", "第二篇 文章")).await.unwrap();
        pipeline.on_article_saved(&a).await.unwrap();

        // b never indexed, a made stale behind the pipeline's back
        store.update_content(&a.id, "改过的内容").await.unwrap();
        assert_eq!(pipeline.index().load_fresh().await.unwrap().len(), 0);
        let _ = b;

        let state = SweepState::new();
        let summary = pipeline.sweep(&store, &state, 4).await.unwrap().unwrap();
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.reindexed, 2);
        assert_eq!(summary.failed, 0);
        assert!(!state.is_running());

        assert_eq!(pipeline.index().load_fresh().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sweep_does_not_run_concurrently_with_itself() {
        let (_pool, store, pipeline) = setup().await;
        let state = SweepState::new();

        assert!(state.try_start());
        // Slot held: a second sweep must refuse to run
        let result = pipeline.sweep(&store, &state, 4).await.unwrap();
        assert!(result.is_none());
        state.finish(None);

        // Slot released: runs again
        let result = pipeline.sweep(&store, &state, 4).await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_cancel_stops_sweep_before_remaining_articles() {
        let (_pool, store, pipeline) = setup().await;
        for i in 0..5 {
            store
                .create(req(&format!("t{}", i), &format!("/t{}", i), "rust design"))
                .await
                .unwrap();
        }

        let store = Arc::new(store);
        let pipeline = Arc::new(pipeline);
        let state = Arc::new(SweepState::new());

        // Single-threaded runtime: the sweep task only progresses while this
        // test awaits, so the cancel lands before any article is visited
        let handle = tokio::spawn({
            let (pipeline, store, state) = (pipeline.clone(), store.clone(), state.clone());
            async move { pipeline.sweep(&store, &state, 1).await }
        });
        while !state.is_running() && !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        state.cancel();

        let summary = handle.await.unwrap().unwrap().unwrap();
        assert_eq!(summary.scanned, 0);
        assert_eq!(summary.reindexed, 0);
        assert!(!state.is_running());
        assert!(pipeline.index().load_fresh().await.unwrap().is_empty());

        // The next sweep starts with a clean cancel flag and catches up
        let summary = pipeline.sweep(&store, &state, 1).await.unwrap().unwrap();
        assert_eq!(summary.scanned, 5);
        assert_eq!(summary.reindexed, 5);
    }

    #[tokio::test]
    async fn test_sweep_prunes_orphaned_entries() {
        let (_pool, store, pipeline) = setup().await;
        let a = store.create(req("a", "/a", "rust design")).await.unwrap();
        let b = store.create(req("b", "/b", "cooking")).await.unwrap();
        pipeline.on_article_saved(&a).await.unwrap();
        pipeline.on_article_saved(&b).await.unwrap();

        // Article gone but entry removal never ran (e.g. it failed)
        store.delete(&a.id).await.unwrap();
        let stats = pipeline.index().stats().await.unwrap();
        assert_eq!(stats.indexed_count, 2);

        let state = SweepState::new();
        pipeline.sweep(&store, &state, 4).await.unwrap().unwrap();

        let stats = pipeline.index().stats().await.unwrap();
        assert_eq!(stats.article_count, 1);
        assert_eq!(stats.indexed_count, 1);
        assert_eq!(stats.fresh_count, 1);
        assert!(pipeline.index().get_digest(&a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rebuild_clears_then_reindexes() {
        let (_pool, store, pipeline) = setup().await;
        let a = store.create(req("a", "/a", "rust design")).await.unwrap();
        pipeline.on_article_saved(&a).await.unwrap();

        let state = SweepState::new();
        let summary = pipeline.rebuild(&store, &state, 4).await.unwrap().unwrap();
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.reindexed, 1);

        let stats = pipeline.index().stats().await.unwrap();
        assert_eq!(stats.fresh_count, 1);
    }
}
