//! Ranked full-text search / 排序全文检索
//!
//! Scoring is keyword overlap between the query token set and each Fresh
//! index entry. Conceptually results form relevance tiers (same match count
//! = one tier, recent first inside a tier); at runtime that is one stable
//! sort by `(-match_count, -created_at, id)` followed by a slice, so
//! tie-breaking and pagination stay orthogonal and repeated identical
//! queries paginate identically.
//!
//! Article bodies are fetched only for the returned page, never for the
//! whole candidate set.

use crate::store::ArticleStore;

use super::error::SearchError;
use super::index::KeywordIndex;
use super::schema::{PageRequest, RankedPage};
use super::tokenizer;

pub struct SearchRanker {
    index: KeywordIndex,
    store: ArticleStore,
    max_page_limit: i64,
}

struct ScoredEntry {
    article_id: String,
    created_at: String,
    match_count: usize,
}

impl SearchRanker {
    pub fn new(index: KeywordIndex, store: ArticleStore, max_page_limit: i64) -> Self {
        Self {
            index,
            store,
            max_page_limit,
        }
    }

    /// Free-text search over indexed articles / 对已索引文章做自由文本检索
    pub async fn search(&self, query: &str, page: PageRequest) -> Result<RankedPage, SearchError> {
        if page.offset < 0 || page.limit < 1 || page.limit > self.max_page_limit {
            return Err(SearchError::InvalidPage {
                offset: page.offset,
                limit: page.limit,
            });
        }

        // Shared normalization with the indexing path / 与索引端共用同一分词
        let query_tokens = tokenizer::tokenize_query(query);
        if query_tokens.is_empty() {
            // An empty query matches nothing, not everything / 空查询不命中任何文章
            return Ok(RankedPage::empty());
        }

        // Only Fresh entries participate; Stale/Unindexed articles are
        // invisible to search, never lazily re-indexed here
        let entries = self.index.load_fresh().await?;

        let mut scored: Vec<ScoredEntry> = entries
            .into_iter()
            .filter_map(|entry| {
                let match_count = query_tokens
                    .iter()
                    .filter(|t| entry.tokens.contains(*t))
                    .count();
                if match_count == 0 {
                    return None;
                }
                Some(ScoredEntry {
                    article_id: entry.article_id,
                    created_at: entry.created_at,
                    match_count,
                })
            })
            .collect();

        // RFC3339 timestamps compare lexicographically; final id tie-break
        // keeps the order fully reproducible
        scored.sort_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.article_id.cmp(&b.article_id))
        });

        let total = scored.len();
        let offset = page.offset as usize;
        let limit = page.limit as usize;

        let page_slice: Vec<ScoredEntry> =
            scored.into_iter().skip(offset).take(limit).collect();

        // Per-tier counts actually present in the returned page / 返回页内各层条数
        let mut tier_sizes: Vec<usize> = Vec::new();
        let mut last_count: Option<usize> = None;
        for entry in &page_slice {
            match last_count {
                Some(c) if c == entry.match_count => {
                    if let Some(size) = tier_sizes.last_mut() {
                        *size += 1;
                    }
                }
                _ => {
                    tier_sizes.push(1);
                    last_count = Some(entry.match_count);
                }
            }
        }

        let ids: Vec<String> = page_slice.iter().map(|e| e.article_id.clone()).collect();
        let results = self.store.get_many(&ids).await?;

        tracing::debug!(
            "Search matched {} article(s), returning {} (offset={})",
            total,
            results.len(),
            page.offset
        );

        Ok(RankedPage {
            total,
            results,
            tier_sizes,
        })
    }
}
