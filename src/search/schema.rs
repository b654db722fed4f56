//! Search data types / 搜索数据结构

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::Article;

/// Per-article indexing record / 每篇文章一条索引记录
///
/// Replaced wholesale on re-index; digest and token set always move together.
#[derive(Debug, Clone)]
pub struct KeywordIndexEntry {
    pub article_id: String,
    /// Digest of the body the tokens were extracted from / 建立索引时的正文摘要
    pub digest: String,
    pub tokens: BTreeSet<String>,
}

/// Index entry consistency relative to the current article body
/// / 索引记录相对当前正文的一致性状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// No entry exists yet / 尚未建立索引
    Unindexed,
    /// Entry digest no longer matches the article body / 索引已过期
    Stale,
    /// Entry digest matches the article body / 索引与正文一致
    Fresh,
}

/// A Fresh entry joined with the ranking metadata the scorer needs
/// / 参与打分的新鲜索引记录
#[derive(Debug, Clone)]
pub struct FreshEntry {
    pub article_id: String,
    pub created_at: String,
    pub tokens: BTreeSet<String>,
}

/// Requested result window / 请求的分页窗口
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

/// One page of relevance-ordered results / 一页按相关度排序的结果
#[derive(Debug, Clone, Serialize)]
pub struct RankedPage {
    /// Matching articles across the whole corpus / 全部命中数
    pub total: usize,
    /// Already sliced to the requested window / 已按请求窗口切片
    pub results: Vec<Article>,
    /// Sizes of the relevance tiers present in `results`, highest match
    /// count first / 返回页内各相关度层的条数
    pub tier_sizes: Vec<usize>,
}

impl RankedPage {
    pub fn empty() -> Self {
        Self {
            total: 0,
            results: Vec::new(),
            tier_sizes: Vec::new(),
        }
    }
}

/// Index statistics / 索引统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub article_count: u64,
    pub indexed_count: u64,
    pub fresh_count: u64,
    pub last_updated: Option<String>,
}
