//! Search subsystem errors / 搜索子系统错误

use thiserror::Error;

/// Indexing failures / 索引写入失败
///
/// A failed entry write leaves the previous entry intact; the digest
/// mismatch keeps the article Stale until the next save or sweep succeeds.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("keyword index write failed: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// Search failures / 搜索失败
///
/// Always surfaced to the caller; a storage failure never degrades into an
/// empty-but-successful page.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid page request: offset={offset}, limit={limit}")]
    InvalidPage { offset: i64, limit: i64 },
    #[error("article store unavailable: {0}")]
    Storage(#[from] sqlx::Error),
}
