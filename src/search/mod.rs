//! Content indexing and ranked search / 内容索引与排序检索
//!
//! Architecture principles / 架构原则：
//! - This module only exposes primitive operations: index on save, remove on
//!   delete, ranked search, stale sweep
//! - The HTTP layer controls request flow; call direction is api → search
//!   (unidirectional)
//!
//! Index features / 索引特性：
//! - Per-article keyword entries in sqlite, replaced atomically
//! - Digest-gated re-indexing: unchanged bodies are never re-tokenized
//! - Searches only ever see entries consistent with the current body

pub mod error;
pub mod hasher;
pub mod index;
pub mod pipeline;
pub mod ranker;
pub mod schema;
pub mod tokenizer;

pub use error::{IndexError, SearchError};
pub use index::KeywordIndex;
pub use pipeline::{IndexingPipeline, SweepState, SweepSummary};
pub use ranker::SearchRanker;
pub use schema::{EntryState, IndexStats, KeywordIndexEntry, PageRequest, RankedPage};
