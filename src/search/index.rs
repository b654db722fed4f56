//! Keyword index storage / 关键词索引存储
//!
//! One row per article: `{digest, tokens}`. The token set is stored as a
//! JSON array and only ever replaced as a whole together with its digest
//! (single `INSERT OR REPLACE` statement), so concurrent readers observe
//! either the old entry or the new one, never a half-written mix.
//!
//! Freshness is not stored; it is derived at read time by joining on
//! `article_keys.digest = articles.content_hash`, so search only ever sees
//! entries consistent with the current article body.

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::error::IndexError;
use super::schema::{FreshEntry, IndexStats, KeywordIndexEntry};

#[derive(Clone)]
pub struct KeywordIndex {
    db: SqlitePool,
}

impl KeywordIndex {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 初始化表结构，只在表不存在时创建 / Create the entry table if missing
    pub async fn init(&self) -> Result<(), IndexError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS article_keys (
                article_id TEXT PRIMARY KEY,
                digest TEXT NOT NULL,
                tokens TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Digest the stored entry was built from, if any entry exists
    /// / 已存索引记录的摘要
    pub async fn get_digest(&self, article_id: &str) -> Result<Option<String>, IndexError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT digest FROM article_keys WHERE article_id = ?")
                .bind(article_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(row.map(|(d,)| d))
    }

    /// Replace an article's entry wholesale / 整体替换索引记录
    ///
    /// Digest and token set land in one statement; there is no intermediate
    /// state a concurrent search could observe.
    pub async fn put_entry(&self, entry: &KeywordIndexEntry) -> Result<(), IndexError> {
        let tokens_json =
            serde_json::to_string(&entry.tokens).unwrap_or_else(|_| "[]".to_string());
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT OR REPLACE INTO article_keys (article_id, digest, tokens, updated_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.article_id)
        .bind(&entry.digest)
        .bind(&tokens_json)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Remove an article's entry unconditionally / 无条件删除索引记录
    pub async fn remove(&self, article_id: &str) -> Result<(), IndexError> {
        sqlx::query("DELETE FROM article_keys WHERE article_id = ?")
            .bind(article_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Load every Fresh entry with its ranking metadata / 加载所有新鲜索引记录
    ///
    /// Stale and Unindexed articles are excluded by the join condition.
    pub async fn load_fresh(&self) -> Result<Vec<FreshEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT k.article_id, k.tokens, a.created_at
            FROM article_keys k
            JOIN articles a ON a.id = k.article_id AND a.content_hash = k.digest
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let article_id: String = row.get("article_id");
            let tokens_json: String = row.get("tokens");
            let tokens: BTreeSet<String> = match serde_json::from_str(&tokens_json) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Corrupt token set for article {}: {}", article_id, e);
                    continue;
                }
            };
            entries.push(FreshEntry {
                article_id,
                created_at: row.get("created_at"),
                tokens,
            });
        }

        Ok(entries)
    }

    /// 获取统计信息 / Index statistics
    pub async fn stats(&self) -> Result<IndexStats, IndexError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM articles) AS article_count,
                (SELECT COUNT(*) FROM article_keys) AS indexed_count,
                (SELECT COUNT(*) FROM article_keys k
                   JOIN articles a ON a.id = k.article_id AND a.content_hash = k.digest
                ) AS fresh_count,
                (SELECT MAX(updated_at) FROM article_keys) AS last_updated
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(IndexStats {
            article_count: row.get::<i64, _>("article_count") as u64,
            indexed_count: row.get::<i64, _>("indexed_count") as u64,
            fresh_count: row.get::<i64, _>("fresh_count") as u64,
            last_updated: row.try_get("last_updated").ok(),
        })
    }

    /// Drop entries whose article no longer exists / 清理无主索引记录
    ///
    /// Orphans can only appear when entry removal fails after an article
    /// delete; they never match the Fresh join but would inflate
    /// `indexed_count` forever, since only existing articles get swept.
    pub async fn prune_orphans(&self) -> Result<u64, IndexError> {
        let result = sqlx::query(
            "DELETE FROM article_keys WHERE article_id NOT IN (SELECT id FROM articles)",
        )
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Clear the whole index / 清空索引
    pub async fn clear(&self) -> Result<(), IndexError> {
        sqlx::query("DELETE FROM article_keys").execute(&self.db).await?;
        Ok(())
    }
}
