//! Article store / 文章存储
//!
//! Owns the `articles` table. The store recomputes `content_hash` on every
//! save so the stored digest is always consistent with the stored body; the
//! indexing pipeline compares against it to detect change.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Article, ArticleQuery, ArticleSummary, SaveArticleRequest, UpdateArticleRequest};
use crate::search::hasher;

#[derive(Clone)]
pub struct ArticleStore {
    db: SqlitePool,
}

fn parse_list(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

fn row_to_article(row: &SqliteRow) -> Article {
    Article {
        id: row.get("id"),
        title: row.get("title"),
        path: row.get("path"),
        categories: parse_list(&row.get::<String, _>("categories")),
        tags: parse_list(&row.get::<String, _>("tags")),
        content: row.get("content"),
        content_hash: row.get("content_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl ArticleStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create an article; the content digest is computed here / 创建文章
    pub async fn create(&self, req: SaveArticleRequest) -> Result<Article, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let article = Article {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            path: req.path,
            categories: req.categories,
            tags: req.tags,
            content_hash: hasher::digest(&req.content),
            content: req.content,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO articles (id, title, path, categories, tags, content, content_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&article.id)
        .bind(&article.title)
        .bind(&article.path)
        .bind(serde_json::to_string(&article.categories).unwrap_or_else(|_| "[]".into()))
        .bind(serde_json::to_string(&article.tags).unwrap_or_else(|_| "[]".into()))
        .bind(&article.content)
        .bind(&article.content_hash)
        .bind(&article.created_at)
        .bind(&article.updated_at)
        .execute(&self.db)
        .await?;

        Ok(article)
    }

    /// Partial update; digest recomputed on every save / 更新文章
    pub async fn update(
        &self,
        id: &str,
        req: UpdateArticleRequest,
    ) -> Result<Option<Article>, sqlx::Error> {
        let Some(mut article) = self.get(id).await? else {
            return Ok(None);
        };

        if let Some(title) = req.title {
            article.title = title;
        }
        if let Some(path) = req.path {
            article.path = path;
        }
        if let Some(categories) = req.categories {
            article.categories = categories;
        }
        if let Some(tags) = req.tags {
            article.tags = tags;
        }
        if let Some(content) = req.content {
            article.content = content;
        }
        article.content_hash = hasher::digest(&article.content);
        article.updated_at = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE articles SET title = ?, path = ?, categories = ?, tags = ?, content = ?, \
             content_hash = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&article.title)
        .bind(&article.path)
        .bind(serde_json::to_string(&article.categories).unwrap_or_else(|_| "[]".into()))
        .bind(serde_json::to_string(&article.tags).unwrap_or_else(|_| "[]".into()))
        .bind(&article.content)
        .bind(&article.content_hash)
        .bind(&article.updated_at)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(Some(article))
    }

    /// Replace just the body / 仅替换正文
    pub async fn update_content(
        &self,
        id: &str,
        content: &str,
    ) -> Result<Option<Article>, sqlx::Error> {
        self.update(
            id,
            UpdateArticleRequest {
                content: Some(content.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Article>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|r| row_to_article(&r)))
    }

    /// Bulk fetch for result-page hydration; returned in the order of `ids`
    /// / 批量查询，保持传入顺序
    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<Article>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM articles WHERE id IN ({})", placeholders);

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.db).await?;

        let mut by_id: std::collections::HashMap<String, Article> = rows
            .iter()
            .map(|r| {
                let article = row_to_article(r);
                (article.id.clone(), article)
            })
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Filtered admin list with paging / 管理端筛选列表
    pub async fn list(
        &self,
        query: &ArticleQuery,
    ) -> Result<(Vec<ArticleSummary>, i64), sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(ref title) = query.title {
            conditions.push("a.title LIKE ?".to_string());
            binds.push(format!("%{}%", title));
        }
        if let Some(ref category) = query.category {
            // categories is a JSON array column / categories 列为JSON数组
            conditions.push("a.categories LIKE ?".to_string());
            binds.push(format!("%\"{}\"%", category));
        }
        if let Some(ref tag) = query.tag {
            conditions.push("a.tags LIKE ?".to_string());
            binds.push(format!("%\"{}\"%", tag));
        }
        if let Some(indexed) = query.is_indexed {
            let exists = "EXISTS (SELECT 1 FROM article_keys k \
                          WHERE k.article_id = a.id AND k.digest = a.content_hash)";
            if indexed {
                conditions.push(exists.to_string());
            } else {
                conditions.push(format!("NOT {}", exists));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM articles a {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for bind in &binds {
            count_query = count_query.bind(bind);
        }
        let total = count_query.fetch_one(&self.db).await?;

        let offset = query.offset.unwrap_or(0).max(0);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let list_sql = format!(
            "SELECT a.id, a.title, a.path, a.categories, a.tags, a.created_at, a.updated_at, \
             EXISTS (SELECT 1 FROM article_keys k \
                     WHERE k.article_id = a.id AND k.digest = a.content_hash) AS is_indexed \
             FROM articles a {} ORDER BY a.created_at DESC, a.id LIMIT ? OFFSET ?",
            where_clause
        );
        let mut list_query = sqlx::query(&list_sql);
        for bind in &binds {
            list_query = list_query.bind(bind);
        }
        let rows = list_query.bind(limit).bind(offset).fetch_all(&self.db).await?;

        let summaries = rows
            .iter()
            .map(|row| ArticleSummary {
                id: row.get("id"),
                title: row.get("title"),
                path: row.get("path"),
                categories: parse_list(&row.get::<String, _>("categories")),
                tags: parse_list(&row.get::<String, _>("tags")),
                is_indexed: row.get::<i64, _>("is_indexed") == 1,
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect();

        Ok((summaries, total))
    }

    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every article body, for the stale sweep / 全量正文，供补漏扫描
    pub async fn load_index_sources(&self) -> Result<Vec<(String, String)>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, content FROM articles")
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Test fixture hook: pin an article's creation timestamp
    #[cfg(test)]
    pub async fn set_created_at(&self, id: &str, created_at: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE articles SET created_at = ? WHERE id = ?")
            .bind(created_at)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
