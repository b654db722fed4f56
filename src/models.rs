use serde::{Deserialize, Serialize};

/// A content document / 文章
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    /// Unique access slug / 文章访问路径
    pub path: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Body content / 正文内容
    pub content: String,
    /// SHA-1 of the body, recomputed on every save / 正文内容Hash
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

/// List row without the body / 列表行，不含正文
#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub path: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Whether a Fresh index entry exists / 是否已建立一致的索引
    pub is_indexed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveArticleRequest {
    pub title: String,
    pub path: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Admin list filters / 管理端列表筛选条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleQuery {
    /// Title substring match / 标题模糊搜索
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    /// Filter on Fresh-indexed state / 按是否已索引筛选
    #[serde(default)]
    pub is_indexed: Option<bool>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}
