//! Keyword tokenizer - uses jieba-rs for Chinese word segmentation / 中文分词器
//!
//! Article prose is largely not whitespace-delimited, so keyword extraction
//! goes through jieba (search engine mode) instead of naive splitting.
//! The same function tokenizes both article bodies and search queries;
//! index and query normalization must never diverge.
//!
//! Output is a `BTreeSet`: de-duplicated and deterministically ordered, so
//! tokenizing the same content twice yields the identical set.

use std::collections::BTreeSet;

use jieba_rs::Jieba;
use once_cell::sync::Lazy;

/// Global jieba tokenizer instance / 全局 jieba 分词器实例
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// ASCII-only tokens shorter than this are noise / 过短的纯ASCII词视为噪音
const MIN_ASCII_TOKEN_CHARS: usize = 2;

/// Stop words excluded from the index / 停用词表
static STOP_WORDS: &[&str] = &[
    // Chinese / 中文
    "的", "了", "是", "在", "和", "与", "或", "也", "都", "就", "而", "及",
    "着", "把", "被", "让", "向", "从", "到", "对", "为", "再", "很", "啊",
    "吗", "吧", "呢", "这", "那", "我们", "你们", "他们", "一个", "没有",
    "什么", "可以", "因为", "所以", "但是", "如果", "这个", "那个", "自己",
    // English
    "the", "a", "an", "and", "or", "of", "to", "in", "on", "at", "is", "are",
    "was", "were", "be", "been", "it", "its", "as", "by", "for", "with",
    "that", "this", "these", "those", "not", "no", "but", "if", "then",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Check if text contains CJK characters / 检测文本是否包含CJK字符
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
            '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
            '\u{3040}'..='\u{309f}' |  // Hiragana
            '\u{30a0}'..='\u{30ff}' |  // Katakana
            '\u{ac00}'..='\u{d7af}'    // Hangul Syllables
        )
    })
}

/// A token has to carry at least one letter, digit or CJK character,
/// otherwise it is punctuation / 纯标点的切分结果直接丢弃
fn has_word_char(token: &str) -> bool {
    token.chars().any(|c| c.is_alphanumeric())
}

/// Extract the normalized keyword set from text / 提取标准化关键词集合
///
/// Lowercased, stop words and punctuation removed, ASCII tokens shorter than
/// [`MIN_ASCII_TOKEN_CHARS`] dropped. Never fails; malformed or empty input
/// yields an empty set.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();

    // jieba search engine mode, finer granularity / 搜索引擎模式，粒度更细
    for word in JIEBA.cut_for_search(text, true) {
        let word = word.trim();
        if word.is_empty() || !has_word_char(word) {
            continue;
        }

        let lower = word.to_lowercase();
        if is_stop_word(&lower) {
            continue;
        }
        if !contains_cjk(&lower) && lower.chars().count() < MIN_ASCII_TOKEN_CHARS {
            continue;
        }

        tokens.insert(lower);
    }

    tokens
}

/// Tokenize a search query / 对搜索查询进行分词
///
/// Same normalization as index tokenization / 查询分词与索引分词保持一致
pub fn tokenize_query(query: &str) -> BTreeSet<String> {
    tokenize(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_chinese() {
        let tokens = tokenize("中华人民共和国成立于一九四九年");
        assert!(!tokens.is_empty());
        // jieba segments the compound into multiple words / jieba 会切出多个词
        assert!(tokens.iter().all(|t| !t.trim().is_empty()));
    }

    #[test]
    fn test_tokenize_english_lowercased() {
        let tokens = tokenize("Rust Systems Design");
        assert!(tokens.contains("rust"));
        assert!(tokens.contains("systems"));
        assert!(tokens.contains("design"));
    }

    #[test]
    fn test_tokenize_deduplicates() {
        let tokens = tokenize("rust rust Rust RUST");
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_tokenize_deterministic() {
        let text = "异步运行时 tokio 的调度器设计 design of the tokio scheduler";
        assert_eq!(tokenize(text), tokenize(text));
    }

    #[test]
    fn test_stop_words_removed() {
        let tokens = tokenize("the design of the scheduler");
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("of"));
        assert!(tokens.contains("design"));

        let tokens = tokenize("调度器的设计");
        assert!(!tokens.contains("的"));
    }

    #[test]
    fn test_short_ascii_dropped() {
        let tokens = tokenize("x y rust");
        assert!(!tokens.contains("x"));
        assert!(!tokens.contains("y"));
        assert!(tokens.contains("rust"));
    }

    #[test]
    fn test_punctuation_only_dropped() {
        let tokens = tokenize("！！！ 。。。 --- ...");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
    }

    #[test]
    fn test_query_matches_index_normalization() {
        let body = tokenize("Rust 异步编程实战");
        let query = tokenize_query("rust 异步编程");
        assert!(query.iter().any(|t| body.contains(t)));
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("测试"));
        assert!(contains_cjk("test测试"));
        assert!(!contains_cjk("test"));
    }
}
