//! Content digest / 正文内容摘要
//!
//! A fixed-size fingerprint of the article body. Save paths compare the
//! stored digest against a freshly computed one to decide whether the
//! keyword index needs rebuilding, so this must be deterministic and
//! collision-resistant.

use sha1::{Digest, Sha1};

/// Compute the SHA-1 hex digest of an article body / 计算正文的SHA1摘要
pub fn digest(content: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        assert_eq!(digest("你好，世界"), digest("你好，世界"));
        assert_eq!(digest(""), digest(""));
    }

    #[test]
    fn test_digest_changes_with_content() {
        assert_ne!(digest("hello"), digest("hello "));
        assert_ne!(digest("正文A"), digest("正文B"));
    }

    #[test]
    fn test_digest_is_hex_sha1() {
        let d = digest("abc");
        assert_eq!(d.len(), 40);
        assert_eq!(d, "a9993e364706816aba3e25717850c26c9cd0d89d");
    }
}
