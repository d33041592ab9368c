//! Core domain types for the article enhancement pipeline.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ArticleId
// ---------------------------------------------------------------------------

/// Article identifier as issued by the article store.
///
/// The store is free to hand out numeric or string ids; we never generate
/// them ourselves, only echo them back in update URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ArticleId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for ArticleId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// An article record as owned by the external article store.
///
/// Invariant maintained by the pipeline: `is_updated == true` exactly when
/// `updated_content` is non-empty and `references` is non-empty. The
/// pipeline only ever flips `is_updated` from `false` to `true`; it never
/// reverts or re-enhances an already-enhanced article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Store-issued identifier.
    pub id: ArticleId,
    /// Article title, also used as the search query.
    pub title: String,
    /// Original body text.
    pub content: String,
    /// Optional source link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Optional cover image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Idempotency flag: `true` once the article has been enhanced.
    #[serde(default)]
    pub is_updated: bool,
    /// Rewritten body (markdown), present only after enhancement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_content: Option<String>,
    /// References used for the rewrite, in ranking order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

impl Article {
    /// Whether this article is still eligible for enhancement.
    pub fn is_eligible(&self) -> bool {
        !self.is_updated
    }
}

/// A persisted `{title, url}` pair pointing at a reference page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

/// Payload for creating a seed article in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Pipeline intermediates
// ---------------------------------------------------------------------------

/// A ranked search hit for an article title.
///
/// `url` is always absolute and never points back at the search provider's
/// own domain — the finder filters before constructing these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
}

/// A search hit enriched with extracted page text.
///
/// `content` is never empty (empty extractions are dropped before this type
/// is constructed) and is capped at the reference truncation limit.
#[derive(Debug, Clone)]
pub struct ReferenceArticle {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl ReferenceArticle {
    /// The `{title, url}` pair persisted alongside the rewritten content.
    pub fn to_reference(&self) -> Reference {
        Reference {
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

/// The atomic payload written back to an article after a successful rewrite.
///
/// Constructed only when every upstream stage succeeded: `updated_content`
/// is non-empty markdown and `references` holds at least one entry.
#[derive(Debug, Clone)]
pub struct EnhancementResult {
    pub updated_content: String,
    pub references: Vec<Reference>,
}

// ---------------------------------------------------------------------------
// Store envelope
// ---------------------------------------------------------------------------

/// The `{success, data}` JSON envelope the article store wraps responses in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_id_accepts_int_and_string() {
        let int: ArticleId = serde_json::from_str("7").expect("int id");
        assert_eq!(int, ArticleId::Int(7));
        assert_eq!(int.to_string(), "7");

        let s: ArticleId = serde_json::from_str(r#""a-7""#).expect("string id");
        assert_eq!(s, ArticleId::Str("a-7".into()));
        assert_eq!(s.to_string(), "a-7");
    }

    #[test]
    fn article_defaults_for_missing_fields() {
        let json = r#"{"id": 3, "title": "T", "content": "C"}"#;
        let article: Article = serde_json::from_str(json).expect("deserialize");
        assert!(!article.is_updated);
        assert!(article.updated_content.is_none());
        assert!(article.references.is_empty());
        assert!(article.is_eligible());
    }

    #[test]
    fn enhanced_article_roundtrip() {
        let article = Article {
            id: 7.into(),
            title: "X".into(),
            content: "Y".into(),
            url: None,
            image_url: None,
            is_updated: true,
            updated_content: Some("# Rewritten".into()),
            references: vec![Reference {
                title: "Ref".into(),
                url: "https://example.com/ref".into(),
            }],
        };
        let json = serde_json::to_string(&article).expect("serialize");
        let parsed: Article = serde_json::from_str(&json).expect("deserialize");
        assert!(parsed.is_updated);
        assert_eq!(parsed.references.len(), 1);
        assert!(!parsed.is_eligible());
    }

    #[test]
    fn envelope_parses_store_response() {
        let json = r#"{"success": true, "data": [{"id": 1, "title": "A", "content": "B"}]}"#;
        let env: Envelope<Vec<Article>> = serde_json::from_str(json).expect("parse");
        assert!(env.success);
        assert_eq!(env.data.expect("data").len(), 1);
    }
}
