//! Post model

use chrono::NaiveDateTime;
use serde::Serialize;

/// Metadata for one post, as listed in the Post Index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostMeta {
    /// Slug (URL-friendly name, derived from the file path)
    pub slug: String,

    /// Post title, never empty
    pub title: String,

    /// Publication date
    pub date: Option<NaiveDateTime>,

    /// Short summary shown in listings
    pub description: Option<String>,

    /// Post tags
    pub tags: Vec<String>,

    /// Listed under "Popular Writings" on the home page
    pub popular: bool,

    /// Raw markdown body
    pub content: String,
}

impl PostMeta {
    /// Publication day as shown in listings
    pub fn date_label(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A fully loaded post: metadata plus the rendered body
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub meta: PostMeta,

    /// Rendered HTML content
    pub html: String,
}

/// Title used when the front-matter has none: the last slug segment
pub fn fallback_title(slug: &str) -> String {
    slug.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("Untitled")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_title() {
        assert_eq!(fallback_title("hello-world"), "hello-world");
        assert_eq!(fallback_title("2024/hello"), "hello");
        assert_eq!(fallback_title(""), "Untitled");
    }

    #[test]
    fn test_date_label() {
        let mut meta = PostMeta {
            slug: "a".to_string(),
            title: "A".to_string(),
            date: None,
            description: None,
            tags: vec!["rust".to_string()],
            popular: false,
            content: String::new(),
        };
        assert_eq!(meta.date_label(), "");
        meta.date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(8, 0, 0));
        assert_eq!(meta.date_label(), "2024-06-01");
        assert!(meta.has_tag("rust"));
        assert!(!meta.has_tag("Rust"));
    }
}
