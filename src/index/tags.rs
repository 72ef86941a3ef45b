//! Tag aggregation

use std::collections::BTreeMap;

use crate::content::PostMeta;

/// Tag → number of posts carrying it, ordered by tag name.
///
/// Tags are compared by exact string equality, so `Rust` and `rust` are
/// distinct entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagIndex {
    counts: BTreeMap<String, usize>,
}

impl TagIndex {
    /// Aggregate tag counts over the Post Index
    pub fn build(posts: &[PostMeta]) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for post in posts {
            for tag in &post.tags {
                *counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    pub fn count(&self, tag: &str) -> usize {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// (tag, count) pairs, ordered by tag
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(tag, count)| (tag.as_str(), *count))
    }
}

/// Posts carrying `tag`, in Post Index order
pub fn posts_tagged<'a>(posts: &'a [PostMeta], tag: &str) -> Vec<&'a PostMeta> {
    posts.iter().filter(|p| p.has_tag(tag)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::meta;

    fn corpus() -> Vec<PostMeta> {
        vec![
            meta("one", "One", &["python", "django"]),
            meta("two", "Two", &["python"]),
            meta("three", "Three", &["Python", "rust"]),
            meta("four", "Four", &[]),
        ]
    }

    #[test]
    fn test_counts_match_post_index() {
        let posts = corpus();
        let index = TagIndex::build(&posts);

        for (tag, count) in index.iter() {
            assert_eq!(count, posts_tagged(&posts, tag).len(), "tag {}", tag);
        }
        assert_eq!(index.count("python"), 2);
        assert_eq!(index.count("missing"), 0);
    }

    #[test]
    fn test_case_sensitive_and_sorted() {
        let index = TagIndex::build(&corpus());
        let tags: Vec<_> = index.iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec!["Python", "django", "python", "rust"]);
        assert_eq!(index.count("Python"), 1);
    }

    #[test]
    fn test_posts_tagged_keeps_order() {
        let posts = corpus();
        let slugs: Vec<_> = posts_tagged(&posts, "python")
            .iter()
            .map(|p| p.slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["one", "two"]);
        assert!(posts_tagged(&posts, "go").is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = TagIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }
}
