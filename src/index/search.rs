//! Naive substring search over the Post Index

use crate::content::PostMeta;

/// Posts whose title, description, content or tags contain `query`.
///
/// Matching is case-insensitive after trimming both sides. A blank query
/// matches nothing. Results keep Post Index order.
pub fn search<'a>(posts: &'a [PostMeta], query: &str) -> Vec<&'a PostMeta> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    posts.iter().filter(|post| matches(post, &needle)).collect()
}

fn matches(post: &PostMeta, needle: &str) -> bool {
    let tags = post.tags.join(" ");
    let fields = [
        post.title.as_str(),
        post.description.as_deref().unwrap_or(""),
        post.content.as_str(),
        tags.as_str(),
    ];

    fields
        .iter()
        .any(|field| field.trim().to_lowercase().contains(needle))
}
