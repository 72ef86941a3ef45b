//! Indexes derived from the Post Index on every request

mod search;
mod tags;

pub use search::search;
pub use tags::{posts_tagged, TagIndex};

use crate::content::PostMeta;

/// Posts flagged `popular`, in Post Index order
pub fn popular(posts: &[PostMeta]) -> Vec<&PostMeta> {
    posts.iter().filter(|p| p.popular).collect()
}
