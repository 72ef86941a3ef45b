//! Content module - posts, pages, front-matter and markdown rendering

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use markdown::{html_escape, MarkdownRenderer};
pub use post::{Post, PostMeta};
