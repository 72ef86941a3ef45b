//! Content loader - resolves slugs to markdown files and builds the Post Index

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::post::fallback_title;
use super::{FrontMatter, Post, PostMeta};
use crate::error::{Error, Result};
use crate::Site;

/// Recognised extensions, in lookup priority order
const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Loads content from the posts and pages directories.
///
/// Nothing is memoized: every call goes back to the filesystem.
pub struct ContentLoader<'a> {
    site: &'a Site,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Load and render a single post by slug
    pub fn load_post(&self, slug: &str) -> Result<Post> {
        self.load(&self.site.posts_dir, "post", slug)
    }

    /// Load and render a standalone page by (possibly nested) slug
    pub fn load_page(&self, slug: &str) -> Result<Post> {
        self.load(&self.site.pages_dir, "page", slug)
    }

    fn load(&self, dir: &Path, kind: &'static str, slug: &str) -> Result<Post> {
        validate_slug(slug)?;
        let path = find_markdown_file(dir, slug).ok_or_else(|| Error::not_found(kind, slug))?;
        tracing::debug!("Loading {} {:?} from {:?}", kind, slug, path);

        let meta = read_meta(&path, slug)?;
        let html = self.site.renderer.render(&meta.content);
        Ok(Post { meta, html })
    }

    /// Build the Post Index: every post's metadata, newest first.
    ///
    /// Files that fail to load are skipped with a warning.
    pub fn list_posts(&self) -> Result<Vec<PostMeta>> {
        let posts_dir = &self.site.posts_dir;
        if !posts_dir.exists() {
            return Ok(Vec::new());
        }

        let mut posts: Vec<PostMeta> = discover_posts(posts_dir)
            .into_iter()
            .filter_map(|(slug, path)| match read_meta(&path, &slug) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    tracing::warn!("Skipping post {:?}: {}", path, e);
                    None
                }
            })
            .collect();

        // Newest first; undated posts sort last since None < Some
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));

        Ok(posts)
    }
}

/// Reject slugs that could escape the content directory
pub fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && !slug.contains(['\\', '\0'])
        && slug
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidSlug(slug.to_string()))
    }
}

/// Find `{slug}.md`, then `{slug}.markdown`
fn find_markdown_file(dir: &Path, slug: &str) -> Option<PathBuf> {
    MARKDOWN_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", slug, ext)))
        .find(|path| path.is_file())
}

/// Lookup priority of a markdown file, lower wins
fn extension_rank(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?;
    MARKDOWN_EXTENSIONS.iter().position(|e| *e == ext)
}

/// Slug of a file relative to its content directory
fn slug_for(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?.with_extension("");
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

/// Map every slug under `dir` to the file that serves it
fn discover_posts(dir: &Path) -> BTreeMap<String, PathBuf> {
    let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read entry under {:?}: {}", dir, e);
                continue;
            }
        };
        let path = entry.path();
        let Some(rank) = extension_rank(path) else {
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(slug) = slug_for(dir, path) else {
            tracing::warn!("Skipping post with non UTF-8 path: {:?}", path);
            continue;
        };

        match found.get(&slug) {
            Some(existing) => {
                tracing::warn!(
                    "Duplicate slug {:?}: {:?} and {:?}",
                    slug,
                    existing,
                    path
                );
                if extension_rank(existing).map_or(true, |r| rank < r) {
                    found.insert(slug, path.to_path_buf());
                }
            }
            None => {
                found.insert(slug, path.to_path_buf());
            }
        }
    }

    found
}

/// Read a markdown file and extract its metadata
fn read_meta(path: &Path, slug: &str) -> Result<PostMeta> {
    let source = fs::read_to_string(path)?;
    let (fm, body) = FrontMatter::parse(&source, path)?;

    let date = fm.parse_date(path)?;

    let mut tags: Vec<String> = Vec::new();
    for tag in fm.clean_tags() {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let title = fm
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback_title(slug));

    let description = fm
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(PostMeta {
        slug: slug.to_string(),
        title,
        date,
        description,
        tags,
        popular: fm.popular,
        content: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn site(tmp: &TempDir) -> Site {
        Site::with_config(tmp.path(), SiteConfig::default()).unwrap()
    }

    #[test]
    fn test_load_post() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "posts/hello.md",
            "---\ntitle: Hello\ndate: 2024-01-01\ntags: [rust, web]\n---\n\n# Heading\n\nBody text.\n",
        );
        let site = site(&tmp);

        let post = ContentLoader::new(&site).load_post("hello").unwrap();
        assert_eq!(post.meta.title, "Hello");
        assert_eq!(post.meta.tags, vec!["rust", "web"]);
        assert!(post.html.contains("<h1>Heading</h1>"));
        assert!(post.meta.content.starts_with("# Heading"));
    }

    #[test]
    fn test_missing_post_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let site = site(&tmp);
        let err = ContentLoader::new(&site).load_post("nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_title_falls_back_to_slug() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts/untitled-thoughts.md", "---\ntitle: \"  \"\n---\nText");
        write(tmp.path(), "posts/bare.md", "Just text");
        let site = site(&tmp);
        let loader = ContentLoader::new(&site);

        assert_eq!(
            loader.load_post("untitled-thoughts").unwrap().meta.title,
            "untitled-thoughts"
        );
        assert_eq!(loader.load_post("bare").unwrap().meta.title, "bare");
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("hello").is_ok());
        assert!(validate_slug("2024/hello").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("../secret").is_err());
        assert!(validate_slug("a//b").is_err());
        assert!(validate_slug("/etc/passwd").is_err());
        assert!(validate_slug("a\\b").is_err());
    }

    #[test]
    fn test_traversal_is_not_found() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "secret.md", "---\ntitle: Secret\n---\n");
        let site = site(&tmp);
        let err = ContentLoader::new(&site).load_post("../secret").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_posts_sorted_newest_first() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts/january.md", "---\ntitle: January\ndate: 2024-01-01\n---\n");
        write(tmp.path(), "posts/june.md", "---\ntitle: June\ndate: 2024-06-01\n---\n");
        write(tmp.path(), "posts/undated.md", "---\ntitle: Undated\n---\n");
        let site = site(&tmp);

        let posts = ContentLoader::new(&site).list_posts().unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["june", "january", "undated"]);
    }

    #[test]
    fn test_list_posts_same_date_ordered_by_slug() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts/b.md", "---\ntitle: B\ndate: 2024-01-01\n---\n");
        write(tmp.path(), "posts/a.md", "---\ntitle: A\ndate: 2024-01-01\n---\n");
        let site = site(&tmp);

        let posts = ContentLoader::new(&site).list_posts().unwrap();
        assert_eq!(posts[0].slug, "a");
        assert_eq!(posts[1].slug, "b");
    }

    #[test]
    fn test_list_posts_skips_malformed() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts/good.md", "---\ntitle: Good\ndate: 2024-01-01\n---\n");
        write(tmp.path(), "posts/broken.md", "---\ntitle: [oops\n---\n");
        write(tmp.path(), "posts/bad-date.md", "---\ntitle: Bad\ndate: someday\n---\n");
        write(tmp.path(), "posts/notes.txt", "not markdown");
        let site = site(&tmp);
        let loader = ContentLoader::new(&site);

        let posts = loader.list_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "good");

        // Loading the broken file directly still reports the problem
        let err = loader.load_post("broken").unwrap_err();
        assert!(matches!(err, Error::FrontMatter { .. }));
    }

    #[test]
    fn test_list_posts_nested_and_hidden() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts/2024/nested.md", "---\ntitle: Nested\n---\n");
        write(tmp.path(), "posts/.drafts/hidden.md", "---\ntitle: Hidden\n---\n");
        let site = site(&tmp);
        let loader = ContentLoader::new(&site);

        let posts = loader.list_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "2024/nested");
        assert_eq!(loader.load_post("2024/nested").unwrap().meta.title, "Nested");
    }

    #[test]
    fn test_duplicate_slug_prefers_md() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts/dup.markdown", "---\ntitle: From markdown\n---\n");
        write(tmp.path(), "posts/dup.md", "---\ntitle: From md\n---\n");
        let site = site(&tmp);
        let loader = ContentLoader::new(&site);

        let posts = loader.list_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "From md");
        assert_eq!(loader.load_post("dup").unwrap().meta.title, "From md");
    }

    #[test]
    fn test_repeated_tags_kept_once() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts/t.md", "---\ntags: [rust, rust, \" \", Rust]\n---\n");
        let site = site(&tmp);

        let posts = ContentLoader::new(&site).list_posts().unwrap();
        assert_eq!(posts[0].tags, vec!["rust", "Rust"]);
    }

    #[test]
    fn test_numeric_tag_is_indexed() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "posts/a.md", "---\ntags: [python, 3]\n---\n");
        write(tmp.path(), "posts/b.md", "---\ntags: 2024\n---\n");
        let site = site(&tmp);

        let posts = ContentLoader::new(&site).list_posts().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].tags, vec!["python", "3"]);
        assert_eq!(posts[1].tags, vec!["2024"]);
    }

    #[test]
    fn test_missing_posts_dir_is_empty_index() {
        let tmp = TempDir::new().unwrap();
        let site = site(&tmp);
        assert!(ContentLoader::new(&site).list_posts().unwrap().is_empty());
    }

    #[test]
    fn test_load_nested_page() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "pages/about.md", "---\ntitle: About\n---\nWho I am.");
        write(tmp.path(), "pages/talks/pycon.md", "---\ntitle: PyCon\n---\nSlides.");
        let site = site(&tmp);
        let loader = ContentLoader::new(&site);

        assert_eq!(loader.load_page("about").unwrap().meta.title, "About");
        assert_eq!(loader.load_page("talks/pycon").unwrap().meta.title, "PyCon");
        assert!(loader.load_page("talks/missing").unwrap_err().is_not_found());
        assert!(loader.load_post("about").unwrap_err().is_not_found());
    }
}
