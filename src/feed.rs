//! Atom and RSS feed generation
//!
//! The server only passes feed files through; this module builds them from
//! the Post Index ahead of time.

use chrono::{NaiveDateTime, Utc};
use std::fs;
use std::path::PathBuf;

use crate::content::PostMeta;
use crate::error::Result;
use crate::index::posts_tagged;
use crate::views::post_href;
use crate::Site;

/// Builds feed documents for a site
pub struct FeedBuilder<'a> {
    site: &'a Site,
}

impl<'a> FeedBuilder<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    fn base_url(&self) -> &str {
        self.site.config.url.trim_end_matches('/')
    }

    fn post_url(&self, post: &PostMeta) -> String {
        format!("{}{}", self.base_url(), post_href(&post.slug))
    }

    /// Dated posts only, capped at the configured limit
    fn entries<'p>(&self, posts: impl IntoIterator<Item = &'p PostMeta>) -> Vec<&'p PostMeta> {
        posts
            .into_iter()
            .filter(|p| p.date.is_some())
            .take(self.site.config.feed.limit)
            .collect()
    }

    fn entry_html(&self, post: &PostMeta) -> String {
        let html = self.site.renderer.render(&post.content);
        cdata(&strip_invalid_xml_chars(&html))
    }

    /// Render an Atom feed. `file_name` is the feed's own name under /feeds.
    pub fn atom<'p>(
        &self,
        posts: impl IntoIterator<Item = &'p PostMeta>,
        title: &str,
        file_name: &str,
    ) -> String {
        let config = &self.site.config;
        let entries = self.entries(posts);
        let updated = entries
            .first()
            .and_then(|p| p.date)
            .map(rfc3339)
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(title)));
        feed.push_str(&format!(
            "  <link href=\"{}/feeds/{}\" rel=\"self\"/>\n",
            self.base_url(),
            escape_xml(file_name)
        ));
        feed.push_str(&format!("  <link href=\"{}/\"/>\n", self.base_url()));
        feed.push_str(&format!("  <updated>{}</updated>\n", updated));
        feed.push_str(&format!("  <id>{}/</id>\n", self.base_url()));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for post in entries {
            let url = self.post_url(post);
            let date = post.date.map(rfc3339).unwrap_or_default();
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", escape_xml(&url)));
            feed.push_str(&format!("    <id>{}</id>\n", escape_xml(&url)));
            feed.push_str(&format!("    <published>{}</published>\n", date));
            feed.push_str(&format!("    <updated>{}</updated>\n", date));
            if let Some(description) = &post.description {
                feed.push_str(&format!(
                    "    <summary>{}</summary>\n",
                    escape_xml(description)
                ));
            }
            for tag in &post.tags {
                feed.push_str(&format!("    <category term=\"{}\"/>\n", escape_xml(tag)));
            }
            feed.push_str(&format!(
                "    <content type=\"html\">{}</content>\n",
                self.entry_html(post)
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");
        feed
    }

    /// Render an RSS 2.0 feed
    pub fn rss<'p>(&self, posts: impl IntoIterator<Item = &'p PostMeta>) -> String {
        let config = &self.site.config;
        let entries = self.entries(posts);

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<rss version="2.0"><channel>"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!("  <link>{}/</link>\n", self.base_url()));
        feed.push_str(&format!(
            "  <description>{}</description>\n",
            escape_xml(&config.description)
        ));

        for post in entries {
            let url = self.post_url(post);
            feed.push_str("  <item>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link>{}</link>\n", escape_xml(&url)));
            feed.push_str(&format!("    <guid>{}</guid>\n", escape_xml(&url)));
            if let Some(date) = post.date {
                feed.push_str(&format!(
                    "    <pubDate>{}</pubDate>\n",
                    date.and_utc().to_rfc2822()
                ));
            }
            for tag in &post.tags {
                feed.push_str(&format!("    <category>{}</category>\n", escape_xml(tag)));
            }
            feed.push_str(&format!(
                "    <description>{}</description>\n",
                self.entry_html(post)
            ));
            feed.push_str("  </item>\n");
        }

        feed.push_str("</channel></rss>\n");
        feed
    }

    /// Write `atom.xml`, `rss.xml` and one Atom feed per configured tag into
    /// the feeds directory. Returns the written paths.
    pub fn write_all(&self, posts: &[PostMeta]) -> Result<Vec<PathBuf>> {
        let feeds_dir = &self.site.feeds_dir;
        fs::create_dir_all(feeds_dir)?;

        let mut documents = vec![
            (
                "atom.xml".to_string(),
                self.atom(posts, &self.site.config.title, "atom.xml"),
            ),
            ("rss.xml".to_string(), self.rss(posts)),
        ];

        for tag in &self.site.config.feed.tags {
            let tag_slug = slug::slugify(tag);
            if tag_slug.is_empty() {
                tracing::warn!("Skipping feed for tag {:?}: empty slug", tag);
                continue;
            }
            let file_name = format!("{}.atom.xml", tag_slug);
            let title = format!("{}: {}", self.site.config.title, tag);
            let tagged = posts_tagged(posts, tag);
            documents.push((file_name.clone(), self.atom(tagged, &title, &file_name)));
        }

        let mut written = Vec::with_capacity(documents.len());
        for (file_name, content) in documents {
            let path = feeds_dir.join(&file_name);
            fs::write(&path, content)?;
            tracing::info!("Generated {}", file_name);
            written.push(path);
        }

        Ok(written)
    }
}

fn rfc3339(date: NaiveDateTime) -> String {
    date.and_utc().to_rfc3339()
}

/// Escape text for XML element and attribute content
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Wrap in CDATA, splitting any embedded terminator
fn cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}

/// Drop control characters that are not allowed in XML 1.0
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .collect()
}
