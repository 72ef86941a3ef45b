//! HTML page builders
//!
//! Small string helpers in the spirit of template helpers: each returns a
//! fragment, and [`View::into_html`] wraps a page body in the site layout.
//! All text coming from content files is escaped here.

use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;
use crate::content::{html_escape, Post, PostMeta};
use crate::index::TagIndex;

/// Characters escaped inside one URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Same as [`SEGMENT`] but keeps `/` for nested slugs
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const STYLESHEETS: [&str; 3] = [
    "https://cdn.jsdelivr.net/npm/normalize.css@8.0.1/normalize.min.css",
    "https://cdn.jsdelivr.net/npm/sakura.css/css/sakura.css",
    "/public/style.css",
];

/// A rendered page: document title plus body markup
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub title: String,
    pub body: String,
}

impl View {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Wrap the body in the full site layout
    pub fn into_html(self, config: &SiteConfig) -> String {
        let stylesheets: String = STYLESHEETS
            .iter()
            .map(|href| format!(r#"<link rel="stylesheet" href="{}" type="text/css">"#, href))
            .collect();

        format!(
            concat!(
                "<!doctype html>\n<html lang=\"en\">\n<head>\n",
                "<meta charset=\"utf-8\">\n",
                "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
                "<title>{title}</title>\n",
                "{socials}{stylesheets}\n",
                "</head>\n<body>\n{header}\n<main>\n{body}\n</main>\n{footer}\n</body>\n</html>\n"
            ),
            title = html_escape(&self.title),
            socials = socials(config),
            stylesheets = stylesheets,
            header = header(config),
            body = self.body,
            footer = footer(config),
        )
    }
}

/// Open Graph and description meta tags
fn socials(config: &SiteConfig) -> String {
    let url = config.url.trim_end_matches('/');
    format!(
        concat!(
            "<meta name=\"description\" content=\"{description}\">\n",
            "<meta property=\"og:site_name\" content=\"{title}\">\n",
            "<meta property=\"og:title\" content=\"{title}\">\n",
            "<meta property=\"og:description\" content=\"{description}\">\n",
            "<meta property=\"og:url\" content=\"{url}\">\n",
            "<meta property=\"og:image\" content=\"{url}/public/images/profile.jpg\">\n",
        ),
        title = html_escape(&config.title),
        description = html_escape(&config.description),
        url = html_escape(url),
    )
}

fn header(config: &SiteConfig) -> String {
    format!(
        concat!(
            "<header>\n<h2><a href=\"/\">{title}</a></h2>\n",
            "<nav><a href=\"/posts\">Articles</a> | <a href=\"/tags\">Tags</a> | ",
            "<a href=\"/search\">Search</a></nav>\n</header>"
        ),
        title = html_escape(&config.title)
    )
}

fn footer(config: &SiteConfig) -> String {
    format!(
        "<footer><hr><p>All rights reserved, {}.</p></footer>",
        html_escape(&config.author)
    )
}

/// Link target for a post
pub fn post_href(slug: &str) -> String {
    format!("/posts/{}", utf8_percent_encode(slug, PATH))
}

/// Link target for a tag
pub fn tag_href(tag: &str) -> String {
    format!("/tags/{}", utf8_percent_encode(tag, SEGMENT))
}

/// Listing entry for one post
pub fn post_card(post: &PostMeta) -> String {
    let mut card = format!(
        "<div class=\"post\">\n<h2><a href=\"{}\">{}</a></h2>\n",
        html_escape(&post_href(&post.slug)),
        html_escape(&post.title)
    );
    if let Some(description) = &post.description {
        card.push_str(&format!("<p>{}</p>\n", html_escape(description)));
    }
    if post.date.is_some() {
        card.push_str(&format!(
            "<p><small><time>{}</time></small></p>\n",
            post.date_label()
        ));
    }
    card.push_str("</div>\n");
    card
}

pub fn tag_link(tag: &str) -> String {
    format!(
        r#"<a class="tag" href="{}">{}</a>"#,
        html_escape(&tag_href(tag)),
        html_escape(tag)
    )
}

pub fn tag_with_count(tag: &str, count: usize) -> String {
    format!(
        r#"<span class="tag"><a href="{}">{}</a> ({})</span>"#,
        html_escape(&tag_href(tag)),
        html_escape(tag),
        count
    )
}

fn back_link(href: &str, label: &str) -> String {
    format!("<p><a href=\"{}\">&larr; {}</a></p>", href, label)
}

fn cards<'a>(posts: impl IntoIterator<Item = &'a PostMeta>) -> String {
    posts.into_iter().map(post_card).collect()
}

/// Years elapsed since `start`, to two decimals
pub fn years_since(start: NaiveDate, today: NaiveDate) -> f64 {
    let days = (today - start).num_days() as f64;
    (days / 365.25 * 100.0).round() / 100.0
}

pub fn home(config: &SiteConfig, recent: &[PostMeta], popular: &[&PostMeta]) -> View {
    let body = format!(
        "<section>\n<h1>Recent Writings</h1>\n{}</section>\n<hr>\n<section>\n<h1>Popular Writings</h1>\n{}</section>",
        cards(recent.iter().take(config.recent_posts)),
        cards(popular.iter().copied()),
    );
    View::new(config.title.clone(), body)
}

pub fn posts(config: &SiteConfig, posts: &[PostMeta], today: NaiveDate) -> View {
    let body = format!(
        "<section>\n<h1>All Articles ({count})</h1>\n<p>Everything written by {author} for the past {years:.2} years.</p>\n{cards}{back}\n</section>",
        count = posts.len(),
        author = html_escape(&config.author),
        years = years_since(config.writing_since, today),
        cards = cards(posts),
        back = back_link("/", "Back to home"),
    );
    View::new(format!("All posts by {}", config.author), body)
}

pub fn post(post: &Post) -> View {
    let tags: Vec<String> = post.meta.tags.iter().map(|t| tag_link(t)).collect();
    let body = format!(
        "<section>\n<h1>{title}</h1>\n<div class=\"marked\">\n{content}</div>\n<p><span>Tags: </span>{tags}</p>\n{back}\n</section>",
        title = html_escape(&post.meta.title),
        content = post.html,
        tags = tags.join(" "),
        back = back_link("/posts", "Back to all articles"),
    );
    View::new(post.meta.title.clone(), body)
}

/// Standalone markdown page
pub fn page(page: &Post) -> View {
    let body = format!(
        "<section>\n<h1>{}</h1>\n<div class=\"marked\">\n{}</div>\n</section>",
        html_escape(&page.meta.title),
        page.html
    );
    View::new(page.meta.title.clone(), body)
}

pub fn tags(index: &TagIndex) -> View {
    let tags: Vec<String> = index
        .iter()
        .map(|(tag, count)| tag_with_count(tag, count))
        .collect();
    let body = format!(
        "<section>\n<h1>Tags</h1>\n<p>All tags used in the blog</p>\n{}\n<br><br>\n{}\n</section>",
        tags.join("\n"),
        back_link("/", "Back home")
    );
    View::new("Tags", body)
}

pub fn tag(tag: &str, posts: &[&PostMeta]) -> View {
    let body = format!(
        "<section>\n<h1>Posts tagged with \"{tag}\" ({count})</h1>\n{cards}{back}\n</section>",
        tag = html_escape(tag),
        count = posts.len(),
        cards = cards(posts.iter().copied()),
        back = back_link("/", "Back home"),
    );
    View::new(format!("Tag: {}", tag), body)
}

pub fn search(query: &str, results: &[&PostMeta]) -> View {
    let messages = if !results.is_empty() {
        format!(
            "<h2>Search results on '{}'</h2>\n<p>Found {} results</p>\n",
            html_escape(query),
            results.len()
        )
    } else if !query.is_empty() {
        "<p>No results found</p>\n".to_string()
    } else {
        String::new()
    };

    let body = format!(
        concat!(
            "<form action=\"/search\" method=\"get\" style=\"text-align: center;\">",
            "<input name=\"q\" value=\"{query}\" id=\"search\" type=\"search\" autofocus>",
            "<button>Search</button></form>\n",
            "<section>\n{messages}{cards}{back}\n</section>"
        ),
        query = html_escape(query),
        messages = messages,
        cards = cards(results.iter().copied()),
        back = back_link("/", "Back home"),
    );
    View::new("Search", body)
}

pub fn not_found() -> View {
    View::new(
        "Not Found",
        "<h1>404 Not Found</h1>\n<p>The page you are looking for does not exist.</p>",
    )
}

pub fn server_error() -> View {
    View::new(
        "Server Error",
        "<h1>500 Server Error</h1>\n<p>Something went wrong while building this page.</p>",
    )
}
