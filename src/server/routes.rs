//! Routing table
//!
//! Paths are matched against an ordered list of patterns; the first match
//! wins, so more specific patterns come first.

use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

/// A resolved request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Posts,
    Post(String),
    Tags,
    Tag(String),
    Search,
    /// Pre-built feed file, `name` may contain `/`
    Feed { name: String, ext: String },
    /// `/{slug}.html`: only ever a redirect
    LegacyHtml(String),
    /// `/{slug}`: redirect, else a standalone page
    Page(String),
    /// `/{first}/{second}`: nested standalone page
    NestedPage(String, String),
}

type Build = fn(&Captures) -> Option<Route>;

lazy_static! {
    static ref ROUTES: Vec<(Regex, Build)> = {
        let table: [(&str, Build); 10] = [
            (r"^/$", |_| Some(Route::Home)),
            (r"^/posts$", |_| Some(Route::Posts)),
            (r"^/posts/(?P<slug>.+)$", |c| Some(Route::Post(param(c, "slug")?))),
            (r"^/tags$", |_| Some(Route::Tags)),
            (r"^/tags/(?P<tag>[^/]+)$", |c| Some(Route::Tag(param(c, "tag")?))),
            (r"^/search$", |_| Some(Route::Search)),
            (r"^/feeds/(?P<name>.+)\.(?P<ext>[^/.]+)$", |c| {
                Some(Route::Feed {
                    name: param(c, "name")?,
                    ext: param(c, "ext")?,
                })
            }),
            (r"^/(?P<slug>[^/]+)\.html$", |c| {
                Some(Route::LegacyHtml(param(c, "slug")?))
            }),
            (r"^/(?P<slug>[^/]+)$", |c| Some(Route::Page(param(c, "slug")?))),
            (r"^/(?P<first>[^/]+)/(?P<second>[^/]+)$", |c| {
                Some(Route::NestedPage(param(c, "first")?, param(c, "second")?))
            }),
        ];

        table
            .into_iter()
            .map(|(pattern, build)| {
                (
                    Regex::new(pattern).expect("route patterns are valid regexes"),
                    build,
                )
            })
            .collect()
    };
}

/// Percent-decoded capture; `None` when it is not valid UTF-8
fn param(captures: &Captures, name: &str) -> Option<String> {
    let raw = captures.name(name)?.as_str();
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Resolve a request path to a route
pub fn resolve(path: &str) -> Option<Route> {
    ROUTES.iter().find_map(|(pattern, build)| {
        let captures = pattern.captures(path)?;
        build(&captures)
    })
}
