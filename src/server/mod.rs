//! HTTP server

pub mod routes;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::loader::validate_slug;
use crate::error::Error;
use crate::index::{self, TagIndex};
use crate::views::{self, View};
use crate::Site;
use routes::Route;

/// Server state: the read-only site context
#[derive(Clone)]
pub struct AppState {
    site: Arc<Site>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// What a route produced
enum Outcome {
    Page(View),
    Redirect(String),
    File {
        body: Vec<u8>,
        content_type: &'static str,
    },
}

/// Build the application router
pub fn router(site: Arc<Site>) -> Router {
    let public = ServeDir::new(&site.public_dir);

    Router::new()
        .nest_service("/public", public)
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { site })
}

/// Start the server and run until Ctrl+C
pub async fn start(site: Site, ip: &str, port: u16) -> Result<()> {
    let app = router(Arc::new(site));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running at http://{}:{}", ip, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Resolve the path against the routing table and run its handler
async fn dispatch(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
        )
            .into_response();
    }

    let site = state.site;
    let Some(route) = routes::resolve(uri.path()) else {
        tracing::debug!("No route for {}", uri.path());
        return not_found(&site);
    };
    tracing::debug!("Resolved {} to {:?}", uri.path(), route);

    let query = Query::<SearchParams>::try_from_uri(&uri)
        .map(|Query(params)| params.q)
        .unwrap_or_default();

    match handle(Arc::clone(&site), route, query).await {
        Ok(Outcome::Page(view)) => Html(view.into_html(&site.config)).into_response(),
        Ok(Outcome::Redirect(url)) => Redirect::temporary(&url).into_response(),
        Ok(Outcome::File { body, content_type }) => {
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) if e.is_not_found() => {
            tracing::debug!("{}", e);
            not_found(&site)
        }
        Err(e) => {
            tracing::error!("Failed to serve {}: {}", uri.path(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(views::server_error().into_html(&site.config)),
            )
                .into_response()
        }
    }
}

fn not_found(site: &Site) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(views::not_found().into_html(&site.config)),
    )
        .into_response()
}

/// Run synchronous content work off the async executor
async fn blocking<T, F>(site: Arc<Site>, work: F) -> Result<T, Error>
where
    F: FnOnce(&Site) -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || work(site.as_ref()))
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}

async fn handle(site: Arc<Site>, route: Route, query: String) -> Result<Outcome, Error> {
    match route {
        Route::Home => blocking(site, |site| {
            let posts = site.loader().list_posts()?;
            let popular = index::popular(&posts);
            Ok(Outcome::Page(views::home(&site.config, &posts, &popular)))
        })
        .await,

        Route::Posts => blocking(site, |site| {
            let posts = site.loader().list_posts()?;
            let today = Local::now().date_naive();
            Ok(Outcome::Page(views::posts(&site.config, &posts, today)))
        })
        .await,

        Route::Post(slug) => blocking(site, move |site| {
            let post = site.loader().load_post(&slug)?;
            Ok(Outcome::Page(views::post(&post)))
        })
        .await,

        Route::Tags => blocking(site, |site| {
            let posts = site.loader().list_posts()?;
            Ok(Outcome::Page(views::tags(&TagIndex::build(&posts))))
        })
        .await,

        Route::Tag(tag) => blocking(site, move |site| {
            let posts = site.loader().list_posts()?;
            let tagged = index::posts_tagged(&posts, &tag);
            Ok(Outcome::Page(views::tag(&tag, &tagged)))
        })
        .await,

        Route::Search => blocking(site, move |site| {
            let posts = site.loader().list_posts()?;
            let results = index::search(&posts, &query);
            Ok(Outcome::Page(views::search(&query, &results)))
        })
        .await,

        Route::Feed { name, ext } => serve_feed(&site, &name, &ext).await,

        Route::LegacyHtml(slug) => site
            .redirects
            .lookup(&slug)
            .map(|url| Outcome::Redirect(url.to_string()))
            .ok_or_else(|| Error::not_found("redirect", slug)),

        Route::Page(slug) => markdown_page(site, slug).await,

        Route::NestedPage(first, second) => {
            markdown_page(site, format!("{}/{}", first, second)).await
        }
    }
}

/// Redirect when the slug is a legacy URL, otherwise render the page
async fn markdown_page(site: Arc<Site>, slug: String) -> Result<Outcome, Error> {
    if let Some(url) = site.redirects.lookup(&slug) {
        tracing::debug!("Redirecting {} to {}", slug, url);
        return Ok(Outcome::Redirect(url.to_string()));
    }

    blocking(site, move |site| {
        let page = site.loader().load_page(&slug)?;
        Ok(Outcome::Page(views::page(&page)))
    })
    .await
}

/// Pass a pre-built feed file through verbatim
async fn serve_feed(site: &Site, name: &str, ext: &str) -> Result<Outcome, Error> {
    let file_name = format!("{}.{}", name, ext);
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidSlug(file_name));
    }
    validate_slug(&file_name)?;

    let path = match contained_in(&site.feeds_dir, &site.feeds_dir.join(&file_name)).await {
        Ok(path) if path.is_file() => path,
        Ok(_) => return Err(Error::not_found("feed", file_name)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::not_found("feed", file_name))
        }
        Err(e) => return Err(e.into()),
    };

    let body = match tokio::fs::read(&path).await {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::not_found("feed", file_name))
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Outcome::File {
        body,
        content_type: feed_content_type(ext),
    })
}

/// Canonical `path`, or `NotFound` when it resolves outside `root`
async fn contained_in(root: &Path, path: &Path) -> std::io::Result<PathBuf> {
    let root = tokio::fs::canonicalize(root).await?;
    let path = tokio::fs::canonicalize(path).await?;
    if path.starts_with(&root) {
        Ok(path)
    } else {
        tracing::warn!("Refusing to serve {:?} from outside {:?}", path, root);
        Err(ErrorKind::NotFound.into())
    }
}

fn feed_content_type(ext: &str) -> &'static str {
    match ext {
        "xml" => "application/xml; charset=utf-8",
        "atom" => "application/atom+xml; charset=utf-8",
        "rss" => "application/rss+xml; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
