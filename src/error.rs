//! Error types shared by the content pipeline and the HTTP layer

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} not found: {slug}")]
    NotFound { kind: &'static str, slug: String },

    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("Failed to parse front-matter in {path:?}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unclosed front-matter block in {0:?}")]
    UnclosedFrontMatter(PathBuf),

    #[error("Invalid date {value:?} in {path:?}")]
    InvalidDate { path: PathBuf, value: String },

    #[error("Failed to load redirects from {path:?}: {source}")]
    Redirects {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Redirect for {slug:?} in {path:?} has an invalid target {target:?}")]
    InvalidRedirect {
        path: PathBuf,
        slug: String,
        target: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl Error {
    pub fn not_found(kind: &'static str, slug: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            slug: slug.into(),
        }
    }

    /// Whether this error should surface as a 404 page
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidSlug(_))
    }
}
