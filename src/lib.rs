//! feldroy-site: a personal markdown blog server
//!
//! Posts and pages are markdown files with YAML front-matter. Every request
//! reads them from disk again; the only state held for the life of the
//! process is the configuration and the legacy redirect table.

pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod index;
pub mod redirects;
pub mod server;
pub mod views;

use anyhow::Result;
use std::path::{Path, PathBuf};

use content::MarkdownRenderer;
use redirects::RedirectTable;

/// Read-only site context shared by every request
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown posts
    pub posts_dir: PathBuf,
    /// Standalone markdown pages
    pub pages_dir: PathBuf,
    /// Pre-built feed files
    pub feeds_dir: PathBuf,
    /// Static assets
    pub public_dir: PathBuf,
    /// Legacy redirects, loaded once
    pub redirects: RedirectTable,
    /// Markdown renderer (syntax definitions are loaded once)
    pub renderer: MarkdownRenderer,
}

impl Site {
    /// Create a site from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Self::with_config(base_dir, config)
    }

    /// Create a site from a directory and an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let redirects = RedirectTable::load(base_dir.join(&config.redirects_file))?;
        let renderer = MarkdownRenderer::with_options(&config.highlight);

        Ok(Self {
            posts_dir: base_dir.join(&config.posts_dir),
            pages_dir: base_dir.join(&config.pages_dir),
            feeds_dir: base_dir.join(&config.feeds_dir),
            public_dir: base_dir.join(&config.public_dir),
            base_dir,
            config,
            redirects,
            renderer,
        })
    }

    /// Loader bound to this site's content directories
    pub fn loader(&self) -> content::loader::ContentLoader<'_> {
        content::loader::ContentLoader::new(self)
    }
}
