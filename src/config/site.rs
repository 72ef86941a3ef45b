//! Site configuration (_config.yml)

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,

    // Directory
    pub posts_dir: String,
    pub pages_dir: String,
    pub feeds_dir: String,
    pub public_dir: String,
    pub redirects_file: String,

    // Listing
    pub recent_posts: usize,
    pub writing_since: NaiveDate,

    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Daniel Roy Greenfeld".to_string(),
            description: "Daniel Roy Greenfeld's personal blog".to_string(),
            author: "Daniel Roy Greenfeld".to_string(),
            url: "https://daniel.feldroy.com".to_string(),

            posts_dir: "posts".to_string(),
            pages_dir: "pages".to_string(),
            feeds_dir: "feeds".to_string(),
            public_dir: "public".to_string(),
            redirects_file: "redirects.json".to_string(),

            recent_posts: 3,
            writing_since: NaiveDate::from_ymd_opt(2005, 9, 3).unwrap_or_default(),

            feed: FeedConfig::default(),
            highlight: HighlightConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Feed generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Maximum number of entries per feed
    pub limit: usize,
    /// Tags that get their own Atom feed
    pub tags: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            tags: Vec::new(),
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}
