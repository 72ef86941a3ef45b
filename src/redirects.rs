//! Legacy URL redirects
//!
//! Old slugs from previous blog migrations still appear in books and slides.
//! They map to their new locations through a JSON object loaded once at startup.

use axum::http::HeaderValue;
use indexmap::IndexMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

/// Immutable old-slug → URL table
#[derive(Debug, Clone, Default)]
pub struct RedirectTable {
    entries: IndexMap<String, String>,
}

impl RedirectTable {
    /// Load the table from a JSON file. A missing file gives an empty table.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No redirects file at {:?}, starting with none", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let entries: IndexMap<String, String> =
            serde_json::from_str(&content).map_err(|source| Error::Redirects {
                path: path.to_path_buf(),
                source,
            })?;

        // Targets end up in a Location header
        if let Some((slug, target)) = entries
            .iter()
            .find(|(_, target)| HeaderValue::from_str(target).is_err())
        {
            return Err(Error::InvalidRedirect {
                path: path.to_path_buf(),
                slug: slug.clone(),
                target: target.clone(),
            });
        }

        tracing::info!("Loaded {} redirects from {:?}", entries.len(), path);
        Ok(Self { entries })
    }

    /// Resolve a slug: exact match first, then `{slug}.html`
    pub fn lookup(&self, slug: &str) -> Option<&str> {
        self.entries
            .get(slug)
            .or_else(|| self.entries.get(&format!("{}.html", slug)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for RedirectTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
