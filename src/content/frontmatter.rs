//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Line that opens and closes the YAML block
pub const DELIMITER: &str = "---";

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> std::result::Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<serde_yaml::Value>()? {
                match item {
                    serde_yaml::Value::String(s) => vec.push(s),
                    serde_yaml::Value::Number(n) => vec.push(n.to_string()),
                    serde_yaml::Value::Bool(b) => vec.push(b.to_string()),
                    serde_yaml::Value::Null => {}
                    other => {
                        return Err(de::Error::invalid_type(
                            de::Unexpected::Other(&format!("{:?}", other)),
                            &"a scalar tag",
                        ))
                    }
                }
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter data from a post or page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub tags: Vec<String>,
    pub popular: bool,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// Result of looking for a delimited block at the top of a document
#[derive(Debug, PartialEq)]
enum Split<'a> {
    /// No opening delimiter, the whole document is body
    Bare(&'a str),
    Block { yaml: &'a str, body: &'a str },
    Unclosed,
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

fn split(content: &str) -> Split<'_> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut offset = 0;
    let mut lines = content.split_inclusive('\n');
    let mut opened = false;

    for line in lines.by_ref() {
        offset += line.len();
        if line.trim().is_empty() {
            continue;
        }
        opened = is_delimiter(line);
        break;
    }

    if !opened {
        return Split::Bare(content);
    }

    let yaml_start = offset;
    for line in lines {
        let line_start = offset;
        offset += line.len();
        if is_delimiter(line) {
            return Split::Block {
                yaml: &content[yaml_start..line_start],
                body: &content[offset..],
            };
        }
    }

    Split::Unclosed
}

impl FrontMatter {
    /// Parse front-matter from a document read from `path`.
    /// Returns (front_matter, body)
    pub fn parse<'a>(content: &'a str, path: &Path) -> Result<(Self, &'a str)> {
        match split(content) {
            Split::Bare(body) => Ok((FrontMatter::default(), body)),
            Split::Unclosed => Err(Error::UnclosedFrontMatter(path.to_path_buf())),
            Split::Block { yaml, body } => {
                let body = body.trim_start_matches(['\n', '\r']);
                if yaml.trim().is_empty() {
                    return Ok((FrontMatter::default(), body));
                }
                let fm = serde_yaml::from_str::<FrontMatter>(yaml).map_err(|source| {
                    Error::FrontMatter {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                Ok((fm, body))
            }
        }
    }

    /// Parse the date string. A missing date is `None`; a present but
    /// unreadable one is an error.
    pub fn parse_date(&self, path: &Path) -> Result<Option<NaiveDateTime>> {
        match self.date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_date_string(value)
                .map(Some)
                .ok_or_else(|| Error::InvalidDate {
                    path: path.to_path_buf(),
                    value: value.to_string(),
                }),
        }
    }

    /// Tags with surrounding whitespace removed; blank tags dropped
    pub fn clean_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Parse a date string in various formats
pub fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    // Offsets are normalized to UTC
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("posts/test.md")
    }

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
description: A first post
popular: true
tags:
  - rust
  - python
---

This is the content.
"#;

        let (fm, body) = FrontMatter::parse(content, path()).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello World"));
        assert_eq!(fm.description.as_deref(), Some("A first post"));
        assert_eq!(fm.tags, vec!["rust", "python"]);
        assert!(fm.popular);
        assert_eq!(body, "This is the content.\n");
    }

    #[test]
    fn test_body_keeps_later_separators() {
        let content = "---\ntitle: Rules\n---\nabove\n\n---\n\nbelow\n";
        let (fm, body) = FrontMatter::parse(content, path()).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Rules"));
        assert_eq!(body, "above\n\n---\n\nbelow\n");
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just markdown\n\nNo metadata here.";
        let (fm, body) = FrontMatter::parse(content, path()).unwrap();
        assert!(fm.title.is_none());
        assert!(fm.tags.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_crlf_and_bom() {
        let content = "\u{feff}---\r\ntitle: Windows\r\n---\r\nBody\r\n";
        let (fm, body) = FrontMatter::parse(content, path()).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Windows"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = FrontMatter::parse("---\n---\nBody", path()).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_unclosed_block_is_error() {
        let err = FrontMatter::parse("---\ntitle: Oops\n\nBody", path()).unwrap_err();
        assert!(matches!(err, Error::UnclosedFrontMatter(_)));
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let err = FrontMatter::parse("---\ntitle: [unclosed\n---\nBody", path()).unwrap_err();
        assert!(matches!(err, Error::FrontMatter { .. }));

        let err = FrontMatter::parse("---\njust a sentence\n---\nBody", path()).unwrap_err();
        assert!(matches!(err, Error::FrontMatter { .. }));
    }

    #[test]
    fn test_parse_single_string_tags() {
        let content = "---\ntitle: One Tag\ntags: Notes\n---\nContent";
        let (fm, _) = FrontMatter::parse(content, path()).unwrap();
        assert_eq!(fm.tags, vec!["Notes"]);
    }

    #[test]
    fn test_numeric_tags() {
        let (fm, _) = FrontMatter::parse("---\ntags: 2024\n---\nBody", path()).unwrap();
        assert_eq!(fm.tags, vec!["2024"]);

        let content = "---\ntags: [python, 3, 2.5]\n---\nBody";
        let (fm, _) = FrontMatter::parse(content, path()).unwrap();
        assert_eq!(fm.tags, vec!["python", "3", "2.5"]);

        let nested = FrontMatter::parse("---\ntags: [[a, b]]\n---\nBody", path());
        assert!(matches!(nested, Err(Error::FrontMatter { .. })));
    }

    #[test]
    fn test_clean_tags() {
        let fm = FrontMatter {
            tags: vec![" rust ".to_string(), "".to_string(), "   ".to_string()],
            ..Default::default()
        };
        assert_eq!(fm.clean_tags(), vec!["rust"]);
    }

    #[test]
    fn test_parse_date() {
        let fm = FrontMatter {
            date: Some("2024-01-15 10:30:00".to_string()),
            ..Default::default()
        };
        let dt = fm.parse_date(path()).unwrap().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 10:30");

        let fm = FrontMatter::default();
        assert!(fm.parse_date(path()).unwrap().is_none());

        let fm = FrontMatter {
            date: Some("sometime last spring".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            fm.parse_date(path()),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_parse_date_formats() {
        let day = |s: &str| parse_date_string(s).map(|d| d.format("%Y-%m-%d").to_string());
        assert_eq!(day("2024-06-01"), Some("2024-06-01".to_string()));
        assert_eq!(day("2024/06/01"), Some("2024-06-01".to_string()));
        assert_eq!(day("2024-06-01T12:00:00.000"), Some("2024-06-01".to_string()));
        assert_eq!(day("2024-06-01T23:30:00-02:00"), Some("2024-06-02".to_string()));
        assert_eq!(day("June 1st"), None);
    }
}
