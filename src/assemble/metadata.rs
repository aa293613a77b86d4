//! Book-level metadata. Defaults describe the source publication; any
//! field can be overridden from a metadata.yml file.

use crate::epub::EpubMetadata;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookMetadata {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_creator")]
    pub creator: String,
    #[serde(default = "default_publisher")]
    pub publisher: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_identifier")]
    pub identifier: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_title() -> String {
    "Shape Up: Stop Running in Circles and Ship Work that Matters".to_string()
}

fn default_creator() -> String {
    "Ryan Singer".to_string()
}

fn default_publisher() -> String {
    "Basecamp".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_identifier() -> String {
    "https://basecamp.com/shapeup".to_string()
}

impl Default for BookMetadata {
    fn default() -> Self {
        Self {
            title: default_title(),
            creator: default_creator(),
            publisher: default_publisher(),
            language: default_language(),
            identifier: default_identifier(),
            description: None,
        }
    }
}

impl BookMetadata {
    pub fn into_epub(self) -> EpubMetadata {
        EpubMetadata {
            title: self.title,
            creator: self.creator,
            publisher: Some(self.publisher),
            language: self.language,
            identifier: Some(self.identifier),
            description: self.description,
            modified: None,
        }
    }
}

/// Read metadata.yml, or fall back to the defaults when no path is given.
pub fn read_metadata(path: Option<&Path>) -> anyhow::Result<BookMetadata> {
    let Some(path) = path else {
        return Ok(BookMetadata::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let meta: BookMetadata = serde_yaml_ng::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(meta)
}
