pub mod validate;
pub mod writer;

use std::collections::BTreeMap;

/// A fully assembled book, ready for packaging.
#[derive(Debug, Default)]
pub struct EpubBook {
    pub metadata: EpubMetadata,
    pub manifest: Vec<ManifestItem>,
    pub spine: Vec<SpineItem>,
    pub navigation: Navigation,
    /// Content documents and binary assets, keyed by package-relative path.
    /// BTreeMap keeps archive entry order stable across runs.
    pub resources: BTreeMap<String, Vec<u8>>,
}

/// Dublin Core metadata for a single-volume book.
#[derive(Debug, Default, Clone)]
pub struct EpubMetadata {
    pub title: String,
    pub creator: String,
    pub publisher: Option<String>,
    pub language: String,
    pub identifier: Option<String>,
    pub description: Option<String>,
    /// dcterms:modified override. When unset the writer stamps the
    /// current UTC time.
    pub modified: Option<String>,
}

/// An item in the package manifest.
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

/// A spine reference, in reading order.
#[derive(Debug, Clone)]
pub struct SpineItem {
    pub idref: String,
    pub linear: bool,
}

#[derive(Debug, Default)]
pub struct Navigation {
    pub toc: Vec<NavPoint>,
}

/// One entry in the table of contents.
#[derive(Debug, Clone)]
pub struct NavPoint {
    pub label: String,
    pub href: String,
}
