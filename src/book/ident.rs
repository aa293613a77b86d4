//! Identifier normalization for chapter filenames and fragment ids.

use std::collections::HashSet;

/// Lowercase a raw identifier or text, collapsing runs of non-alphanumeric
/// characters to a single `-` and trimming separators. Pure: the same input
/// always produces the same token.
pub fn normalize_token(raw: &str) -> String {
    slug::slugify(raw)
}

/// Normalize `raw` into a filesystem- and fragment-safe token
/// (`[A-Za-z0-9_-]+`). When the token does not start with an ASCII letter
/// it is prefixed with `<marker>-` so fragment identifiers can never be
/// confused with bare numeric chapter tokens.
pub fn clean_identifier(raw: &str, marker: &str) -> String {
    let token = normalize_token(raw);
    if token.is_empty() {
        return marker.to_string();
    }
    if token.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        token
    } else {
        format!("{marker}-{token}")
    }
}

/// Marker for chapter-level identifiers.
pub const CHAPTER_MARKER: &str = "chapter";
/// Marker for synthesized heading/paragraph fragment identifiers.
pub const HEADING_MARKER: &str = "heading";

/// Shared "already used" set enforcing uniqueness of assigned identifiers.
///
/// Collisions get a numeric suffix: `intro`, `intro-1`, `intro-2`, ...
/// The pool is plain single-owner state threaded through the pipeline
/// stages by parameter.
#[derive(Debug, Default)]
pub struct IdPool {
    used: HashSet<String>,
}

impl IdPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique id based on `base`, appending `-1`, `-2`, ... on
    /// collision.
    pub fn reserve(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
