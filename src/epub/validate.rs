//! Structural checks over a finished archive. This is not a full
//! conformance checker; it verifies the container layout this crate
//! promises to produce.

use crate::error::{BinderyError, Result};
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

static ROOTFILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"full-path="([^"]+)""#).unwrap());

/// Open an EPUB file and return the list of structural problems found.
/// An unreadable or non-zip file is an error; a readable archive with a
/// broken layout yields issues.
pub fn validate_epub(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut issues = Vec::new();

    if archive.is_empty() {
        return Ok(vec!["archive is empty".to_string()]);
    }

    {
        let mut first = archive.by_index(0)?;
        if first.name() != "mimetype" {
            issues.push(format!(
                "first entry is {:?}, expected mimetype",
                first.name()
            ));
        } else {
            if first.compression() != zip::CompressionMethod::Stored {
                issues.push("mimetype entry is compressed".to_string());
            }
            let mut content = String::new();
            if first.read_to_string(&mut content).is_err() || content != "application/epub+zip" {
                issues.push("mimetype content is not application/epub+zip".to_string());
            }
        }
    }

    let rootfile = match archive.by_name("META-INF/container.xml") {
        Ok(mut entry) => {
            let mut content = String::new();
            entry.read_to_string(&mut content).map_err(|_| {
                BinderyError::InvalidArchive(
                    "META-INF/container.xml is not valid UTF-8".to_string(),
                )
            })?;
            match ROOTFILE_RE.captures(&content) {
                Some(caps) => Some(caps[1].to_string()),
                None => {
                    issues.push("container.xml declares no rootfile".to_string());
                    None
                }
            }
        }
        Err(_) => {
            issues.push("missing META-INF/container.xml".to_string());
            None
        }
    };

    if let Some(rootfile) = rootfile {
        if archive.by_name(&rootfile).is_err() {
            issues.push(format!("rootfile {rootfile} not present in archive"));
        }
        // The navigation document lives next to the package document.
        let nav = match rootfile.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/toc.xhtml"),
            None => "toc.xhtml".to_string(),
        };
        if archive.by_name(&nav).is_err() {
            issues.push(format!("missing navigation document {nav}"));
        }
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::{EpubBook, EpubMetadata};
    use crate::epub::writer::write_epub;

    fn minimal_book() -> EpubBook {
        EpubBook {
            metadata: EpubMetadata {
                title: "T".to_string(),
                creator: "C".to_string(),
                language: "en".to_string(),
                modified: Some("2024-01-01T00:00:00Z".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn written_books_pass() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("book.epub");
        write_epub(&minimal_book(), &path).unwrap();
        let issues = validate_epub(&path).unwrap();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn non_zip_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("not.epub");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(validate_epub(&path).is_err());
    }

    #[test]
    fn plain_zip_reports_layout_issues() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plain.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("readme.txt", options).unwrap();
        std::io::Write::write_all(&mut zip, b"hello").unwrap();
        zip.finish().unwrap();

        let issues = validate_epub(&path).unwrap();
        assert!(issues.iter().any(|i| i.contains("expected mimetype")));
        assert!(issues.iter().any(|i| i.contains("container.xml")));
    }
}
