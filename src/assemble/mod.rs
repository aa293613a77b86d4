//! Pipeline driver: one aggregated HTML document in, one packaged book
//! out. Stages run in a fixed order so the fragment index sees the tree
//! exactly as the resolver will.

pub mod metadata;
pub mod styles;

use crate::book::index::build_index;
use crate::book::segment_chapters;
use crate::dom;
use crate::epub::{EpubBook, ManifestItem, NavPoint, SpineItem};
use crate::images::{ImageFetcher, ImageStore, media_type_for_extension};
use crate::render::render_chapter;
use crate::resolve::resolve_links;
use crate::sanitize::{assign_ids, strip_chrome};
use anyhow::Context;
use log::{info, warn};
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct ConvertOptions {
    /// metadata.yml overriding the built-in book metadata.
    pub metadata_path: Option<PathBuf>,
    /// Cover image embedded alongside a wrapper page.
    pub cover_path: Option<PathBuf>,
    /// When set, fetched images are also written to this directory.
    pub image_dir: Option<PathBuf>,
    /// Pinned dcterms:modified value, for reproducible output.
    pub modified: Option<String>,
}

/// One converted chapter, as reported to the caller.
pub struct ChapterSummary {
    pub original_id: String,
    pub clean_id: String,
    pub title: String,
}

pub struct ConvertReport {
    pub chapters: Vec<ChapterSummary>,
    pub images: usize,
}

/// Run the whole conversion over an HTML string and return the book plus
/// a summary of what went into it.
pub fn assemble_book<F: ImageFetcher>(
    html: &str,
    fetcher: F,
    options: &ConvertOptions,
) -> anyhow::Result<(EpubBook, ConvertReport)> {
    let document = dom::parse_html(html);
    let mut chapters = segment_chapters(&document);
    if chapters.is_empty() {
        warn!("no chapter blocks found in input; producing an empty book");
    }

    // Chrome comes out before the index is built so that removed elements
    // contribute no fragments or section titles.
    for chapter in &mut chapters {
        strip_chrome(chapter);
    }
    let (index, mut plans) = build_index(&mut chapters);

    let mut book = EpubBook::default();
    let mut metadata = metadata::read_metadata(options.metadata_path.as_deref())?.into_epub();
    metadata.modified = options.modified.clone();
    book.metadata = metadata;

    add_cover(&mut book, options.cover_path.as_deref())?;

    book.manifest.push(ManifestItem {
        id: "style".to_string(),
        href: "styles/style.css".to_string(),
        media_type: "text/css".to_string(),
        properties: None,
    });
    book.resources.insert(
        "styles/style.css".to_string(),
        styles::STYLE_CSS.as_bytes().to_vec(),
    );

    // The navigation document sits between the cover and the chapters.
    book.spine.push(SpineItem {
        idref: "toc".to_string(),
        linear: true,
    });

    let mut store = ImageStore::new(fetcher, options.image_dir.clone());
    let mut summaries = Vec::with_capacity(chapters.len());

    for (chapter, plan) in chapters.iter().zip(plans.iter_mut()) {
        assign_ids(chapter, plan);
        store.process_chapter(&chapter.content);
        resolve_links(chapter, &index, &mut plan.pool);

        let file_name = chapter.file_name();
        let xhtml = render_chapter(chapter);
        book.resources.insert(file_name.clone(), xhtml.into_bytes());
        book.manifest.push(ManifestItem {
            id: chapter.clean_id.clone(),
            href: file_name.clone(),
            media_type: "application/xhtml+xml".to_string(),
            properties: None,
        });
        book.spine.push(SpineItem {
            idref: chapter.clean_id.clone(),
            linear: true,
        });
        book.navigation.toc.push(NavPoint {
            label: chapter.toc_title(),
            href: file_name,
        });

        info!("converted {} as {}", chapter.original_id, chapter.clean_id);
        summaries.push(ChapterSummary {
            original_id: chapter.original_id.clone(),
            clean_id: chapter.clean_id.clone(),
            title: chapter.toc_title(),
        });
    }

    let records = store.into_records();
    for record in &records {
        let id = record
            .local_path
            .rsplit('/')
            .next()
            .unwrap_or(&record.local_path)
            .replace('.', "-");
        book.manifest.push(ManifestItem {
            id,
            href: record.local_path.clone(),
            media_type: record.media_type.clone(),
            properties: None,
        });
        book.resources
            .insert(record.local_path.clone(), record.bytes.clone());
    }

    let report = ConvertReport {
        chapters: summaries,
        images: records.len(),
    };
    Ok((book, report))
}

/// Convert an HTML file on disk straight to an EPUB file.
pub fn convert_file<F: ImageFetcher>(
    input: &Path,
    output: &Path,
    fetcher: F,
    options: &ConvertOptions,
) -> anyhow::Result<ConvertReport> {
    let html = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let (book, report) = assemble_book(&html, fetcher, options)?;
    crate::epub::writer::write_epub(&book, output)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(report)
}

/// Embed the cover image and its wrapper page. A missing file is skipped
/// with a warning; the book is still valid without a cover.
fn add_cover(book: &mut EpubBook, cover_path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = cover_path else {
        return Ok(());
    };
    if !path.exists() {
        warn!("cover image {} not found, skipping cover", path.display());
        return Ok(());
    }
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    book.resources
        .insert(format!("images/cover.{ext}"), bytes);
    book.manifest.push(ManifestItem {
        id: "cover-image".to_string(),
        href: format!("images/cover.{ext}"),
        media_type: media_type_for_extension(&ext).to_string(),
        properties: Some("cover-image".to_string()),
    });

    book.resources.insert(
        "cover.xhtml".to_string(),
        cover_page(&format!("images/cover.{ext}")).into_bytes(),
    );
    book.manifest.push(ManifestItem {
        id: "cover".to_string(),
        href: "cover.xhtml".to_string(),
        media_type: "application/xhtml+xml".to_string(),
        properties: None,
    });
    book.spine.push(SpineItem {
        idref: "cover".to_string(),
        linear: true,
    });
    Ok(())
}

fn cover_page(image_href: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE html>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n\
         <head>\n\
         <title>Cover</title>\n\
         <link rel=\"stylesheet\" type=\"text/css\" href=\"styles/style.css\" />\n\
         </head>\n\
         <body>\n\
         <div class=\"cover\">\n\
         <img src=\"{image_href}\" alt=\"Cover\" />\n\
         </div>\n\
         </body>\n\
         </html>\n"
    )
}
