pub mod ident;
pub mod index;

use crate::dom;
use kuchiki::NodeRef;
use regex::Regex;
use std::sync::LazyLock;

/// Chapter category, derived from the source identifier pattern
/// (`1.2-chapter-03`, `4.0-appendix-01`, `3.0-conclusion`, free-form
/// glossary/about markers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterKind {
    Numbered { number: u32 },
    Appendix { number: u32 },
    Conclusion,
    Glossary,
    About,
    Other,
}

static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+-chapter-(\d+)$").unwrap());
static APPENDIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+-appendix-(\d+)").unwrap());

impl ChapterKind {
    pub fn from_original_id(id: &str) -> Self {
        let lower = id.to_lowercase();
        if lower.contains("glossary") {
            return ChapterKind::Glossary;
        }
        if lower.contains("about") {
            return ChapterKind::About;
        }
        if lower.ends_with("-conclusion") || lower == "conclusion" {
            return ChapterKind::Conclusion;
        }
        if let Some(caps) = NUMBERED_RE.captures(&lower) {
            if let Ok(number) = caps[1].parse() {
                return ChapterKind::Numbered { number };
            }
        }
        if let Some(caps) = APPENDIX_RE.captures(&lower) {
            if let Ok(number) = caps[1].parse() {
                return ChapterKind::Appendix { number };
            }
        }
        ChapterKind::Other
    }

    /// Appendix, glossary, and about sections get slightly different
    /// treatment: site-root links inside them are dropped, and the
    /// sanitizer applies their structural fixups.
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            ChapterKind::Numbered { .. } | ChapterKind::Conclusion | ChapterKind::Other
        )
    }
}

/// One top-level content block of the aggregated input, destined to become
/// one output document. `content` is owned by the pipeline for a single
/// conversion run.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub original_id: String,
    /// Filled in by the fragment index builder before any mutation.
    pub clean_id: String,
    /// Explicit title extracted by the sanitizer, if the source had one.
    pub title: Option<String>,
    /// 1-based position in document order.
    pub ordinal: usize,
    pub kind: ChapterKind,
    pub content: NodeRef,
}

impl Chapter {
    /// Short label shown above the chapter title ("Chapter 3",
    /// "Appendix 1"). Sections without a natural number have none.
    pub fn display_label(&self) -> Option<String> {
        match &self.kind {
            ChapterKind::Numbered { number } => Some(format!("Chapter {number}")),
            ChapterKind::Appendix { number } => Some(format!("Appendix {number}")),
            _ => None,
        }
    }

    /// Title for the table of contents and document head. Falls back to a
    /// label derived from the identifier pattern when the source chapter
    /// had no title element.
    pub fn toc_title(&self) -> String {
        if let Some(title) = &self.title {
            if !title.is_empty() {
                return title.clone();
            }
        }
        match &self.kind {
            ChapterKind::Numbered { number } => format!("Chapter {number}"),
            ChapterKind::Appendix { number } => format!("Appendix {number}"),
            ChapterKind::Conclusion => "Conclusion".to_string(),
            ChapterKind::Glossary => "Glossary".to_string(),
            ChapterKind::About => "About".to_string(),
            ChapterKind::Other => format!("Chapter {}", self.ordinal),
        }
    }

    /// Packaged filename for this chapter.
    pub fn file_name(&self) -> String {
        format!("{}.xhtml", self.clean_id)
    }
}

/// Split the aggregated input tree into chapters, in document order.
///
/// A chapter is any element carrying class `chapter`. A missing id
/// degrades to a position-derived one rather than aborting.
pub fn segment_chapters(document: &NodeRef) -> Vec<Chapter> {
    dom::select_all(document, ".chapter")
        .into_iter()
        .enumerate()
        .map(|(idx, node)| {
            let ordinal = idx + 1;
            let original_id = dom::get_attr(&node, "id")
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("section-{ordinal:02}"));
            let kind = ChapterKind::from_original_id(&original_id);
            Chapter {
                original_id,
                clean_id: String::new(),
                title: None,
                ordinal,
                kind,
                content: node,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn kind_from_id_patterns() {
        assert_eq!(
            ChapterKind::from_original_id("1.2-chapter-03"),
            ChapterKind::Numbered { number: 3 }
        );
        assert_eq!(
            ChapterKind::from_original_id("4.0-appendix-01"),
            ChapterKind::Appendix { number: 1 }
        );
        assert_eq!(
            ChapterKind::from_original_id("3.0-conclusion"),
            ChapterKind::Conclusion
        );
        assert_eq!(ChapterKind::from_original_id("glossary"), ChapterKind::Glossary);
        assert_eq!(
            ChapterKind::from_original_id("about-the-author"),
            ChapterKind::About
        );
        assert_eq!(ChapterKind::from_original_id("misc"), ChapterKind::Other);
    }

    #[test]
    fn primary_vs_back_matter() {
        assert!(ChapterKind::from_original_id("1.1-chapter-01").is_primary());
        assert!(ChapterKind::from_original_id("3.0-conclusion").is_primary());
        assert!(!ChapterKind::from_original_id("4.0-appendix-01").is_primary());
        assert!(!ChapterKind::from_original_id("glossary").is_primary());
    }

    #[test]
    fn segment_in_document_order() {
        let doc = parse_html(
            "<body>\
             <div class='chapter' id='1.1-chapter-01'><p>a</p></div>\
             <div class='chapter' id='3.0-conclusion'><p>b</p></div>\
             </body>",
        );
        let chapters = segment_chapters(&doc);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].original_id, "1.1-chapter-01");
        assert_eq!(chapters[0].ordinal, 1);
        assert_eq!(chapters[1].kind, ChapterKind::Conclusion);
        assert_eq!(chapters[1].ordinal, 2);
    }

    #[test]
    fn segment_synthesizes_missing_ids() {
        let doc = parse_html("<div class='chapter'><p>anonymous</p></div>");
        let chapters = segment_chapters(&doc);
        assert_eq!(chapters[0].original_id, "section-01");
        assert_eq!(chapters[0].kind, ChapterKind::Other);
    }

    #[test]
    fn toc_title_fallbacks() {
        let doc = parse_html("<div class='chapter' id='4.1-appendix-02'></div>");
        let mut chapters = segment_chapters(&doc);
        assert_eq!(chapters[0].toc_title(), "Appendix 2");
        chapters[0].title = Some("Adjust to Your Size".to_string());
        assert_eq!(chapters[0].toc_title(), "Adjust to Your Size");
    }
}
