//! Global lookup tables built in a single forward pass over all chapters,
//! before any chapter mutates its own ids. Link resolution for chapter N
//! may need to know where a fragment in chapter M lives, so the index must
//! be complete before the first resolver invocation.

use crate::book::Chapter;
use crate::book::ident::{CHAPTER_MARKER, HEADING_MARKER, IdPool, clean_identifier};
use crate::dom;
use crate::util::normalize_text;
use kuchiki::NodeRef;
use std::collections::HashMap;

pub const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// One identified anchor target and the chapter that will contain it.
#[derive(Debug, Clone)]
pub struct FragmentRecord {
    /// Clean id of the owning chapter.
    pub chapter: String,
    /// The id that will exist on the element in the emitted output
    /// (existing ids are re-normalized during sanitization).
    pub target_id: String,
}

#[derive(Debug, Default)]
pub struct BookIndex {
    /// Original chapter id -> clean chapter id, in document order.
    chapter_ids: Vec<(String, String)>,
    /// Fragment id (raw and normalized spellings) -> owning record.
    fragments: HashMap<String, FragmentRecord>,
    /// Normalized heading text -> clean id of the owning chapter.
    /// Duplicate titles resolve to the last chapter seen; this tie-break is
    /// deliberate and documented, not an accident.
    section_titles: HashMap<String, String>,
}

impl BookIndex {
    /// All `(original, clean)` chapter id pairs in document order.
    pub fn chapters(&self) -> &[(String, String)] {
        &self.chapter_ids
    }

    /// Look a fragment up under its raw spelling, then its normalized one.
    pub fn fragment(&self, id: &str) -> Option<&FragmentRecord> {
        self.fragments
            .get(id)
            .or_else(|| self.fragments.get(&normalized_fragment_id(id)))
    }

    pub fn section_chapter(&self, heading_text: &str) -> Option<&str> {
        self.section_titles
            .get(&normalize_text(heading_text))
            .map(String::as_str)
    }

    fn record_fragment(&mut self, key: String, record: FragmentRecord) {
        // First definition in document order wins.
        self.fragments.entry(key).or_insert(record);
    }
}

/// Normalized spelling of an explicit fragment id, shared by the index
/// builder and the sanitizer so the two always agree.
pub fn normalized_fragment_id(raw: &str) -> String {
    clean_identifier(raw, HEADING_MARKER)
}

/// Deterministic per-chapter id assignments, computed once here and applied
/// verbatim by the sanitizer. Keeping the plan as data removes any chance
/// of the two passes diverging.
#[derive(Debug, Default)]
pub struct ChapterIdPlan {
    /// Uniqueness set, pre-loaded with every id below; the sanitizer keeps
    /// drawing from it for paragraph ids and the resolver for synthesized
    /// link targets.
    pub pool: IdPool,
    /// Elements carrying an explicit id: `(node, raw id, unique normalized id)`.
    pub renames: Vec<(NodeRef, String, String)>,
    /// Headings lacking an id: `(node, synthesized id)`.
    pub heading_ids: Vec<(NodeRef, String)>,
}

/// Plan id renames and heading id synthesis for one chapter, in document
/// order. Pure given the chapter subtree.
pub fn plan_chapter_ids(content: &NodeRef) -> ChapterIdPlan {
    let mut plan = ChapterIdPlan::default();

    // The chapter container itself is excluded: its id is the chapter id,
    // which the renderer replaces with the clean id.
    for node in content.descendants() {
        if node.as_element().is_none() {
            continue;
        }
        if let Some(raw) = dom::get_attr(&node, "id").filter(|id| !id.trim().is_empty()) {
            let unique = plan.pool.reserve(&normalized_fragment_id(&raw));
            plan.renames.push((node.clone(), raw, unique));
        }
    }

    for heading in dom::select_all(content, HEADING_SELECTOR) {
        if dom::get_attr(&heading, "id").is_some() {
            continue;
        }
        let base = clean_identifier(&heading.text_contents(), HEADING_MARKER);
        let id = plan.pool.reserve(&base);
        plan.heading_ids.push((heading, id));
    }

    plan
}

/// Build the global index: clean chapter ids, the fragment table, and the
/// section-title table. Returns one `ChapterIdPlan` per chapter, parallel
/// to the input slice.
///
/// Must run after chrome stripping (so removed elements contribute no
/// fragments) and before any id is written onto an element.
pub fn build_index(chapters: &mut [Chapter]) -> (BookIndex, Vec<ChapterIdPlan>) {
    let mut index = BookIndex::default();
    let mut plans = Vec::with_capacity(chapters.len());
    let mut chapter_pool = IdPool::new();

    for chapter in chapters.iter_mut() {
        let clean = chapter_pool.reserve(&clean_identifier(&chapter.original_id, CHAPTER_MARKER));
        chapter.clean_id = clean;
    }

    for chapter in chapters.iter() {
        let plan = plan_chapter_ids(&chapter.content);

        for (_, raw, unique) in &plan.renames {
            let record = FragmentRecord {
                chapter: chapter.clean_id.clone(),
                target_id: unique.clone(),
            };
            index.record_fragment(raw.clone(), record.clone());
            index.record_fragment(unique.clone(), record);
        }
        for (_, id) in &plan.heading_ids {
            let record = FragmentRecord {
                chapter: chapter.clean_id.clone(),
                target_id: id.clone(),
            };
            index.record_fragment(id.clone(), record);
        }

        if let Some(title) = &chapter.title {
            let key = normalize_text(title);
            if !key.is_empty() {
                index
                    .section_titles
                    .insert(key, chapter.clean_id.clone());
            }
        }
        for heading in dom::select_all(&chapter.content, HEADING_SELECTOR) {
            let key = normalize_text(&heading.text_contents());
            if !key.is_empty() {
                index
                    .section_titles
                    .insert(key, chapter.clean_id.clone());
            }
        }

        plans.push(plan);
    }

    (index, plans)
}
