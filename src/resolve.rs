//! Anchor rewriting against the global index, with a tiered fallback
//! search for fragments nothing else can place. Runs per chapter, after
//! sanitization, once the index covers every chapter. Resolution never
//! fails: the worst case is a same-document self-link.

use crate::book::ident::{HEADING_MARKER, IdPool, clean_identifier};
use crate::book::index::{BookIndex, HEADING_SELECTOR, normalized_fragment_id};
use crate::book::Chapter;
use crate::dom;
use crate::util::{alnum_only, first_words, normalize_text};
use kuchiki::NodeRef;
use log::debug;

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "section", "div", "article",
];
const SECTION_TAGS: &[&str] = &["section", "div", "article"];

/// What to do with one anchor.
#[derive(Debug, PartialEq, Eq)]
enum Rewrite {
    Href(String),
    /// Drop the link, keep its visible text.
    Unwrap,
    Keep,
}

/// Rewrite every anchor in the chapter. `pool` is the chapter's id pool,
/// carried over from sanitization so synthesized link targets stay unique.
pub fn resolve_links(chapter: &Chapter, index: &BookIndex, pool: &mut IdPool) {
    for anchor in dom::select_all(&chapter.content, "a[href]") {
        let Some(href) = dom::get_attr(&anchor, "href") else {
            continue;
        };
        match resolve_anchor(&anchor, &href, chapter, index, pool) {
            Rewrite::Href(new_href) => {
                if new_href != href {
                    debug!("{}: {href} -> {new_href}", chapter.clean_id);
                }
                dom::set_attr(&anchor, "href", &new_href);
            }
            Rewrite::Unwrap => dom::unwrap_element(&anchor),
            Rewrite::Keep => {}
        }
    }
}

fn resolve_anchor(
    anchor: &NodeRef,
    href: &str,
    chapter: &Chapter,
    index: &BookIndex,
    pool: &mut IdPool,
) -> Rewrite {
    // Rule 1: the href names a source chapter, possibly with a path prefix.
    if let Some(target) = match_chapter_reference(href, index) {
        return Rewrite::Href(target);
    }

    // Anything with an external scheme and no chapter reference is not
    // ours to rewrite.
    if is_external(href) {
        return Rewrite::Keep;
    }

    // Site-root navigation. Back-matter sections have no valid target for
    // it in the package, so the link is dropped but its text kept; in
    // primary chapters it points at the first chapter, as on the site.
    if href == "/" {
        if chapter.kind.is_primary() {
            if let Some((_, clean)) = index.chapters().first() {
                return Rewrite::Href(format!("{clean}.xhtml"));
            }
        }
        return Rewrite::Unwrap;
    }

    // Rule 2: the anchor's visible text names a section; the link means
    // "go to that section's chapter".
    let anchor_text = anchor.text_contents();
    if !normalize_text(&anchor_text).is_empty() {
        if let Some(owner) = index.section_chapter(&anchor_text) {
            return Rewrite::Href(format!("{owner}.xhtml"));
        }
    }

    // A malformed `#a#b` refers to the last fragment only.
    let Some(fragment) = last_fragment(href) else {
        return Rewrite::Keep;
    };

    // Rule 3: the fragment is known to the index.
    if let Some(record) = index.fragment(fragment) {
        if record.chapter == chapter.clean_id {
            return Rewrite::Href(format!("#{}", record.target_id));
        }
        return Rewrite::Href(format!("{}.xhtml#{}", record.chapter, record.target_id));
    }

    // Rules 4 and 5: the fragment is unknown; find a home for it in the
    // current chapter.
    let id = find_fuzzy_target(anchor, fragment, chapter, pool)
        .unwrap_or_else(|| anchor_self_target(anchor, fragment, pool));
    Rewrite::Href(format!("#{id}"))
}

fn is_external(href: &str) -> bool {
    href.starts_with("http://")
        || href.starts_with("https://")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
}

/// Fragment part of an href; for `#a#b` only the last fragment counts.
fn last_fragment(href: &str) -> Option<&str> {
    if !href.contains('#') {
        return None;
    }
    href.rsplit('#').next().filter(|f| !f.is_empty())
}

/// Rule 1: match the href against the known source chapter ids. The id may
/// appear as the last path segment (`/shapeup/1.2-chapter-02`) or as the
/// fragment itself (`#1.2-chapter-02`).
fn match_chapter_reference(href: &str, index: &BookIndex) -> Option<String> {
    let no_query = href.split('?').next().unwrap_or(href);
    let (base, fragment) = match no_query.split_once('#') {
        Some((base, rest)) => (base, rest.rsplit('#').next().filter(|f| !f.is_empty())),
        None => (no_query, None),
    };
    let last_segment = base.trim_end_matches('/').rsplit('/').next().unwrap_or("");

    for (original, clean) in index.chapters() {
        if fragment == Some(original.as_str()) {
            // `#1.2-chapter-02` is a chapter reference, not a fragment.
            return Some(format!("{clean}.xhtml"));
        }
        if last_segment == original {
            return Some(match fragment {
                Some(frag) => {
                    let target = index
                        .fragment(frag)
                        .map(|rec| rec.target_id.clone())
                        .unwrap_or_else(|| normalized_fragment_id(frag));
                    format!("{clean}.xhtml#{target}")
                }
                None => format!("{clean}.xhtml"),
            });
        }
    }
    None
}

/// Rule 4: tiered search over the chapter's text nodes, then rule 5 over
/// the enclosing section. Returns the id of the element the link should
/// point at, synthesizing and assigning one where needed.
fn find_fuzzy_target(
    anchor: &NodeRef,
    fragment: &str,
    chapter: &Chapter,
    pool: &mut IdPool,
) -> Option<String> {
    let needle = normalize_text(fragment);
    let candidates = text_candidates(&chapter.content);

    // Ordered matcher tiers; the first tier with a hit wins, and within a
    // tier the first node in document order wins.
    let tiers: [&dyn Fn(&str) -> bool; 4] = [
        &|text: &str| !needle.is_empty() && normalize_text(text) == needle,
        &|text: &str| !needle.is_empty() && normalize_text(text).contains(&needle),
        &|text: &str| {
            let lead = first_words(fragment, 5);
            !lead.is_empty() && first_words(text, 5) == lead
        },
        &|text: &str| {
            let stripped = alnum_only(fragment);
            !stripped.is_empty() && alnum_only(text) == stripped
        },
    ];

    for tier in tiers {
        if let Some((node, _)) = candidates.iter().find(|(_, text)| tier(text)) {
            return Some(attach_target(node, fragment, &chapter.content, pool));
        }
    }

    // Rule 5: fall back to the enclosing section's headings, then its
    // paragraphs.
    let section = dom::nearest_ancestor_within(anchor, &chapter.content, SECTION_TAGS)
        .unwrap_or_else(|| chapter.content.clone());

    for heading in dom::select_all(&section, HEADING_SELECTOR) {
        let text = normalize_text(&heading.text_contents());
        if !text.is_empty()
            && !needle.is_empty()
            && (text.contains(&needle) || needle.contains(&text))
        {
            return Some(ensure_id(&heading, fragment, pool));
        }
    }

    let paragraph = dom::nearest_ancestor_within(anchor, &chapter.content, &["p"])
        .or_else(|| dom::select_one(&section, "p"));
    paragraph.map(|p| ensure_id(&p, fragment, pool))
}

/// Absolute last resort: the anchor links to itself.
fn anchor_self_target(anchor: &NodeRef, fragment: &str, pool: &mut IdPool) -> String {
    ensure_id(anchor, fragment, pool)
}

/// Text nodes of the chapter in document order, excluding whitespace-only
/// nodes and anything inside an anchor.
fn text_candidates(content: &NodeRef) -> Vec<(NodeRef, String)> {
    content
        .descendants()
        .filter_map(|node| {
            let text = node.as_text()?.borrow().clone();
            if text.trim().is_empty() || dom::has_ancestor_tag(&node, "a") {
                return None;
            }
            Some((node.clone(), text))
        })
        .collect()
}

/// Point a link at `node`: walk up to the nearest block-level ancestor and
/// reuse or assign its id. A bare text node with no block ancestor gets
/// wrapped in a span carrying the id.
fn attach_target(
    node: &NodeRef,
    fragment: &str,
    chapter_root: &NodeRef,
    pool: &mut IdPool,
) -> String {
    let block = if node.as_element().is_some() {
        Some(node.clone())
    } else {
        dom::nearest_ancestor_within(node, chapter_root, BLOCK_TAGS)
    };

    match block {
        Some(block) => ensure_id(&block, fragment, pool),
        None => {
            let id = pool.reserve(&clean_identifier(fragment, HEADING_MARKER));
            let span = dom::new_element("span", &[("id", &id)]);
            node.insert_before(span.clone());
            span.append(node.clone());
            id
        }
    }
}

fn ensure_id(node: &NodeRef, fragment: &str, pool: &mut IdPool) -> String {
    if let Some(id) = dom::get_attr(node, "id") {
        return id;
    }
    let id = pool.reserve(&clean_identifier(fragment, HEADING_MARKER));
    dom::set_attr(node, "id", &id);
    id
}
