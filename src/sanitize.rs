//! Per-chapter cleanup: chrome removal, title extraction, and id
//! assignment. Runs in two phases around the index build: chrome is
//! stripped first so removed elements contribute no fragments, ids are
//! written afterwards from the plan the index builder computed.

use crate::book::index::ChapterIdPlan;
use crate::book::{Chapter, ChapterKind};
use crate::book::ident::{HEADING_MARKER, clean_identifier};
use crate::dom;
use crate::util::first_words;
use kuchiki::NodeRef;

/// Site chrome that has no place in a packaged book. The bare tag names
/// and class selectors come straight from the source site's markup.
const CHROME_SELECTOR: &str =
    "nav, header, script, style, .navigation, .menu, .nav, .hamburger, .hamburger-menu, .header";

/// Loose class markers; any element whose class contains one is chrome.
const CHROME_CLASS_MARKERS: &[&str] = &["header", "masthead", "nav", "menu"];

/// Title wrapper used by the aggregation stage, plus the legacy spelling.
const TITLE_SELECTOR: &str = ".chapter-title, h1.title";

/// Phase A: strip chrome and embedded style/script blocks, pull the title
/// wrapper out of the body, and apply section-specific structural fixups.
/// Collect-then-detach throughout, so traversal never races mutation.
pub fn strip_chrome(chapter: &mut Chapter) {
    let mut doomed: Vec<NodeRef> = dom::select_all(&chapter.content, CHROME_SELECTOR);
    for node in chapter.content.descendants() {
        if node.as_element().is_some() && dom::class_contains(&node, CHROME_CLASS_MARKERS) {
            doomed.push(node);
        }
    }
    // Detaching twice is harmless, so overlap between the two sweeps is fine.
    for node in doomed {
        node.detach();
    }

    if let Some(title_node) = dom::select_one(&chapter.content, TITLE_SELECTOR) {
        let text = title_node.text_contents().trim().to_string();
        if !text.is_empty() {
            chapter.title = Some(text);
        }
        // Re-attached as the wrapper-level heading by the renderer.
        title_node.detach();
    }

    match chapter.kind {
        ChapterKind::Glossary => format_glossary_terms(&chapter.content),
        ChapterKind::About => {
            for bio in dom::select_all(&chapter.content, ".author-bio") {
                dom::set_attr(&bio, "class", "author-biography");
            }
        }
        _ => {}
    }
}

/// Glossary sources mark terms with a class; readers expect a definition
/// list. Each `.term` becomes a `dt`, its following element a `dd`, and
/// the pairs are gathered under one `dl`.
fn format_glossary_terms(content: &NodeRef) {
    let mut pairs = Vec::new();
    for term in dom::select_all(content, ".term") {
        let definition = term
            .following_siblings()
            .find(|sib| sib.as_element().is_some());
        let dt = rename_element(&term, "dt");
        let dd = definition.map(|def| rename_element(&def, "dd"));
        pairs.push((dt, dd));
    }

    let Some((first, _)) = pairs.first() else {
        return;
    };
    let list = dom::new_element("dl", &[]);
    first.insert_before(list.clone());
    for (dt, dd) in pairs {
        list.append(dt);
        if let Some(dd) = dd {
            list.append(dd);
        }
    }
}

/// Replace an element with one of a different tag, keeping attributes and
/// children. kuchiki elements cannot change name in place.
fn rename_element(node: &NodeRef, tag: &str) -> NodeRef {
    let replacement = dom::new_element(tag, &[]);
    if let (Some(from), Some(to)) = (node.as_element(), replacement.as_element()) {
        let attrs = from.attributes.borrow();
        let mut new_attrs = to.attributes.borrow_mut();
        for (expanded, attr) in attrs.map.iter() {
            new_attrs.insert(expanded.local.as_ref(), attr.value.clone());
        }
    }
    let children: Vec<NodeRef> = node.children().collect();
    for child in children {
        replacement.append(child);
    }
    node.insert_before(replacement.clone());
    node.detach();
    replacement
}

/// Phase B: write the planned ids onto the tree, then give id-less
/// paragraphs one derived from their first five words. The plan's pool
/// keeps enforcing uniqueness, scoped to this chapter.
pub fn assign_ids(chapter: &Chapter, plan: &mut ChapterIdPlan) {
    for (node, _raw, unique) in &plan.renames {
        dom::set_attr(node, "id", unique);
    }
    for (node, id) in &plan.heading_ids {
        dom::set_attr(node, "id", id);
    }

    for para in dom::select_all(&chapter.content, "p") {
        if dom::get_attr(&para, "id").is_some() {
            continue;
        }
        let lead = first_words(&para.text_contents(), 5);
        if lead.is_empty() {
            continue;
        }
        let id = plan.pool.reserve(&clean_identifier(&lead, HEADING_MARKER));
        dom::set_attr(&para, "id", &id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::index::plan_chapter_ids;
    use crate::book::segment_chapters;
    use crate::dom::parse_html;

    fn chapter_from(html: &str) -> Chapter {
        let doc = parse_html(html);
        segment_chapters(&doc).remove(0)
    }

    #[test]
    fn chrome_is_removed() {
        let mut ch = chapter_from(
            "<div class='chapter' id='1.1-chapter-01'>\
             <nav><a href='/'>home</a></nav>\
             <div class='intro__masthead'>site</div>\
             <div class='hamburger-menu'>x</div>\
             <style>p{}</style>\
             <p>kept</p></div>",
        );
        strip_chrome(&mut ch);
        assert!(dom::select_one(&ch.content, "nav").is_none());
        assert!(dom::select_one(&ch.content, ".intro__masthead").is_none());
        assert!(dom::select_one(&ch.content, ".hamburger-menu").is_none());
        assert!(dom::select_one(&ch.content, "style").is_none());
        assert_eq!(ch.content.text_contents().trim(), "kept");
    }

    #[test]
    fn title_wrapper_is_extracted_and_detached() {
        let mut ch = chapter_from(
            "<div class='chapter' id='1.1-chapter-01'>\
             <div class='chapter-title'>Getting Started</div>\
             <p>body</p></div>",
        );
        strip_chrome(&mut ch);
        assert_eq!(ch.title.as_deref(), Some("Getting Started"));
        assert!(dom::select_one(&ch.content, ".chapter-title").is_none());
    }

    #[test]
    fn missing_title_degrades_to_none() {
        let mut ch = chapter_from("<div class='chapter' id='3.0-conclusion'><p>x</p></div>");
        strip_chrome(&mut ch);
        assert_eq!(ch.title, None);
        assert_eq!(ch.toc_title(), "Conclusion");
    }

    #[test]
    fn glossary_terms_become_definition_list() {
        let mut ch = chapter_from(
            "<div class='chapter' id='glossary'>\
             <p class='term'>Appetite</p><p>How much time we want to spend.</p></div>",
        );
        strip_chrome(&mut ch);
        let dt = dom::select_one(&ch.content, "dl > dt").unwrap();
        assert_eq!(dt.text_contents(), "Appetite");
        let dd = dom::select_one(&ch.content, "dl > dd").unwrap();
        assert!(dd.text_contents().contains("How much time"));
    }

    #[test]
    fn assign_ids_headings_then_paragraphs() {
        let ch = chapter_from(
            "<div class='chapter' id='1.1-chapter-01'>\
             <h2>Set Boundaries</h2>\
             <p>Intro paragraph with some words here</p>\
             <p id='keep.me'>explicit</p></div>",
        );
        let mut plan = plan_chapter_ids(&ch.content);
        assign_ids(&ch, &mut plan);

        let h2 = dom::select_one(&ch.content, "h2").unwrap();
        assert_eq!(dom::get_attr(&h2, "id").as_deref(), Some("set-boundaries"));

        let paras = dom::select_all(&ch.content, "p");
        assert_eq!(
            dom::get_attr(&paras[0], "id").as_deref(),
            Some("intro-paragraph-with-some-words")
        );
        // Explicit id re-normalized, identity preserved.
        assert_eq!(dom::get_attr(&paras[1], "id").as_deref(), Some("keep-me"));
    }

    #[test]
    fn paragraph_ids_respect_uniqueness_pool() {
        let ch = chapter_from(
            "<div class='chapter' id='1.1-chapter-01'>\
             <p>Same lead words here now</p>\
             <p>Same lead words here now again</p></div>",
        );
        let mut plan = plan_chapter_ids(&ch.content);
        assign_ids(&ch, &mut plan);
        let paras = dom::select_all(&ch.content, "p");
        assert_eq!(
            dom::get_attr(&paras[0], "id").as_deref(),
            Some("same-lead-words-here-now")
        );
        assert_eq!(
            dom::get_attr(&paras[1], "id").as_deref(),
            Some("same-lead-words-here-now-1")
        );
    }
}
