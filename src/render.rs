//! Serialization of one sanitized, link-resolved chapter into a
//! standalone fragment-addressable XHTML document.

use crate::book::Chapter;
use crate::dom::serialize::{serialize_children, xml_escape};

pub const STYLESHEET_HREF: &str = "styles/style.css";

/// Wrap the chapter content in a full XHTML document: head with the title,
/// the shared stylesheet, a chapter-number label where one applies, the
/// title as the top-level heading, and the body nested under a content
/// container.
pub fn render_chapter(chapter: &Chapter) -> String {
    let title = chapter.toc_title();
    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    doc.push_str("<!DOCTYPE html>\n");
    doc.push_str(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n",
    );
    doc.push_str("<head>\n");
    doc.push_str(&format!("  <title>{}</title>\n", xml_escape(&title)));
    doc.push_str(&format!(
        "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{STYLESHEET_HREF}\" />\n"
    ));
    doc.push_str("</head>\n<body>\n");
    doc.push_str(&format!(
        "<div class=\"chapter\" id=\"{}\">\n",
        xml_escape(&chapter.clean_id)
    ));
    if let Some(label) = chapter.display_label() {
        doc.push_str(&format!(
            "<p class=\"chapter-number\">{}</p>\n",
            xml_escape(&label)
        ));
    }
    doc.push_str(&format!("<h1>{}</h1>\n", xml_escape(&title)));
    doc.push_str("<div class=\"chapter-content\">");
    doc.push_str(&serialize_children(&chapter.content));
    doc.push_str("</div>\n</div>\n</body>\n</html>\n");
    doc
}
