//! Strict XHTML serialization of a kuchiki subtree.
//!
//! The default HTML serializer emits `<img>` and unquoted attributes, which
//! an EPUB reading system treating content as XML will reject. This one
//! always quotes and escapes attributes, escapes text, self-closes void
//! elements, and drops comments.

use kuchiki::{NodeData, NodeRef};

/// HTML void elements, emitted self-closing (`<br />`).
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Serialize `node` itself (element, text, or fragment root) as XHTML.
pub fn serialize_node(node: &NodeRef, out: &mut String) {
    match node.data() {
        NodeData::Element(el) => {
            let name = el.name.local.as_ref().to_lowercase();
            out.push('<');
            out.push_str(&name);
            // Attributes map is a BTreeMap, so the order is stable.
            for (expanded, attr) in el.attributes.borrow().map.iter() {
                out.push(' ');
                out.push_str(expanded.local.as_ref());
                out.push_str("=\"");
                out.push_str(&xml_escape(&attr.value));
                out.push('"');
            }
            if VOID_ELEMENTS.contains(&name.as_str()) {
                out.push_str(" />");
            } else {
                out.push('>');
                for child in node.children() {
                    serialize_node(&child, out);
                }
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
            }
        }
        NodeData::Text(text) => out.push_str(&escape_text(&text.borrow())),
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.children() {
                serialize_node(&child, out);
            }
        }
        // Comments, doctypes, and processing instructions carry no content.
        NodeData::Comment(_) | NodeData::Doctype(_) | NodeData::ProcessingInstruction(_) => {}
    }
}

/// Serialize only the children of `node` as XHTML.
pub fn serialize_children(node: &NodeRef) -> String {
    let mut out = String::new();
    for child in node.children() {
        serialize_node(&child, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, select_one};

    #[test]
    fn void_elements_self_close() {
        let doc = parse_html("<p>a<br>b<img src='x.png' alt='Image'></p>");
        let p = select_one(&doc, "p").unwrap();
        let mut out = String::new();
        serialize_node(&p, &mut out);
        assert_eq!(out, "<p>a<br />b<img alt=\"Image\" src=\"x.png\" /></p>");
    }

    #[test]
    fn attributes_are_quoted_and_escaped() {
        let doc = parse_html("<a href='ch1.xhtml#a&quot;b'>x &amp; y</a>");
        let a = select_one(&doc, "a").unwrap();
        let mut out = String::new();
        serialize_node(&a, &mut out);
        assert_eq!(out, "<a href=\"ch1.xhtml#a&quot;b\">x &amp; y</a>");
    }

    #[test]
    fn comments_are_dropped() {
        let doc = parse_html("<div><!-- nav marker --><p>text</p></div>");
        let div = select_one(&doc, "div").unwrap();
        let mut out = String::new();
        serialize_node(&div, &mut out);
        assert_eq!(out, "<div><p>text</p></div>");
    }

    #[test]
    fn text_escapes_angle_brackets() {
        let doc = parse_html("<p>1 &lt; 2</p>");
        let p = select_one(&doc, "p").unwrap();
        let mut out = String::new();
        serialize_node(&p, &mut out);
        assert_eq!(out, "<p>1 &lt; 2</p>");
    }
}
