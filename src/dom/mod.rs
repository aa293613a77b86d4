pub mod serialize;

use html5ever::tendril::TendrilSink;
use kuchiki::NodeRef;
use markup5ever::{LocalName, Namespace, QualName};

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Parse an HTML string into a kuchiki DOM.
pub fn parse_html(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html)
}

/// Qualified name for an element in the XHTML namespace.
pub fn html_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(XHTML_NS), LocalName::from(tag))
}

/// Create a detached element with the given attributes.
pub fn new_element(tag: &str, attrs: &[(&str, &str)]) -> NodeRef {
    NodeRef::new_element(
        html_name(tag),
        attrs.iter().map(|(name, value)| {
            (
                kuchiki::ExpandedName::new("", *name),
                kuchiki::Attribute {
                    prefix: None,
                    value: (*value).to_string(),
                },
            )
        }),
    )
}

/// Lowercase local tag name of an element node.
pub fn element_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|el| el.name.local.as_ref().to_string())
}

pub fn get_attr(node: &NodeRef, name: &str) -> Option<String> {
    let el = node.as_element()?;
    let attrs = el.attributes.borrow();
    attrs.get(name).map(|v| v.to_string())
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().insert(name, value.to_string());
    }
}

/// All element nodes under `root` (inclusive) matching a CSS selector,
/// collected up front so callers can mutate while iterating.
pub fn select_all(root: &NodeRef, css: &str) -> Vec<NodeRef> {
    match root.select(css) {
        Ok(iter) => iter.map(|n| n.as_node().clone()).collect(),
        Err(()) => Vec::new(),
    }
}

/// First element under `root` matching a CSS selector.
pub fn select_one(root: &NodeRef, css: &str) -> Option<NodeRef> {
    root.select_first(css).ok().map(|n| n.as_node().clone())
}

/// Whether any ancestor of `node` (exclusive) is an element with the given
/// tag name. Used to skip text nodes that already live inside an anchor.
pub fn has_ancestor_tag(node: &NodeRef, tag: &str) -> bool {
    node.ancestors()
        .any(|a| element_name(&a).as_deref() == Some(tag))
}

/// Pointer identity of two nodes.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    std::rc::Rc::ptr_eq(&a.0, &b.0)
}

/// Nearest ancestor of `node` below `root` (both exclusive) whose tag name
/// is one of `tags`.
pub fn nearest_ancestor_within(node: &NodeRef, root: &NodeRef, tags: &[&str]) -> Option<NodeRef> {
    node.ancestors()
        .take_while(|a| !same_node(a, root))
        .find(|a| {
            element_name(a)
                .map(|name| tags.contains(&name.as_str()))
                .unwrap_or(false)
        })
}

/// Whether the element's class attribute has a token containing any of the
/// given markers. Matches the loose `[class*=...]` chrome heuristics of the
/// source site.
pub fn class_contains(node: &NodeRef, markers: &[&str]) -> bool {
    match get_attr(node, "class") {
        Some(class) => {
            let class = class.to_lowercase();
            markers.iter().any(|m| class.contains(m))
        }
        None => false,
    }
}

/// Replace an element with its children, preserving document order.
pub fn unwrap_element(node: &NodeRef) {
    let children: Vec<NodeRef> = node.children().collect();
    for child in children {
        node.insert_before(child);
    }
    node.detach();
}
