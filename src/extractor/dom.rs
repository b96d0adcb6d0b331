//! Tree-walking helpers shared by the extractors
//!
//! The portal's markup is label/value prose more than it is structured data,
//! so most lookups start from a text node containing a label and walk
//! outwards through parents and siblings.

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node};

/// Concatenated text of every descendant text node, each trimmed, blank ones
/// skipped, joined with `separator`
pub(crate) fn joined_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Text with no separator between fragments
pub(crate) fn compact_text(element: ElementRef<'_>) -> String {
    joined_text(element, "")
}

/// Text with single spaces between fragments
pub(crate) fn spaced_text(element: ElementRef<'_>) -> String {
    joined_text(element, " ")
}

/// Raw document text, fragments concatenated untouched
pub(crate) fn document_text(document: &Html) -> String {
    document.root_element().text().collect()
}

/// Text nodes whose content contains `needle`, in document order
pub(crate) fn text_nodes_containing<'a>(
    document: &'a Html,
    needle: &str,
) -> Vec<NodeRef<'a, Node>> {
    document
        .tree
        .root()
        .descendants()
        .filter(|node| node.value().as_text().is_some_and(|t| t.contains(needle)))
        .collect()
}

/// First text node containing `needle`
pub(crate) fn first_text_node<'a>(document: &'a Html, needle: &str) -> Option<NodeRef<'a, Node>> {
    document
        .tree
        .root()
        .descendants()
        .find(|node| node.value().as_text().is_some_and(|t| t.contains(needle)))
}

pub(crate) fn parent_element<'a>(node: NodeRef<'a, Node>) -> Option<ElementRef<'a>> {
    node.parent().and_then(ElementRef::wrap)
}

/// Descendant elements (excluding `element` itself) whose tag is one of
/// `names`, in document order
pub(crate) fn descendants_named<'a>(
    element: ElementRef<'a>,
    names: &[&str],
) -> impl Iterator<Item = ElementRef<'a>> {
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |e| names.iter().any(|n| n == e.value().name()))
}

/// Element siblings after `element`
pub(crate) fn next_element_siblings<'a>(
    element: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> {
    element.next_siblings().filter_map(ElementRef::wrap)
}

/// Last element named `name` that starts before `target` in document order
pub(crate) fn preceding_element<'a>(
    document: &'a Html,
    target: NodeId,
    name: &str,
) -> Option<ElementRef<'a>> {
    let mut found = None;
    for node in document.tree.root().descendants() {
        if node.id() == target {
            break;
        }
        if let Some(element) = ElementRef::wrap(node) {
            if element.value().name() == name {
                found = Some(element);
            }
        }
    }
    found
}

/// First text node after the start of `target` in document order (its own
/// descendants included) that contains `needle`
pub(crate) fn following_text_node<'a>(
    document: &'a Html,
    target: NodeId,
    needle: &str,
) -> Option<NodeRef<'a, Node>> {
    document
        .tree
        .root()
        .descendants()
        .skip_while(|node| node.id() != target)
        .skip(1)
        .find(|node| node.value().as_text().is_some_and(|t| t.contains(needle)))
}

/// Whether `node` lies after `anchor` in document order
pub(crate) fn is_after(root: NodeRef<'_, Node>, anchor: NodeId, node: NodeId) -> bool {
    let mut seen_anchor = false;
    for current in root.descendants() {
        if current.id() == anchor {
            seen_anchor = true;
        } else if current.id() == node {
            return seen_anchor;
        }
    }
    false
}

/// Number of ancestors, used to prefer the tightest enclosing container
pub(crate) fn depth(element: ElementRef<'_>) -> usize {
    element.ancestors().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_helpers() {
        let html = Html::parse_fragment("<div> Người  <b>đại diện</b>\n: <span> A </span></div>");
        let div = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "div")
            .unwrap();
        assert_eq!(compact_text(div), "Ngườiđại diện:A");
        assert_eq!(spaced_text(div), "Người đại diện : A");
    }

    #[test]
    fn test_preceding_and_following() {
        let html = Html::parse_document(
            "<h3>One</h3><p id='a'>Mã số thuế: 1</p><h3>Two</h3><p>Người đại diện: X</p>",
        );
        let label = first_text_node(&html, "Mã số thuế").unwrap();
        let paragraph = parent_element(label).unwrap();

        let heading = preceding_element(&html, (*paragraph).id(), "h3").unwrap();
        assert_eq!(compact_text(heading), "One");

        let rep = following_text_node(&html, (*paragraph).id(), "Người đại diện").unwrap();
        assert!(rep.value().as_text().unwrap().contains("X"));
        assert!(is_after(html.tree.root(), label.id(), rep.id()));
        assert!(!is_after(html.tree.root(), rep.id(), label.id()));
    }
}
