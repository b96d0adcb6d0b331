//! Representative name strategies
//!
//! The representative is the field the portal lays out least consistently,
//! so it is located by an ordered chain of independent strategies. Each one
//! is a pure function of the document returning a candidate that already
//! passed [`is_valid_representative`]; the first hit wins and is cleaned.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use std::cmp::Reverse;
use tracing::{debug, warn};

use crate::extractor::dom::{
    compact_text, depth, descendants_named, document_text, first_text_node, is_after,
    parent_element, spaced_text,
};

pub(crate) const REPRESENTATIVE_LABEL: &str = "Người đại diện";

/// Phrases that mean a candidate is another field's label or value
const FOREIGN_LABELS: [&str; 6] = ["Mã số thuế", "MST", "Tax", "Code", "Địa chỉ", "Address"];

/// Text after these markers belongs to a following sentence
const TRAILING_MARKERS: [&str; 2] = ["Ngoài ra", "còn đại diện"];

/// Characters of document text inspected after the label
const PATTERN_WINDOW_CHARS: usize = 200;

static LINK_WITH_HREF: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

pub type Strategy = fn(&Html) -> Option<String>;

/// Strategies in the order they are tried
pub const STRATEGIES: [(&str, Strategy); 8] = [
    ("container-structure", container_structure),
    ("link-in-parent", link_in_parent),
    ("strong-b-in-parent", strong_b_in_parent),
    ("span-div-p-in-parent", span_div_p_in_parent),
    ("parent-text", parent_text),
    ("next-sibling", next_sibling),
    ("container-search", container_search),
    ("pattern-matching", pattern_matching),
];

/// Plausibility check for a person's name
#[must_use]
pub fn is_valid_representative(text: &str) -> bool {
    let length = text.chars().count();
    if !(2..=100).contains(&length) {
        return false;
    }
    if text.chars().all(|c| c.is_ascii_digit()) && (length == 10 || length == 13) {
        return false;
    }
    if !text.chars().any(char::is_alphabetic) {
        return false;
    }
    let digits = text.chars().filter(char::is_ascii_digit).count();
    if digits * 2 > length {
        return false;
    }
    !FOREIGN_LABELS.iter().any(|label| text.contains(label))
}

fn cut_at<'a>(text: &'a str, marker: &str) -> &'a str {
    match text.find(marker) {
        Some(index) => &text[..index],
        None => text,
    }
}

fn cut_trailing_clauses(text: &str) -> &str {
    TRAILING_MARKERS
        .iter()
        .fold(text, |acc, marker| cut_at(acc, marker).trim())
}

/// Strip trailing clauses and punctuation. `None` when nothing plausible
/// remains.
#[must_use]
pub fn clean_representative(name: &str) -> Option<String> {
    let cleaned = cut_trailing_clauses(name.trim());
    let cleaned = cut_at(cleaned, "\n").trim();
    let cleaned = cut_at(cleaned, "<").trim();
    let cleaned = cleaned.trim_matches(|c| matches!(c, '.' | ',' | ';' | ':' | ' '));
    let cleaned = cut_at(cleaned, "(").trim();

    let length = cleaned.chars().count();
    (length > 1 && length < 100).then(|| cleaned.to_string())
}

/// Run the chain. Returns the cleaned name and the producing strategy.
#[must_use]
pub fn find_representative(document: &Html) -> Option<(String, &'static str)> {
    for (name, strategy) in STRATEGIES {
        let Some(candidate) = strategy(document) else {
            continue;
        };
        if !is_valid_representative(&candidate) {
            continue;
        }
        return match clean_representative(&candidate) {
            Some(cleaned) => {
                debug!(method = name, representative = %cleaned, "Representative found");
                Some((cleaned, name))
            }
            None => {
                warn!(method = name, candidate = %candidate, "Representative rejected after cleaning");
                None
            }
        };
    }
    debug!("No representative strategy matched");
    None
}

/// Usable as a name: not the label itself, no colon, plausible
fn standalone_name(text: &str) -> bool {
    !text.is_empty()
        && !text.contains(REPRESENTATIVE_LABEL)
        && !text.contains(':')
        && is_valid_representative(text)
}

fn label_parent(document: &Html) -> Option<ElementRef<'_>> {
    first_text_node(document, REPRESENTATIVE_LABEL).and_then(parent_element)
}

/// Tightest `div`/`section`/`article` around the label holding an emphasized
/// or linked name.
///
/// Containers are visited deepest first rather than in document order: the
/// outer page wrappers also contain the label, and their first link is
/// usually navigation.
fn container_structure(document: &Html) -> Option<String> {
    let mut containers: Vec<ElementRef<'_>> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "div" | "section" | "article"))
        .filter(|e| compact_text(*e).contains(REPRESENTATIVE_LABEL))
        .collect();
    containers.sort_by_key(|c| Reverse(depth(*c)));

    containers.into_iter().find_map(|container| {
        descendants_named(container, &["a", "strong", "b", "span"])
            .map(compact_text)
            .find(|text| standalone_name(text))
    })
}

fn link_in_parent(document: &Html) -> Option<String> {
    let parent = label_parent(document)?;
    parent
        .select(&LINK_WITH_HREF)
        .next()
        .map(compact_text)
        .filter(|text| is_valid_representative(text))
}

fn strong_b_in_parent(document: &Html) -> Option<String> {
    let parent = label_parent(document)?;
    ["strong", "b"].iter().find_map(|tag| {
        descendants_named(parent, &[*tag])
            .next()
            .map(compact_text)
            .filter(|text| is_valid_representative(text))
    })
}

fn span_div_p_in_parent(document: &Html) -> Option<String> {
    let parent = label_parent(document)?;
    ["span", "div", "p"].iter().find_map(|tag| {
        descendants_named(parent, &[*tag])
            .map(compact_text)
            .find(|text| standalone_name(text))
    })
}

/// Text of the label's parent after the colon, or with the label removed
fn parent_text(document: &Html) -> Option<String> {
    let parent = label_parent(document)?;
    let text = spaced_text(parent);
    let candidate = match text.split_once(':') {
        Some((_, tail)) => cut_trailing_clauses(tail.trim()).to_string(),
        None => {
            let without_label = text.replace(REPRESENTATIVE_LABEL, "");
            cut_at(without_label.trim(), "Ngoài ra").trim().to_string()
        }
    };
    is_valid_representative(&candidate).then_some(candidate)
}

fn next_sibling(document: &Html) -> Option<String> {
    let parent = label_parent(document)?;
    for sibling in parent.next_siblings() {
        let candidate = match sibling.value() {
            Node::Text(text) => text.trim().to_string(),
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(sibling) else {
                    continue;
                };
                let text = compact_text(element);
                if text.is_empty() || text.contains(REPRESENTATIVE_LABEL) {
                    continue;
                }
                descendants_named(element, &["a"])
                    .next()
                    .or_else(|| descendants_named(element, &["strong", "b"]).next())
                    .map(compact_text)
                    .unwrap_or(text)
            }
            _ => continue,
        };
        if candidate.is_empty() || candidate.contains(REPRESENTATIVE_LABEL) {
            continue;
        }
        if is_valid_representative(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Linked or emphasized name placed after the label anywhere in the
/// grandparent
fn container_search(document: &Html) -> Option<String> {
    let label = first_text_node(document, REPRESENTATIVE_LABEL)?;
    let container = parent_element(label)?.parent().and_then(ElementRef::wrap)?;
    let root = *container;

    descendants_named(container, &["a", "strong", "b"])
        .filter(|tag| is_after(root, label.id(), (**tag).id()))
        .map(compact_text)
        .find(|text| {
            !text.is_empty() && !text.contains(REPRESENTATIVE_LABEL) && is_valid_representative(text)
        })
}

/// Raw document text following the label
fn pattern_matching(document: &Html) -> Option<String> {
    let text = document_text(document);
    let start = text.find(REPRESENTATIVE_LABEL)?;
    let window: String = text[start..].chars().take(PATTERN_WINDOW_CHARS).collect();
    let (_, tail) = window.split_once(':')?;
    let candidate = cut_at(tail.trim(), "\n").trim();
    let candidate = cut_at(candidate, "Ngoài ra").trim();
    is_valid_representative(candidate).then(|| candidate.to_string())
}
