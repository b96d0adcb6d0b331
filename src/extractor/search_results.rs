//! Search page extraction
//!
//! Each hit on the search page is anchored by a "Mã số thuế:" label. The
//! company heading precedes it and the representative and address follow it.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::dom::{
    compact_text, following_text_node, next_element_siblings, parent_element,
    preceding_element, spaced_text, text_nodes_containing,
};
use crate::models::SearchResult;

pub(crate) const TAX_CODE_LABEL: &str = "Mã số thuế:";
pub(crate) const REPRESENTATIVE_LABEL: &str = "Người đại diện";

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("BUG: hardcoded CSS selector 'a' is invalid"));

fn first_anchor(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.select(&ANCHOR).next()
}

/// Parse every candidate on a search page, in document order.
///
/// Relative detail links are joined onto `base_url`. Entries with neither a
/// name nor a tax code are dropped.
#[must_use]
pub fn extract_search_results(html: &str, base_url: &Url) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for label in text_nodes_containing(&document, TAX_CODE_LABEL) {
        let Some(container) = parent_element(label) else {
            continue;
        };
        let container_id = (*container).id();

        let tax_code = match first_anchor(container) {
            Some(link) => compact_text(link),
            None => label
                .value()
                .as_text()
                .and_then(|t| t.rsplit(TAX_CODE_LABEL).next())
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
        };

        let (name, detail_url) = match preceding_element(&document, container_id, "h3") {
            Some(heading) => match first_anchor(heading) {
                Some(link) => {
                    let detail_url = link
                        .value()
                        .attr("href")
                        .and_then(|href| base_url.join(href).ok())
                        .map(String::from);
                    (compact_text(link), detail_url)
                }
                None => (compact_text(heading), None),
            },
            None => (String::new(), None),
        };

        let mut representative = None;
        let mut address = None;
        if let Some(rep_label) = following_text_node(&document, container_id, REPRESENTATIVE_LABEL) {
            let rep_container = parent_element(rep_label);

            representative = match rep_container.and_then(first_anchor) {
                Some(link) => Some(compact_text(link)),
                None => rep_label
                    .value()
                    .as_text()
                    .map(|t| t.replace("Người đại diện:", "").trim().to_string()),
            }
            .filter(|r| !r.is_empty());

            address = rep_container.and_then(|c| {
                next_element_siblings(c)
                    .map(spaced_text)
                    .find(|t| !t.is_empty())
            });
        }

        if name.is_empty() && tax_code.is_empty() {
            continue;
        }

        let mut result = SearchResult::new(name, tax_code);
        result.representative = representative;
        result.address = address;
        result.detail_url = detail_url;
        results.push(result);
    }

    debug!(count = results.len(), "Parsed search results");
    results
}
