//! Label-driven fallbacks for fields the info table did not provide
//!
//! Every function here only fills empty fields.

use scraper::{ElementRef, Html, Node};

use super::clean_phone;
use crate::extractor::dom::{
    compact_text, descendants_named, first_text_node, parent_element, spaced_text,
};
use crate::models::{DetailFields, FieldName};

/// Fields located with [`value_by_label`], in fill order
const LABELED_FIELDS: [(&str, FieldName); 7] = [
    ("Mã số thuế", FieldName::TaxCode),
    ("Địa chỉ Thuế", FieldName::TaxAddress),
    ("Tình trạng", FieldName::Status),
    ("Ngày hoạt động", FieldName::OperationDate),
    ("Quản lý bởi", FieldName::ManagedBy),
    ("Loại hình DN", FieldName::BusinessType),
    ("Ngành nghề chính", FieldName::MainBusiness),
];

const ADDRESS_LABEL: &str = "Địa chỉ";
const TAX_ADDRESS_LABEL: &str = "Địa chỉ Thuế";
const PHONE_LABEL: &str = "Điện thoại";

/// Locate the value displayed next to `label`.
///
/// Starting from the first text node containing the label, tries in order:
/// the parent's text after a colon, a descendant `a`/`strong`/`span`/`div`/`p`
/// of the parent, the parent's next siblings, and finally a
/// `div`/`p`/`span` of the grandparent holding "label: value".
#[must_use]
pub fn value_by_label(document: &Html, label: &str) -> Option<String> {
    let label_node = first_text_node(document, label)?;
    let parent = parent_element(label_node)?;

    let parent_text = spaced_text(parent);
    if let Some((_, tail)) = parent_text.split_once(':') {
        let value = tail.trim().replace(label, "");
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    for tag in ["a", "strong", "span", "div", "p"] {
        let found = descendants_named(parent, &[tag]).map(compact_text).find(|text| {
            !text.is_empty() && !text.contains(label) && text.chars().count() > 1
        });
        if found.is_some() {
            return found;
        }
    }

    for sibling in parent.next_siblings() {
        let text = match sibling.value() {
            Node::Text(text) => text.trim().to_string(),
            Node::Element(_) => ElementRef::wrap(sibling).map(compact_text).unwrap_or_default(),
            _ => continue,
        };
        if !text.is_empty() && !text.contains(label) {
            return Some(text);
        }
    }

    let grandparent = parent.parent().and_then(ElementRef::wrap)?;
    descendants_named(grandparent, &["div", "p", "span"])
        .map(compact_text)
        .filter(|text| text.contains(label))
        .find_map(|text| {
            let (_, tail) = text.split_once(':')?;
            let value = tail.trim();
            (!value.is_empty() && value != label).then(|| value.to_string())
        })
}

/// Status, dates, management and business fields by label
pub fn fill_labeled_fields(document: &Html, fields: &mut DetailFields) {
    for (label, field) in LABELED_FIELDS {
        if fields.is_set(field) {
            continue;
        }
        if let Some(value) = value_by_label(document, label) {
            fields.set_if_empty(field, value);
        }
    }
}

/// Street address under a plain "Địa chỉ" label, defaulting to the tax
/// address
pub fn fill_address(document: &Html, fields: &mut DetailFields) {
    if fields.is_set(FieldName::Address) {
        return;
    }

    let label_node = document.tree.root().descendants().find(|node| {
        node.value()
            .as_text()
            .is_some_and(|t| t.contains(ADDRESS_LABEL) && !t.contains(TAX_ADDRESS_LABEL))
    });

    if let Some(parent) = label_node.and_then(parent_element) {
        let text = spaced_text(parent);
        if let Some((_, tail)) = text.split_once(':') {
            let address = tail.trim().replace(ADDRESS_LABEL, "");
            let address = address.trim();
            if !address.is_empty() && Some(address) != fields.tax_address() {
                fields.set_if_empty(FieldName::Address, address);
            }
        }
    }

    if !fields.is_set(FieldName::Address) {
        if let Some(tax_address) = fields.tax_address().map(str::to_string) {
            fields.set_if_empty(FieldName::Address, tax_address);
        }
    }
}

pub fn fill_phone(document: &Html, fields: &mut DetailFields) {
    if fields.is_set(FieldName::Phone) {
        return;
    }
    if let Some(phone) = value_by_label(document, PHONE_LABEL).and_then(|v| clean_phone(&v)) {
        fields.set_if_empty(FieldName::Phone, phone);
    }
}
