//! Primary detail source: the `table.table-taxinfo` block
//!
//! Rows are label/value cell pairs. Value cells carrying `itemprop` are
//! interpreted by their microdata; the rest are mapped through the label
//! table below.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::clean_phone;
use super::representative::{clean_representative, is_valid_representative};
use crate::extractor::dom::compact_text;
use crate::models::{DetailFields, FieldName};

/// Label fragments and their fields, checked in order. "Địa chỉ Thuế" must
/// come before "Địa chỉ".
const LABEL_FIELDS: [(&str, FieldName); 10] = [
    ("Mã số thuế", FieldName::TaxCode),
    ("Địa chỉ Thuế", FieldName::TaxAddress),
    ("Địa chỉ", FieldName::Address),
    ("Tình trạng", FieldName::Status),
    ("Người đại diện", FieldName::Representative),
    ("Điện thoại", FieldName::Phone),
    ("Ngày hoạt động", FieldName::OperationDate),
    ("Quản lý bởi", FieldName::ManagedBy),
    ("Loại hình DN", FieldName::BusinessType),
    ("Ngành nghề chính", FieldName::MainBusiness),
];

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: Lazy<Selector> = Lazy::new(|| {
            Selector::parse($css).expect(concat!("BUG: hardcoded CSS selector '", $css, "' is invalid"))
        });
    };
}

selector!(TAX_INFO_TABLE, "table.table-taxinfo");
selector!(ROW, "tr");
selector!(CELL, "td");
selector!(ANCHOR, "a");
selector!(COPY_SPAN, "span.copy");
selector!(EMPHASIS, "em");
selector!(TAX_ADDRESS_SPAN, "#tax-address-html");
selector!(NAME_SPAN, "span[itemprop=\"name\"]");
selector!(TABLE, "table.table");
selector!(THEAD, "thead");
selector!(TBODY_ROW, "tbody tr");

/// Map label text to its field
pub(crate) fn field_for_label(label: &str) -> Option<FieldName> {
    LABEL_FIELDS
        .iter()
        .find(|(fragment, _)| label.contains(fragment))
        .map(|(_, field)| *field)
}

/// Anchor text, then `span.copy`, then the cell's own text
fn cell_value(cell: ElementRef<'_>) -> String {
    if let Some(link) = cell.select(&ANCHOR).next() {
        return compact_text(link);
    }
    if let Some(span) = cell.select(&COPY_SPAN).next() {
        return compact_text(span);
    }
    compact_text(cell)
}

/// Handle a value cell carrying microdata. Returns whether it did.
fn apply_itemprop(cell: ElementRef<'_>, fields: &mut DetailFields) -> bool {
    match cell.value().attr("itemprop") {
        Some("taxID") => {
            fields.set_if_empty(FieldName::TaxCode, compact_text(cell));
            true
        }
        Some("address") => {
            match cell.select(&TAX_ADDRESS_SPAN).next() {
                Some(span) => fields.set_if_empty(FieldName::TaxAddress, compact_text(span)),
                None => fields.set_if_empty(FieldName::Address, compact_text(cell)),
            };
            true
        }
        Some("telephone") => {
            if cell.select(&EMPHASIS).next().is_none() {
                if let Some(phone) = clean_phone(&compact_text(cell)) {
                    fields.set_if_empty(FieldName::Phone, phone);
                }
            }
            true
        }
        _ => false,
    }
}

fn apply_representative(cell: ElementRef<'_>, value: &str, fields: &mut DetailFields) {
    let candidate = match cell.select(&NAME_SPAN).next() {
        Some(span) => match span.select(&ANCHOR).next() {
            Some(link) => compact_text(link),
            None => compact_text(span),
        },
        None => value.to_string(),
    };
    if is_valid_representative(&candidate) {
        if let Some(cleaned) = clean_representative(&candidate) {
            debug!(method = "table-taxinfo", representative = %cleaned, "Representative found");
            fields.set_if_empty(FieldName::Representative, cleaned);
        }
    }
}

fn apply_row(row: ElementRef<'_>, fields: &mut DetailFields) {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
    let [label_cell, value_cell, ..] = cells.as_slice() else {
        return;
    };

    if apply_itemprop(*value_cell, fields) {
        return;
    }

    let label = compact_text(*label_cell);
    let Some(field) = field_for_label(&label) else {
        return;
    };
    let value = cell_value(*value_cell);

    match field {
        FieldName::Representative => apply_representative(*value_cell, &value, fields),
        FieldName::Phone => {
            if value_cell.select(&EMPHASIS).next().is_none() {
                if let Some(phone) = clean_phone(&value) {
                    fields.set_if_empty(FieldName::Phone, phone);
                }
            }
        }
        _ => {
            fields.set_if_empty(field, value);
        }
    }
}

/// Parse the info table. Returns false when the page has none.
pub fn extract_tax_info_table(document: &Html, fields: &mut DetailFields) -> bool {
    let Some(table) = document.select(&TAX_INFO_TABLE).next() else {
        debug!("No table-taxinfo block, relying on label fallbacks");
        return false;
    };

    let before = fields.populated_fields().len();
    for row in table.select(&ROW) {
        apply_row(row, fields);
    }
    debug!(
        new_fields = fields.populated_fields().len() - before,
        "Parsed table-taxinfo"
    );
    true
}

/// Rows of every `table.table` whose header mentions both "Mã" and
/// "Ngành", rendered as `"{code} - {name}"`
#[must_use]
pub fn extract_other_businesses(document: &Html) -> Vec<String> {
    let mut entries = Vec::new();
    for table in document.select(&TABLE) {
        let Some(head) = table.select(&THEAD).next() else {
            continue;
        };
        let header = compact_text(head);
        if !(header.contains("Mã") && header.contains("Ngành")) {
            continue;
        }
        for row in table.select(&TBODY_ROW) {
            let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
            let [code_cell, name_cell, ..] = cells.as_slice() else {
                continue;
            };
            let code = anchor_or_text(*code_cell);
            let name = anchor_or_text(*name_cell);
            if !code.is_empty() && !name.is_empty() {
                entries.push(format!("{code} - {name}"));
            }
        }
    }
    entries
}

fn anchor_or_text(cell: ElementRef<'_>) -> String {
    match cell.select(&ANCHOR).next() {
        Some(link) => compact_text(link),
        None => compact_text(cell),
    }
}
