//! Detail page extraction
//!
//! The info table is read first; label fallbacks and the representative
//! strategy chain then fill whatever it left empty. Extraction never fails:
//! a page with unexpected markup yields a partial or empty field map.

pub mod fallback;
pub mod representative;
pub mod table;

use scraper::Html;
use tracing::{debug, info};

use crate::models::{DetailFields, FieldName};

pub use representative::{clean_representative, find_representative, is_valid_representative};

/// Phone digits and punctuation, `None` for hidden or empty values
pub(crate) fn clean_phone(text: &str) -> Option<String> {
    if text.contains("Bị ẩn") || text.to_lowercase().contains("ẩn") {
        return None;
    }
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
        .collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Extract every field a detail page offers
#[must_use]
pub fn extract_details(html: &str) -> DetailFields {
    let document = Html::parse_document(html);
    extract_details_from_document(&document)
}

/// Same as [`extract_details`] for an already parsed page
#[must_use]
pub fn extract_details_from_document(document: &Html) -> DetailFields {
    let mut fields = DetailFields::new();

    let has_table = table::extract_tax_info_table(document, &mut fields);
    fields.set_other_businesses_if_empty(table::extract_other_businesses(document));

    fallback::fill_labeled_fields(document, &mut fields);
    fallback::fill_address(document, &mut fields);
    if !fields.is_set(FieldName::Representative) {
        if let Some((name, method)) = find_representative(document) {
            debug!(method, "Representative taken from fallback chain");
            fields.set_if_empty(FieldName::Representative, name);
        }
    }
    fallback::fill_phone(document, &mut fields);

    info!(
        has_table,
        fields = ?fields.populated_fields(),
        "Extracted detail fields"
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_phone() {
        assert_eq!(clean_phone("Tel: +84 24-3825 (1234)").as_deref(), Some("+84 24-3825 (1234)"));
        assert_eq!(clean_phone("Bị ẩn theo yêu cầu người dùng"), None);
        assert_eq!(clean_phone("không có"), None);
    }

    #[test]
    fn test_empty_page_yields_empty_fields() {
        assert!(extract_details("<html><body><p>Không tìm thấy</p></body></html>").is_empty());
        assert!(extract_details("").is_empty());
    }

    #[test]
    fn test_table_representative_wins_over_fallbacks() {
        let html = r#"<html><body>
            <div class="intro"><p>Người đại diện: <strong>Sai Tên</strong></p></div>
            <table class="table-taxinfo">
              <tr><td>Người đại diện</td><td><span itemprop="name"><a href="/p">Nguyễn Văn A</a></span></td></tr>
            </table>
        </body></html>"#;
        assert_eq!(extract_details(html).representative(), Some("Nguyễn Văn A"));
    }

    #[test]
    fn test_fallback_fills_gaps_left_by_table() {
        let html = r#"<html><body>
            <table class="table-taxinfo">
              <tr><td>Mã số thuế</td><td itemprop="taxID">0101234567</td></tr>
            </table>
            <p>Tình trạng: Đang hoạt động (đã được cấp GCN ĐKT)</p>
            <p>Người đại diện: <a href="/p">Trần Thị B</a></p>
        </body></html>"#;
        let fields = extract_details(html);
        assert_eq!(fields.tax_code(), Some("0101234567"));
        assert_eq!(fields.status(), Some("Đang hoạt động (đã được cấp GCN ĐKT)"));
        assert_eq!(fields.representative(), Some("Trần Thị B"));
    }
}
