//! Query normalization helpers

use once_cell::sync::Lazy;
use regex::Regex;

use super::constants::MAX_QUERY_LENGTH;
use crate::error::{LookupError, LookupResult};

static TRAILING_DIGITS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(\d+)/?$").expect("BUG: hardcoded trailing digits regex is invalid")
});

/// Trim the query and cut it to `MAX_QUERY_LENGTH` characters.
///
/// # Errors
///
/// Returns `LookupError::Validation` when nothing is left after trimming.
pub fn sanitize_query(query: &str) -> LookupResult<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(LookupError::validation("query", "query must not be empty"));
    }
    let sanitized: String = trimmed.chars().take(MAX_QUERY_LENGTH).collect();
    Ok(sanitized.trim_end().to_string())
}

/// Keep only the digits
#[must_use]
pub fn clean_tax_code(tax_code: &str) -> String {
    tax_code.chars().filter(char::is_ascii_digit).collect()
}

/// 8 to 15 digits once separators are removed
#[must_use]
pub fn is_valid_tax_code(tax_code: &str) -> bool {
    let cleaned = clean_tax_code(tax_code);
    (8..=15).contains(&cleaned.len())
}

/// Queries made only of digits are looked up as exact tax codes
#[must_use]
pub fn is_tax_code_query(query: &str) -> bool {
    let query = query.trim();
    !query.is_empty() && query.chars().all(|c| c.is_ascii_digit())
}

/// Tax code at the end of a detail URL path (`.../0101234567/`)
#[must_use]
pub fn extract_tax_code_from_url(url: &str) -> Option<String> {
    TRAILING_DIGITS
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_query() {
        assert_eq!(sanitize_query("  0101234567 ").unwrap(), "0101234567");
        assert!(matches!(
            sanitize_query("   "),
            Err(LookupError::Validation { .. })
        ));

        let long = "á".repeat(MAX_QUERY_LENGTH + 50);
        assert_eq!(
            sanitize_query(&long).unwrap().chars().count(),
            MAX_QUERY_LENGTH
        );
    }

    #[test]
    fn test_tax_code_helpers() {
        assert_eq!(clean_tax_code("0101-234 567"), "0101234567");
        assert!(is_valid_tax_code("0101234567"));
        assert!(is_valid_tax_code("0101234567-001"));
        assert!(!is_valid_tax_code("1234567"));
        assert!(is_tax_code_query(" 0101234567 "));
        assert!(!is_tax_code_query("0101234567 ABC"));
        assert!(!is_tax_code_query(""));
    }

    #[test]
    fn test_extract_tax_code_from_url() {
        assert_eq!(
            extract_tax_code_from_url("https://masothue.com/company/1234567890/"),
            Some("1234567890".to_string())
        );
        assert_eq!(
            extract_tax_code_from_url("/company/1234567890"),
            Some("1234567890".to_string())
        );
        assert_eq!(
            extract_tax_code_from_url("https://masothue.com/0101234567-cong-ty-a"),
            None
        );
    }
}
