//! Human-verification (CAPTCHA) page detection
//!
//! Detection runs in two phases. A cheap lowercase substring scan rules out
//! ordinary pages without parsing. Only when an indicator is present is the
//! document inspected structurally, so a page that merely mentions
//! "recaptcha" in prose is not reported as blocked.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

/// Substrings that make a page worth inspecting
const QUICK_INDICATORS: [&str; 9] = [
    "geetest",
    "recaptcha",
    "hcaptcha",
    "captcha.js",
    "gt.js",
    "data-sitekey",
    "data-widget-id",
    "vui lòng xác minh bạn không phải robot",
    "please verify you are not a robot",
];

/// Class or id fragments of known challenge widgets
const WIDGET_PATTERNS: [&str; 9] = [
    "geetest",
    "g-recaptcha",
    "h-captcha",
    "captcha-container",
    "captcha-box",
    "captcha-wrapper",
    "captcha-widget",
    "gt_holder",
    "gt_box",
];

const SCRIPT_SOURCES: [&str; 5] = ["geetest", "recaptcha", "hcaptcha", "captcha.js", "gt.js"];

const IFRAME_SOURCES: [&str; 3] = ["recaptcha", "hcaptcha", "geetest"];

const DATA_ATTRIBUTES: [&str; 3] = ["data-sitekey", "data-callback", "data-widget-id"];

const VERIFICATION_PHRASES: [&str; 4] = [
    "vui lòng xác minh bạn không phải robot",
    "please verify you are not a robot",
    "vui lòng hoàn thành xác minh",
    "please complete the verification",
];

/// Class fragments a verification phrase must be co-located with
const PHRASE_WIDGET_CLASSES: [&str; 3] = ["geetest", "recaptcha", "hcaptcha"];

fn has_quick_indicator(lower: &str) -> bool {
    QUICK_INDICATORS.iter().any(|i| lower.contains(i))
}

/// Case-insensitive substring match on class (and id when `with_id`)
fn widget_css(patterns: &[&str], with_id: bool) -> String {
    patterns
        .iter()
        .flat_map(|p| {
            let class = format!("[class*=\"{p}\" i]");
            if with_id {
                vec![class, format!("[id*=\"{p}\" i]")]
            } else {
                vec![class]
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

static WIDGETS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(&widget_css(&WIDGET_PATTERNS, true))
        .expect("BUG: hardcoded challenge widget selector is invalid")
});

static PHRASE_WIDGETS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(&widget_css(&PHRASE_WIDGET_CLASSES, false))
        .expect("BUG: hardcoded phrase widget selector is invalid")
});

static SCRIPTS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script[src]").expect("BUG: hardcoded CSS selector 'script[src]' is invalid")
});

static IFRAMES: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("iframe[src]").expect("BUG: hardcoded CSS selector 'iframe[src]' is invalid")
});

static DATA_ATTRIBUTE_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    DATA_ATTRIBUTES
        .iter()
        .map(|attribute| {
            let selector = Selector::parse(&format!("[{attribute}]"))
                .expect("BUG: hardcoded data attribute selector is invalid");
            (*attribute, selector)
        })
        .collect()
});

/// Report whether `body` is a verification challenge rather than content.
///
/// Parses the body only when the quick scan finds an indicator.
#[must_use]
pub fn is_blocked(body: &str) -> bool {
    let lower = body.to_lowercase();
    if !has_quick_indicator(&lower) {
        return false;
    }
    let document = Html::parse_document(body);
    match structural_match(&lower, &document) {
        Some(reason) => {
            debug!(reason = %reason, "Verification challenge detected");
            true
        }
        None => false,
    }
}

/// Short description of the first structural match
fn structural_match(lower: &str, document: &Html) -> Option<String> {
    if let Some(element) = document.select(&WIDGETS).next() {
        return Some(format!("widget <{}>", element.value().name()));
    }

    for script in document.select(&SCRIPTS) {
        let src = script.value().attr("src").unwrap_or_default().to_lowercase();
        if SCRIPT_SOURCES.iter().any(|s| src.contains(s)) {
            return Some(format!("script {src}"));
        }
    }

    for iframe in document.select(&IFRAMES) {
        let src = iframe.value().attr("src").unwrap_or_default().to_lowercase();
        if IFRAME_SOURCES.iter().any(|s| src.contains(s)) {
            return Some(format!("iframe {src}"));
        }
    }

    for (attribute, selector) in DATA_ATTRIBUTE_SELECTORS.iter() {
        if document.select(selector).next().is_some() {
            return Some(format!("attribute {attribute}"));
        }
    }

    let phrase = VERIFICATION_PHRASES.iter().find(|p| lower.contains(*p))?;
    document
        .select(&PHRASE_WIDGETS)
        .next()
        .map(|_| format!("phrase '{phrase}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_page_is_not_blocked() {
        assert!(!is_blocked(
            "<html><body><h3><a href=\"/1\">CÔNG TY A</a></h3></body></html>"
        ));
    }

    #[test]
    fn test_prose_mention_is_not_blocked() {
        let html = "<html><body><p>Trang này dùng reCAPTCHA của Google.</p></body></html>";
        assert!(!is_blocked(html));
    }

    #[test]
    fn test_recaptcha_widget_is_blocked() {
        let html = r#"<html><body><div class="g-recaptcha" data-sitekey="abc"></div></body></html>"#;
        assert!(is_blocked(html));
    }

    #[test]
    fn test_widget_id_is_blocked() {
        let html = r#"<html><body><div id="GeeTest_Holder">x</div></body></html>"#;
        assert!(is_blocked(html));
    }

    #[test]
    fn test_script_and_iframe_sources() {
        let script = r#"<html><head><script src="https://static.geetest.com/static/gt.js"></script></head><body></body></html>"#;
        assert!(is_blocked(script));

        let iframe = r#"<html><body><iframe src="https://www.google.com/recaptcha/api2/anchor"></iframe></body></html>"#;
        assert!(is_blocked(iframe));
    }

    #[test]
    fn test_data_attribute_is_blocked() {
        let html = r#"<html><body><div data-widget-id="0">verify</div></body></html>"#;
        assert!(is_blocked(html));
    }

    #[test]
    fn test_phrase_needs_widget() {
        let prose = "<html><body><p>Please verify you are not a robot</p></body></html>";
        assert!(!is_blocked(prose));

        let with_widget = r#"<html><body><p>Please verify you are not a robot</p>
            <div class="hcaptcha-frame"></div></body></html>"#;
        assert!(is_blocked(with_widget));
    }

    #[test]
    fn test_selectors_compile() {
        Lazy::force(&WIDGETS);
        Lazy::force(&PHRASE_WIDGETS);
        assert_eq!(DATA_ATTRIBUTE_SELECTORS.len(), DATA_ATTRIBUTES.len());
    }

    #[test]
    fn test_case_insensitive_class_match() {
        let html = r#"<html><body><div class="Captcha-Box"></div><p>gt.js</p></body></html>"#;
        assert!(is_blocked(html));
    }
}
