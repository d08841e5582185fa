//! # Stage: PreviewDocumentBuilder
//!
//! ## Responsibility
//! Turn extracted code into a complete, self-contained document that an
//! isolated rendering surface can load as-is.
//!
//! ## Guarantees
//! - Pure: no I/O, no global state
//! - Returns `None` (never an error) for blank code or a language without a
//!   preview builder
//! - Embedded code can never terminate the `<style>` or `<script>` element
//!   it is placed in
//! - Script previews report thrown exceptions, syntax errors and unhandled
//!   rejections in the document's own output region
//!
//! ## NOT Responsible For
//! - Validating the code
//! - Resource lifetime (see [`crate::registry`])

pub mod templates;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::language::Language;

/// Default document title.
pub const DEFAULT_TITLE: &str = "Preview";

static ROOT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!doctype\b|<html(?:[\s>/]|$)").expect("root marker regex is valid"));

static STYLE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(style)").expect("style close regex is valid"));

// ---------------------------------------------------------------------------
// PreviewDocument
// ---------------------------------------------------------------------------

/// A complete renderable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PreviewDocument(String);

impl PreviewDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PreviewDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PreviewDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Presentation options shared by every generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOptions {
    pub title: String,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Build a preview document with default options.
pub fn build_preview(code: &str, language: &Language) -> Option<PreviewDocument> {
    build_preview_with(code, language, &PreviewOptions::default())
}

/// Build a preview document.
///
/// `None` means "no preview available" and is not a failure.
pub fn build_preview_with(
    code: &str,
    language: &Language,
    options: &PreviewOptions,
) -> Option<PreviewDocument> {
    if code.trim().is_empty() {
        return None;
    }

    let title = escape_html(&options.title);
    let document = match language {
        Language::Markup => markup(code, &title),
        Language::Stylesheet => stylesheet(code, &title),
        Language::Script => script(code, &title),
        Language::Other(_) => return None,
    };

    tracing::trace!(%language, bytes = document.len(), "built preview document");
    Some(PreviewDocument(document))
}

/// Whether markup already is a full document.
pub fn is_full_document(code: &str) -> bool {
    ROOT_MARKER.is_match(code)
}

fn markup(code: &str, title: &str) -> String {
    if is_full_document(code) {
        return code.to_string();
    }
    templates::fill(templates::MARKUP_SHELL, &[("title", title), ("code", code)])
}

fn stylesheet(code: &str, title: &str) -> String {
    let rules = STYLE_CLOSE.replace_all(code, r"<\/$1");
    templates::fill(
        templates::STYLESHEET_DEMO,
        &[("title", title), ("code", rules.as_ref())],
    )
}

fn script(code: &str, title: &str) -> String {
    let source = script_literal(code);
    templates::fill(
        templates::SCRIPT_HARNESS,
        &[("title", title), ("source", &source)],
    )
}

/// Encode `code` as a JavaScript string literal that is safe to place
/// inside a `<script>` element.
pub fn script_literal(code: &str) -> String {
    // Serializing a &str cannot fail.
    let json = serde_json::to_string(code).unwrap_or_else(|_| String::from("\"\""));
    json.replace("</", r"<\/").replace("<!--", r"<\u0021--")
}

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Language::Markup)]
    #[case(Language::Stylesheet)]
    #[case(Language::Script)]
    fn test_blank_code_has_no_preview(#[case] lang: Language) {
        assert!(build_preview("", &lang).is_none());
        assert!(build_preview(" \n\t", &lang).is_none());
    }

    #[test]
    fn test_other_language_has_no_preview() {
        assert!(build_preview("class A(Scene): pass", &Language::from_identifier("manim")).is_none());
    }

    #[rstest]
    #[case("<!DOCTYPE html><html><body>x</body></html>")]
    #[case("<!doctype html>\n<p>lower</p>")]
    #[case("<HTML lang=\"en\"><body></body></HTML>")]
    fn test_full_markup_is_verbatim(#[case] code: &str) {
        let doc = build_preview(code, &Language::Markup).expect("document");
        assert_eq!(doc.as_str(), code);
    }

    #[test]
    fn test_markup_fragment_is_wrapped() {
        let doc = build_preview("<button>Hi</button>", &Language::Markup).expect("document");
        let html = doc.as_str();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta charset=\"UTF-8\">"));
        assert!(html.contains("name=\"viewport\""));
        let body = &html[html.find("<body>").expect("body")..];
        assert!(body.contains("<button>Hi</button>"));
    }

    #[test]
    fn test_htmlx_element_is_not_a_root_marker() {
        assert!(!is_full_document("<htmlx-widget></htmlx-widget>"));
    }

    #[test]
    fn test_hyphenated_custom_element_is_wrapped() {
        assert!(!is_full_document("<html-viewer src=\"a\"></html-viewer>"));
        let doc = build_preview("<html-viewer></html-viewer>", &Language::Markup)
            .expect("document");
        assert!(doc.as_str().starts_with("<!DOCTYPE html>"));
        assert!(doc.as_str().contains("<body>\n<html-viewer></html-viewer>\n</body>"));
    }

    #[test]
    fn test_html_root_variants_are_documents() {
        assert!(is_full_document("<html>\n<body></body>\n</html>"));
        assert!(is_full_document("<HTML lang=\"en\"></HTML>"));
        assert!(is_full_document("<!doctype html><p>x</p>"));
    }

    #[test]
    fn test_stylesheet_has_fixture_and_rules() {
        let doc = build_preview("body { color: red; }", &Language::Stylesheet).expect("document");
        let html = doc.as_str();
        let style = &html[html.find("<style>").expect("style")..html.find("</style>").expect("end")];
        assert!(style.contains("color: red"));
        for marker in ["<h1>", "<p>", "<button", "class=\"box\"", "<label", "<a href"] {
            assert!(html.contains(marker), "missing {marker}");
        }
    }

    #[test]
    fn test_stylesheet_cannot_close_style_element() {
        let doc = build_preview("a{}</STYLE><script>x()</script>", &Language::Stylesheet)
            .expect("document");
        assert_eq!(doc.as_str().matches("</style>").count(), 1);
        assert!(!doc.as_str().to_lowercase().contains("</style><script>"));
    }

    #[test]
    fn test_script_is_embedded_as_literal() {
        let doc = build_preview("console.log(\"hi\");", &Language::Script).expect("document");
        assert!(doc.as_str().contains(r#"(0, eval)("console.log(\"hi\");");"#));
    }

    #[test]
    fn test_script_cannot_close_script_element() {
        let code = "const s = '</script><img src=x onerror=alert(1)>'; // <!-- x";
        let doc = build_preview(code, &Language::Script).expect("document");
        assert_eq!(doc.as_str().matches("</script>").count(), 1);
        assert!(!doc.as_str().contains("<!-- x"));
    }

    #[test]
    fn test_script_literal_round_trips_through_json() {
        let code = "a </b> <!-- c \u{2028} \"q\"";
        let literal = script_literal(code);
        let back: String = serde_json::from_str(&literal).expect("valid json");
        assert_eq!(back, code);
    }

    #[test]
    fn test_title_is_escaped() {
        let opts = PreviewOptions {
            title: "<Model & \"A\">".to_string(),
        };
        let doc = build_preview_with("<p></p>", &Language::Markup, &opts).expect("document");
        assert!(doc.as_str().contains("<title>&lt;Model &amp; &quot;A&quot;&gt;</title>"));
    }

    #[test]
    fn test_code_with_placeholder_text_is_literal() {
        let doc = build_preview("<p>{{title}}</p>", &Language::Markup).expect("document");
        assert!(doc.as_str().contains("<p>{{title}}</p>"));
        assert!(doc.as_str().contains("<title>Preview</title>"));
    }

    #[test]
    fn test_document_accessors() {
        let doc = build_preview("<p>x</p>", &Language::Markup).expect("document");
        assert_eq!(doc.len(), doc.as_str().len());
        assert!(!doc.is_empty());
        assert_eq!(doc.to_string(), doc.clone().into_string());
    }
}
