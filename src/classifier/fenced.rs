//! Stage 2: generic fences, untagged or tagged with the target language.

use super::fence;
use super::structured;
use super::ExtractedContent;
use crate::language::Language;

/// Separator between concatenated blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

/// Claims the input whenever it contains any fence at all. Fences for other
/// languages contribute nothing, so an answer fenced only in another
/// language yields empty code rather than falling through to line shapes.
pub(super) fn extract(raw: &str, language: &Language) -> Option<ExtractedContent> {
    let blocks = fence::scan(raw);
    let first = blocks.first()?;
    let tags = language.fence_tags();

    let matching: Vec<&fence::FencedBlock<'_>> = blocks
        .iter()
        .filter(|b| b.tag.is_empty() || tags.contains(&b.tag.as_str()))
        .collect();
    if matching.is_empty() {
        tracing::debug!(
            %language,
            fences = blocks.len(),
            "only fences for other languages"
        );
    }

    let code = matching
        .iter()
        .map(|b| b.body.trim())
        .filter(|body| !body.is_empty())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR);

    let explanation = structured::explanation_section(&blocks)
        .unwrap_or_else(|| preamble(&raw[..first.start]));

    Some(ExtractedContent::new(code.trim(), explanation))
}

/// Free text before the first fence, blank lines dropped.
fn preamble(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_html_fence_with_preamble() {
        let raw = "Here is the code:\n```html\n<button>Hi</button>\n```";
        let got = extract(raw, &Language::Markup).expect("fence");
        assert_eq!(got.code, "<button>Hi</button>");
        assert_eq!(got.explanation, "Here is the code:");
    }

    #[test]
    fn test_multiple_fences_joined_by_blank_line() {
        let raw = "```css\na { color: red; }\n```\nAnd then:\n```\nb { color: blue; }\n```";
        let got = extract(raw, &Language::Stylesheet).expect("fence");
        assert_eq!(got.code, "a { color: red; }\n\nb { color: blue; }");
    }

    #[test]
    fn test_other_language_fences_are_ignored() {
        let raw = "```python\nprint(1)\n```\n```js\nconsole.log(1);\n```";
        let got = extract(raw, &Language::Script).expect("fence");
        assert_eq!(got.code, "console.log(1);");
    }

    #[test]
    fn test_only_foreign_fences_claim_with_empty_code() {
        let raw = "Here is Python, not JS:\n```python\nx = compute()\nprint(x)\n```";
        let got = extract(raw, &Language::Script).expect("fence");
        assert_eq!(got.code, "");
        assert_eq!(got.explanation, "Here is Python, not JS:");
    }

    #[test]
    fn test_no_fences_passes() {
        assert!(extract("x = compute()\nprint(x)", &Language::Script).is_none());
    }

    #[test]
    fn test_preamble_drops_blank_lines() {
        let raw = "\n  First line.  \n\n\nSecond line.\n```\nx\n```";
        let got = extract(raw, &Language::Other("text".to_string())).expect("fence");
        assert_eq!(got.explanation, "First line.\nSecond line.");
    }

    #[test]
    fn test_explanation_section_takes_precedence_over_preamble() {
        let raw = "Intro words\n```html\n<p></p>\n```\n```EXPLANATION\nWhy it works.\n```";
        let got = extract(raw, &Language::Markup).expect("fence");
        assert_eq!(got.explanation, "Why it works.");
    }

    #[test]
    fn test_empty_matching_fence_claims_with_empty_code() {
        let got = extract("Nothing here\n```html\n\n```", &Language::Markup).expect("fence");
        assert_eq!(got.code, "");
        assert_eq!(got.explanation, "Nothing here");
    }
}
