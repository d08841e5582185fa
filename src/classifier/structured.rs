//! Stage 1: the explicit two-block format.
//!
//! Models can be instructed to answer with one fence tagged `CODE` and one
//! tagged `EXPLANATION`. When the code section is present it wins over
//! every other fence in the text.

use super::fence;
use super::ExtractedContent;
use crate::language::Language;

/// Reserved tag of the machine-readable code section.
pub const CODE_TAG: &str = "code";

/// Reserved tag of the machine-readable explanation section.
pub const EXPLANATION_TAG: &str = "explanation";

pub(super) fn extract(raw: &str, _language: &Language) -> Option<ExtractedContent> {
    let blocks = fence::scan(raw);
    let code = blocks.iter().find(|b| b.tag == CODE_TAG)?;
    let explanation = explanation_section(&blocks).unwrap_or_default();

    Some(ExtractedContent::new(code.body.trim(), explanation))
}

/// Trimmed contents of the first explanation-tagged block, if any.
pub(super) fn explanation_section(blocks: &[fence::FencedBlock<'_>]) -> Option<String> {
    blocks
        .iter()
        .find(|b| b.tag == EXPLANATION_TAG)
        .map(|b| b.body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_explanation_sections() {
        let raw = "```CODE\n<h1>Title</h1>\n```\n\n```EXPLANATION\nA heading.\n```";
        let got = extract(raw, &Language::Markup).expect("code section");
        assert_eq!(got.code, "<h1>Title</h1>");
        assert_eq!(got.explanation, "A heading.");
    }

    #[test]
    fn test_code_section_without_explanation() {
        let got = extract("```code\nbody {}\n```", &Language::Stylesheet).expect("code section");
        assert_eq!(got.code, "body {}");
        assert_eq!(got.explanation, "");
    }

    #[test]
    fn test_explanation_before_code_section() {
        let raw = "```EXPLANATION\nFirst.\n```\n```CODE\nlet a = 1;\n```";
        let got = extract(raw, &Language::Script).expect("code section");
        assert_eq!(got.code, "let a = 1;");
        assert_eq!(got.explanation, "First.");
    }

    #[test]
    fn test_no_code_section_passes() {
        assert!(extract("```html\n<p></p>\n```", &Language::Markup).is_none());
        assert!(extract("```EXPLANATION\nonly words\n```", &Language::Markup).is_none());
    }

    #[test]
    fn test_empty_code_section_still_claims_input() {
        let got = extract("```CODE\n\n```\n```html\n<p></p>\n```", &Language::Markup)
            .expect("code section");
        assert_eq!(got.code, "");
    }
}
