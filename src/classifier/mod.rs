//! # Stage: ContentClassifier
//!
//! ## Responsibility
//! Split raw, unstructured model output into a `code` portion and an
//! advisory `explanation` portion for a target content language.
//!
//! The work is an ordered chain of stages with one uniform signature,
//! `(raw, language) -> Option<ExtractedContent>`, tried in order until one
//! claims the input:
//!
//! 1. `structured`: a fence tagged `CODE` (plus optional `EXPLANATION`)
//! 2. `fenced`: untagged fences or fences tagged for the target language
//! 3. `heuristic`: line-by-line shape tests, used only when no fence of
//!    either kind matched
//!
//! ## Guarantees
//! - Pure and deterministic: same `(raw, language)` in, same value out
//! - Never panics and never fails; absent input gives empty code
//! - Stage order is fixed: an explicit two-block answer always wins over
//!   coincidental generic fences in the same text
//!
//! ## NOT Responsible For
//! - Validating that the extracted code parses
//! - Persisting results (always re-derived from the raw output)

pub mod fence;
mod fenced;
pub mod heuristic;
mod structured;

use serde::{Deserialize, Serialize};

use crate::language::Language;

pub use structured::{CODE_TAG, EXPLANATION_TAG};

// ---------------------------------------------------------------------------
// ExtractedContent
// ---------------------------------------------------------------------------

/// Code and commentary recovered from one model output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub code: String,
    /// Advisory; may legitimately be empty.
    pub explanation: String,
}

impl ExtractedContent {
    pub fn new(code: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            explanation: explanation.into(),
        }
    }

    /// True when no code was found (the ExtractionEmpty condition).
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Stage chain
// ---------------------------------------------------------------------------

struct Stage {
    name: &'static str,
    run: fn(&str, &Language) -> Option<ExtractedContent>,
}

const STAGES: &[Stage] = &[
    Stage {
        name: "structured",
        run: structured::extract,
    },
    Stage {
        name: "fenced",
        run: fenced::extract,
    },
    Stage {
        name: "heuristic",
        run: heuristic::extract,
    },
];

/// Names of the stages in the order they are tried.
pub fn stage_names() -> Vec<&'static str> {
    STAGES.iter().map(|s| s.name).collect()
}

/// Classify raw model output for `language`.
pub fn classify(raw: Option<&str>, language: &Language) -> ExtractedContent {
    let Some(raw) = raw else {
        return ExtractedContent::default();
    };
    if raw.trim().is_empty() {
        return ExtractedContent::default();
    }

    for stage in STAGES {
        if let Some(content) = (stage.run)(raw, language) {
            tracing::trace!(
                stage = stage.name,
                %language,
                code_len = content.code.len(),
                "classified model output"
            );
            return content;
        }
    }

    ExtractedContent::default()
}
