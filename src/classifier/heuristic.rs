//! Stage 3: line-by-line classification for outputs without fences.
//!
//! Each trimmed line is either meta-commentary (skipped into the
//! explanation), code (per-language shape test), or prose. Comment-only
//! lines directly after code stay with the code run; comment lines directly
//! before code are attached to it as well.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fence;
use super::ExtractedContent;
use crate::language::Language;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Phrases models use to talk about the code rather than write it.
static META_COMMENTARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:here[’']?s|here (?:is|are)|this (?:code|snippet|example|will|creates|is|function|stylesheet|script|page)|the (?:code|above|following|snippet|function|result|output)|i(?:[’']ve| have| will)|you can|to (?:use|run|test)|in this|below is|above is|make sure|feel free|hope this)\b|let me\s+[a-z]|(?:notes?|explanation|first|next|then|finally|also)[:,]\s)",
    )
    .expect("META_COMMENTARY regex is valid")
});

/// Numbered list marker: `1.` or `2)`.
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s+\S").expect("NUMBERED_ITEM regex is valid"));

/// Bullet marker followed by at least two words. Only counts as commentary
/// when the line has no colon.
static BULLET_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-*•+]\s+\p{L}[\w'’-]*\s+\S").expect("BULLET_ITEM regex is valid")
});

/// Markdown heading.
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+\S").expect("HEADING regex is valid"));

/// `property: value;`
static CSS_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-\w]+\s*:\s*[^;]+;").expect("CSS_DECLARATION regex is valid"));

/// A selector-like token opening the line.
static CSS_SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[.#\[@:*][-\w]|[a-z][a-z0-9-]*(?:[:.#\[]\S*)?\s*(?:[,{>+~]|$))")
        .expect("CSS_SELECTOR regex is valid")
});

/// Declaration keywords at the start of a script line.
static JS_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:export\s+(?:default\s+)?)?(?:async\s+)?(?:function|var|let|const|class|return|import|throw|await)\b",
    )
    .expect("JS_KEYWORD regex is valid")
});

/// Arrow functions and console calls anywhere on the line.
static JS_INLINE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"=>|\bconsole\.(?:log|info|warn|error|debug|table)\s*\(")
        .expect("JS_INLINE_TOKEN regex is valid")
});

/// Control flow and block punctuation.
static JS_STRUCTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:if|for|while|switch|catch)\s*\(|^(?:try|do|else)\b\s*\{?\s*$|[{};]\s*$|^[}\])]")
        .expect("JS_STRUCTURE regex is valid")
});

/// Identifier followed by a call or assignment, then an optional terminator.
static JS_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*\s*(?:\(.*\)|\[.*\]\s*=.*|[-+*/%]?=[^=].*|\+\+|--)\s*;?$",
    )
    .expect("JS_STATEMENT regex is valid")
});

/// Conservative shape for languages without a dedicated test.
static GENERIC_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[{}\[\]<(]|[A-Za-z_]\w*(?:\s+[A-Za-z_]\w*)?\s*(?:[(=\[{<]|\.\w|:\s*$))")
        .expect("GENERIC_CODE regex is valid")
});

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

pub(super) fn extract(raw: &str, language: &Language) -> Option<ExtractedContent> {
    let mut code: Vec<&str> = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    // comment lines seen outside a code run, waiting to see what follows
    let mut pending_comments: Vec<&str> = Vec::new();
    let mut in_code = false;
    let mut in_block_comment = false;
    let (comment_open, comment_close) = block_comment_delimiters(language);

    for line in raw.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if in_code && code.last().is_some_and(|l| !l.trim().is_empty()) {
                code.push("");
            }
            continue;
        }

        if fence::is_fence_line(trimmed) {
            in_code = false;
            continue;
        }

        if in_block_comment || is_comment(trimmed, language) {
            if in_block_comment {
                in_block_comment = !trimmed.contains(comment_close);
            } else if let Some(rest) = trimmed.strip_prefix(comment_open) {
                in_block_comment = !rest.contains(comment_close);
            }
            if in_code {
                code.push(line.trim_end());
            } else {
                pending_comments.push(line.trim_end());
            }
            continue;
        }

        // a bullet-shaped line that also has the language's shape is code
        let list_shaped_code =
            BULLET_ITEM.is_match(trimmed) && looks_like_code(trimmed, language);
        if is_meta_commentary(trimmed) && !list_shaped_code {
            in_code = false;
            prose.extend(pending_comments.drain(..).map(str::trim));
            prose.push(trimmed);
            continue;
        }

        if looks_like_code(trimmed, language) {
            in_code = true;
            code.append(&mut pending_comments);
            code.push(line.trim_end());
            continue;
        }

        in_code = false;
        prose.extend(pending_comments.drain(..).map(str::trim));
        prose.push(trimmed);
    }
    prose.extend(pending_comments.drain(..).map(str::trim));

    Some(ExtractedContent::new(
        code.join("\n").trim(),
        prose.join("\n").trim(),
    ))
}

// ---------------------------------------------------------------------------
// Line tests
// ---------------------------------------------------------------------------

/// Meta-commentary cue: talk about the code, list items, headings.
pub fn is_meta_commentary(line: &str) -> bool {
    META_COMMENTARY.is_match(line)
        || NUMBERED_ITEM.is_match(line)
        || (BULLET_ITEM.is_match(line) && !line.contains(':'))
        || HEADING.is_match(line)
}

/// Opening and closing delimiters of the language's block comments.
fn block_comment_delimiters(language: &Language) -> (&'static str, &'static str) {
    match language {
        Language::Markup => ("<!--", "-->"),
        _ => ("/*", "*/"),
    }
}

/// Comment-only line in the given language.
pub fn is_comment(line: &str, language: &Language) -> bool {
    let (open, close) = block_comment_delimiters(language);
    if line.starts_with(open) || line.starts_with(close) {
        return true;
    }
    match language {
        Language::Script => line.starts_with("//"),
        Language::Other(_) => line.starts_with("//") || line.starts_with("--"),
        Language::Markup | Language::Stylesheet => false,
    }
}

/// Per-language shape test.
pub fn looks_like_code(line: &str, language: &Language) -> bool {
    match language {
        Language::Markup => {
            line.starts_with('<') || line.ends_with('>') || line.contains("/>")
        }
        Language::Stylesheet => {
            line.contains('{')
                || line.contains('}')
                || CSS_DECLARATION.is_match(line)
                || CSS_SELECTOR.is_match(line)
        }
        Language::Script => {
            JS_KEYWORD.is_match(line)
                || JS_INLINE_TOKEN.is_match(line)
                || JS_STRUCTURE.is_match(line)
                || JS_STATEMENT.is_match(line)
        }
        Language::Other(_) => GENERIC_CODE.is_match(line),
    }
}
