//! Line-based scanner for fenced blocks in raw model output.
//!
//! An opener is a line whose trimmed start is a run of three or more
//! backticks or tildes, optionally followed by an info string. The first
//! word of the info string, lowercased, is the block's tag. A closer is a
//! line made only of the opener's fence character, at least as long as the
//! opener's run. A block left open at end of input (truncated responses are
//! common) runs to the end of the text.

/// Minimum fence run length.
const MIN_FENCE_LEN: usize = 3;

/// One fenced block found in raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Lowercased first word of the info string; empty when untagged.
    pub tag: String,
    /// Contents between the fence lines, untrimmed.
    pub body: &'a str,
    /// Byte offset of the opening fence line.
    pub start: usize,
    /// Whether a closing fence was seen.
    pub closed: bool,
}

#[derive(Debug)]
struct Opener {
    fence_char: char,
    fence_len: usize,
    tag: String,
    start: usize,
    body_start: usize,
}

/// Scan `text` and return every fenced block in document order.
pub fn scan(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<Opener> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        match &open {
            None => {
                if let Some((fence_char, fence_len, info)) = parse_opener(content) {
                    open = Some(Opener {
                        fence_char,
                        fence_len,
                        tag: tag_from_info(info),
                        start: line_start,
                        body_start: offset,
                    });
                }
            }
            Some(opener) => {
                if is_closer(content, opener.fence_char, opener.fence_len) {
                    blocks.push(FencedBlock {
                        tag: opener.tag.clone(),
                        body: &text[opener.body_start..line_start],
                        start: opener.start,
                        closed: true,
                    });
                    open = None;
                }
            }
        }
    }

    if let Some(opener) = open {
        blocks.push(FencedBlock {
            tag: opener.tag,
            body: &text[opener.body_start..],
            start: opener.start,
            closed: false,
        });
    }

    blocks
}

/// Whether a trimmed line is a bare fence marker of either kind.
pub fn is_fence_line(line: &str) -> bool {
    parse_opener(line).is_some()
}

fn parse_opener(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start();
    let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let fence_len = trimmed.chars().take_while(|c| *c == fence_char).count();
    if fence_len < MIN_FENCE_LEN {
        return None;
    }

    // fence_char is ASCII so the run length is also its byte length
    let info = &trimmed[fence_len..];
    if fence_char == '`' && info.contains('`') {
        // inline code span, not a fence
        return None;
    }
    Some((fence_char, fence_len, info))
}

fn is_closer(line: &str, fence_char: char, fence_len: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= fence_len && trimmed.chars().all(|c| c == fence_char)
}

fn tag_from_info(info: &str) -> String {
    info.split_whitespace()
        .next()
        .map(|word| word.trim_matches(|c| c == '{' || c == '}' || c == '.'))
        .unwrap_or("")
        .to_lowercase()
}
