//! Line-level markdown grammar shared by every stage.
//!
//! Headings, links, and table rows are only recognised outside fenced code.
//! A fence is any line whose trimmed start is three backticks.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::types::{Heading, Link};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));

static SLUG_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\s]+").expect("valid regex"));

static SLUG_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("valid regex"));

static TABLE_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)*\|?\s*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Fences
// ---------------------------------------------------------------------------

/// How a line relates to fenced code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Text,
    FenceOpen,
    FenceClose,
    Code,
}

impl LineClass {
    /// Fence markers and fenced content both count as code.
    pub fn is_code(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Tracks fence state across consecutive lines.
#[derive(Debug, Default, Clone)]
pub struct FenceTracker {
    open: bool,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `line` and advance the fence state.
    pub fn classify(&mut self, line: &str) -> LineClass {
        if is_fence(line) {
            self.open = !self.open;
            if self.open {
                LineClass::FenceOpen
            } else {
                LineClass::FenceClose
            }
        } else if self.open {
            LineClass::Code
        } else {
            LineClass::Text
        }
    }

    /// Whether a fence is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Whether `line` opens or closes a fenced block.
pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Language label of an opening fence line, if any.
pub fn fence_language(line: &str) -> Option<&str> {
    let rest = line.trim_start().trim_start_matches('`').trim();
    (!rest.is_empty()).then_some(rest)
}

// ---------------------------------------------------------------------------
// Headings
// ---------------------------------------------------------------------------

/// Parse a single heading line into `(level, text)`.
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let caps = HEADING_RE.captures(line)?;
    let level = caps.get(1)?.as_str().len() as u8;
    let text = caps.get(2)?.as_str().trim();
    Some((level, text))
}

/// All headings of `body` outside fenced code, in order.
pub fn headings(body: &str) -> Vec<Heading> {
    let mut fences = FenceTracker::new();
    body.lines()
        .enumerate()
        .filter(|(_, line)| fences.classify(line) == LineClass::Text)
        .filter_map(|(idx, line)| {
            parse_heading(line).map(|(level, text)| Heading {
                level,
                text: text.to_string(),
                line: idx + 1,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Whether a link target is an absolute URL (`https:`, `mailto:`, ...).
pub fn is_external(target: &str) -> bool {
    Url::parse(target).is_ok()
}

/// Byte ranges and captures of every non-image link on one line.
pub fn line_links(line: &str) -> Vec<(std::ops::Range<usize>, &str, &str)> {
    LINK_RE
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if whole.start() > 0 && line.as_bytes()[whole.start() - 1] == b'!' {
                return None;
            }
            Some((whole.range(), caps.get(1)?.as_str(), caps.get(2)?.as_str()))
        })
        .collect()
}

/// All links of `body` outside fenced code, images excluded.
pub fn links(body: &str) -> Vec<Link> {
    let mut fences = FenceTracker::new();
    let mut found = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        if fences.classify(line) != LineClass::Text {
            continue;
        }
        for (_, text, target) in line_links(line) {
            let target = target.trim();
            found.push(Link {
                text: text.to_string(),
                target: target.to_string(),
                line: idx + 1,
                is_internal: !is_external(target),
            });
        }
    }
    found
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether `line` is a markdown table row.
pub fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Whether `body` contains a table separator row (`|---|---|`) outside fences.
pub fn has_table(body: &str) -> bool {
    let mut fences = FenceTracker::new();
    body.lines().any(|line| {
        fences.classify(line) == LineClass::Text
            && line.contains('-')
            && line.contains('|')
            && TABLE_SEPARATOR_RE.is_match(line)
    })
}

/// Filename-style slug: lowercase, `_`/whitespace runs to `-`, other symbols removed.
pub fn slugify(text: &str, max_chars: usize) -> String {
    let lower = text.to_lowercase();
    let dashed = SLUG_SEPARATOR_RE.replace_all(&lower, "-");
    let stripped = SLUG_STRIP_RE.replace_all(&dashed, "");
    truncate_chars(&stripped, max_chars).to_string()
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `text` cut to `max_chars`, with `...` appended when something was removed.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let cut = truncate_chars(text, max_chars);
    if cut.len() < text.len() {
        format!("{}...", cut.trim_end())
    } else {
        text.to_string()
    }
}
