//! Chunk type classification and one-line summaries.

use std::sync::LazyLock;

use docweave_shared::ChunkType;
use docweave_shared::syntax::{self, FenceTracker};
use regex::Regex;

/// Summary used when a chunk has no prose.
pub const NO_SUMMARY: &str = "No summary available.";

const MAX_SUMMARY_CHARS: usize = 100;

static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^.!?]+[.!?])").expect("valid regex"));

/// Classify `content` by its share of fenced and table lines.
///
/// Fence markers count as code lines.
pub fn classify(content: &str) -> ChunkType {
    let mut fences = FenceTracker::new();
    let (mut total, mut code, mut table) = (0usize, 0usize, 0usize);

    for line in content.lines() {
        total += 1;
        if fences.classify(line).is_code() {
            code += 1;
        } else if syntax::is_table_row(line) {
            table += 1;
        }
    }

    if total == 0 {
        return ChunkType::Prose;
    }
    let code_ratio = code as f64 / total as f64;
    let table_ratio = table as f64 / total as f64;

    if code_ratio > 0.5 {
        ChunkType::Code
    } else if table_ratio > 0.5 {
        ChunkType::Table
    } else if code_ratio > 0.2 {
        ChunkType::Mixed
    } else {
        ChunkType::Prose
    }
}

/// First sentence of `content` with heading lines removed, at most 100 chars.
pub fn summarize(content: &str) -> String {
    let text = content
        .lines()
        .filter(|line| syntax::parse_heading(line).is_none())
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();
    if text.is_empty() {
        return NO_SUMMARY.to_string();
    }

    let sentence = SENTENCE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str());
    let flat = sentence.split_whitespace().collect::<Vec<_>>().join(" ");

    if flat.chars().count() > MAX_SUMMARY_CHARS {
        format!(
            "{}...",
            syntax::truncate_chars(&flat, MAX_SUMMARY_CHARS - 3).trim_end()
        )
    } else {
        flat
    }
}

/// Whether `content` has any line besides headings and blanks.
pub fn has_body_text(content: &str) -> bool {
    content
        .lines()
        .any(|line| !line.trim().is_empty() && syntax::parse_heading(line).is_none())
}
