//! Heading-level section splitting and large code block extraction.

use docweave_shared::syntax::{self, FenceTracker, LineClass};

/// Lines between two headings of the same level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading text, `None` for content before the first split heading.
    pub heading: Option<String>,
    /// Section lines without the heading line itself.
    pub content: String,
}

/// A slice of section content; `is_code` marks an extracted fenced block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub content: String,
    pub is_code: bool,
}

/// Split `body` at headings of exactly `level` outside fenced code.
///
/// A leading section without heading is only kept when it has content.
pub fn split_at_level(body: &str, level: u8) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading: Option<String> = None;
    let mut lines: Vec<&str> = Vec::new();
    let mut fences = FenceTracker::new();

    for line in body.lines() {
        let split_heading = match fences.classify(line) {
            LineClass::Text => syntax::parse_heading(line)
                .filter(|(l, _)| *l == level)
                .map(|(_, text)| text.to_string()),
            _ => None,
        };

        match split_heading {
            Some(text) => {
                push_section(&mut sections, heading.replace(text), &lines);
                lines.clear();
            }
            None => lines.push(line),
        }
    }
    push_section(&mut sections, heading, &lines);

    sections
}

fn push_section(sections: &mut Vec<Section>, heading: Option<String>, lines: &[&str]) {
    let content = lines.join("\n");
    if heading.is_some() || !content.trim().is_empty() {
        sections.push(Section { heading, content });
    }
}

/// Cut fenced blocks longer than `max_lines` content lines out of `content`.
///
/// Returns prose and code pieces in document order. Prose pieces are
/// trimmed and blank ones are dropped. Unclosed fences stay in the prose.
pub fn extract_large_code(content: &str, max_lines: usize) -> Vec<Piece> {
    let lines: Vec<&str> = content.lines().collect();
    let mut pieces = Vec::new();
    let mut fences = FenceTracker::new();
    let mut prose_start = 0;
    let mut open_at: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        match fences.classify(line) {
            LineClass::FenceOpen => open_at = Some(idx),
            LineClass::FenceClose => {
                if let Some(open) = open_at.take() {
                    if idx - open - 1 > max_lines {
                        push_piece(&mut pieces, &lines[prose_start..open], false);
                        push_piece(&mut pieces, &lines[open..=idx], true);
                        prose_start = idx + 1;
                    }
                }
            }
            LineClass::Text | LineClass::Code => {}
        }
    }
    push_piece(&mut pieces, &lines[prose_start..], false);

    pieces
}

fn push_piece(pieces: &mut Vec<Piece>, lines: &[&str], is_code: bool) {
    let joined = lines.join("\n");
    let content = if is_code {
        joined.trim_matches('\n')
    } else {
        joined.trim()
    };
    if !content.is_empty() {
        pieces.push(Piece {
            content: content.to_string(),
            is_code,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_h2_outside_fences() {
        let body = "# Title\n\nIntro.\n\n## One\n\nA.\n\n```md\n## not a split\n```\n\n## Two\n\nB.\n";
        let sections = split_at_level(body, 2);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].heading, None);
        assert!(sections[0].content.contains("Intro."));
        assert_eq!(sections[1].heading.as_deref(), Some("One"));
        assert!(sections[1].content.contains("## not a split"));
        assert!(!sections[1].content.contains("## One"));
        assert_eq!(sections[2].heading.as_deref(), Some("Two"));
    }

    #[test]
    fn empty_preamble_dropped() {
        let sections = split_at_level("\n\n### A\nx\n### B\ny", 3);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading.as_deref(), Some("A"));
    }

    #[test]
    fn large_fence_extracted() {
        let code: String = (0..5).map(|i| format!("line {i}\n")).collect();
        let content = format!("Before.\n\n```text\n{code}```\n\nAfter.\n\n```\nsmall\n```");
        let pieces = extract_large_code(&content, 3);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].content, "Before.");
        assert!(pieces[1].is_code);
        assert!(pieces[1].content.starts_with("```text\nline 0"));
        assert!(pieces[1].content.ends_with("```"));
        assert_eq!(pieces[2].content, "After.\n\n```\nsmall\n```");
        assert!(!pieces[2].is_code);
    }

    #[test]
    fn fence_at_threshold_stays_inline() {
        let content = "```\na\nb\nc\n```";
        let pieces = extract_large_code(content, 3);
        assert_eq!(pieces.len(), 1);
        assert!(!pieces[0].is_code);
    }
}
