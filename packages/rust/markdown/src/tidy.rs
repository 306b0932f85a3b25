//! Final whitespace normalization applied to every transformed body.
//!
//! Each pass is a function `&str -> String` applied in sequence. Lines inside
//! fenced code are never touched.

use docweave_shared::syntax::{FenceTracker, LineClass};

/// Most consecutive blank lines kept outside fenced code.
const MAX_BLANK_RUN: usize = 2;

/// Run all whitespace passes.
pub(crate) fn tidy(md: &str) -> String {
    let mut result = normalize_line_endings(md);
    result = trim_trailing_whitespace(&result);
    result = collapse_blank_lines(&result);
    ensure_trailing_newline(&result)
}

fn normalize_line_endings(md: &str) -> String {
    md.replace("\r\n", "\n")
}

/// Strip trailing whitespace from every line outside fenced code.
fn trim_trailing_whitespace(md: &str) -> String {
    let mut fences = FenceTracker::new();
    md.split('\n')
        .map(|line| match fences.classify(line) {
            LineClass::Code => line,
            _ => line.trim_end(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse runs of 3+ blank lines outside fenced code into exactly 2.
fn collapse_blank_lines(md: &str) -> String {
    let mut fences = FenceTracker::new();
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;

    for line in md.split('\n') {
        let class = fences.classify(line);
        if class == LineClass::Text && line.trim().is_empty() {
            blank_run += 1;
            if blank_run > MAX_BLANK_RUN {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }

    out.join("\n")
}

/// Ensure the text ends with exactly one newline.
fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    format!("{trimmed}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_excess_blank_lines() {
        assert_eq!(collapse_blank_lines("Line 1\n\n\n\n\nLine 2"), "Line 1\n\n\nLine 2");
        assert_eq!(collapse_blank_lines("Line 1\n\nLine 2"), "Line 1\n\nLine 2");
    }

    #[test]
    fn trims_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("Line 1   \nLine 2\t\nLine 3"),
            "Line 1\nLine 2\nLine 3"
        );
    }

    #[test]
    fn full_tidy() {
        assert_eq!(tidy("# T  \r\n\r\n\r\n\r\n\r\nText\n\n\n"), "# T\n\n\nText\n");
    }

    #[test]
    fn fenced_code_is_left_verbatim() {
        let md = "# T\n\n```text\nline  \n\n\n\n\nend\n```\n";
        assert_eq!(tidy(md), md);

        let md = "Intro  \n\n\n\n\n```sh\necho hi   \n\n\n\n```\n\n\n\n\nOutro\t\n";
        assert_eq!(
            tidy(md),
            "Intro\n\n\n```sh\necho hi   \n\n\n\n```\n\n\nOutro\n"
        );
    }
}
