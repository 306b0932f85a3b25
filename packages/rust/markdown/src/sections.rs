//! Context callout and "See Also" section insertion.

use docweave_shared::syntax::{self, FenceTracker, LineClass};

/// Only this many leading characters are searched for an existing callout.
const CONTEXT_SEARCH_CHARS: usize = 500;

/// Context callouts quote at most this many characters of the first paragraph.
const CONTEXT_MAX_CHARS: usize = 150;

/// See Also lists at most this many links.
pub const MAX_SEE_ALSO: usize = 5;

/// Target of the See Also fallback entry, relative to `docs/`.
pub const INDEX_LINK_TARGET: &str = "../COMPASS.md";

/// Whether a context callout appears near the top of `body`.
pub fn has_context(body: &str) -> bool {
    let head = syntax::truncate_chars(body, CONTEXT_SEARCH_CHARS);
    head.contains("**Context**") || head.contains("Context:")
}

/// Insert `> **Context**: ...` after the first H1 unless one already exists.
pub fn insert_context(body: &str, first_paragraph: &str) -> String {
    let paragraph = first_paragraph.trim();
    if paragraph.is_empty() || has_context(body) {
        return body.to_string();
    }
    let callout = format!(
        "> **Context**: {}",
        syntax::truncate_with_ellipsis(paragraph, CONTEXT_MAX_CHARS)
    );

    let lines: Vec<&str> = body.lines().collect();
    let mut fences = FenceTracker::new();
    let h1_index = lines.iter().position(|line| {
        fences.classify(line) == LineClass::Text
            && matches!(syntax::parse_heading(line), Some((1, _)))
    });

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 3);
    let rest = match h1_index {
        Some(idx) => {
            out.extend_from_slice(&lines[..=idx]);
            out.push("");
            &lines[idx + 1..]
        }
        None => &lines[..],
    };
    out.push(&callout);
    out.push("");
    out.extend(rest.iter().skip_while(|line| line.trim().is_empty()));

    let mut joined = out.join("\n");
    joined.push('\n');
    joined
}

/// Whether `body` has a `See Also` heading outside fenced code.
pub fn has_see_also(body: &str) -> bool {
    syntax::headings(body)
        .iter()
        .any(|h| h.text.trim().eq_ignore_ascii_case("see also"))
}

/// Append a `## See Also` section listing `entries` as `(text, target)` pairs.
///
/// With no entries a single link to the documentation index is listed.
/// Bodies that already have a See Also section are returned unchanged.
pub fn append_see_also(body: &str, entries: &[(String, String)]) -> String {
    if has_see_also(body) {
        return body.to_string();
    }

    let mut out = body.trim_end().to_string();
    out.push_str("\n\n## See Also\n\n");
    if entries.is_empty() {
        out.push_str(&format!("- [Documentation Index]({INDEX_LINK_TARGET})\n"));
    } else {
        for (text, target) in entries.iter().take(MAX_SEE_ALSO) {
            out.push_str(&format!("- [{text}]({target})\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_inserted_after_h1() {
        let body = "# Setup\n\nInstall the tool first.\n";
        let out = insert_context(body, "Install the tool first.");
        assert_eq!(
            out,
            "# Setup\n\n> **Context**: Install the tool first.\n\nInstall the tool first.\n"
        );
    }

    #[test]
    fn context_truncated_and_not_duplicated() {
        let long = "word ".repeat(60);
        let out = insert_context("# T\n\nbody\n", &long);
        let callout = out.lines().nth(2).expect("callout line");
        assert!(callout.starts_with("> **Context**: word"));
        assert!(callout.ends_with("..."));

        assert_eq!(insert_context(&out, &long), out);
    }

    #[test]
    fn context_skipped_without_paragraph() {
        assert_eq!(insert_context("# T\n", ""), "# T\n");
    }

    #[test]
    fn see_also_lists_entries() {
        let entries = vec![
            ("API".to_string(), "./ref-general-api.md".to_string()),
            ("Missing".to_string(), "missing.md".to_string()),
        ];
        let out = append_see_also("# T\n\nText.\n\n", &entries);
        assert_eq!(
            out,
            "# T\n\nText.\n\n## See Also\n\n- [API](./ref-general-api.md)\n- [Missing](missing.md)\n"
        );
    }

    #[test]
    fn see_also_fallback_and_existing() {
        let out = append_see_also("# T\n", &[]);
        assert!(out.ends_with("- [Documentation Index](../COMPASS.md)\n"));

        let existing = "# T\n\n## See also\n\n- [x](y.md)\n";
        assert_eq!(append_see_also(existing, &[]), existing);
    }
}
