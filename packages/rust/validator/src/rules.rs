//! The structural rule table.
//!
//! Each rule is a pure function over one rendered document. A rule returns
//! `None` when the document passes and a message when it does not.

use std::collections::BTreeSet;

use docweave_markdown::METADATA_OPEN;
use docweave_shared::syntax::{self, FenceTracker, LineClass};
use docweave_shared::{Frontmatter, FrontmatterValue};
use serde::{Deserialize, Serialize};

/// Frontmatter fields every output document must carry.
pub const REQUIRED_FIELDS: &[&str] = &["id", "title", "category", "tags"];

/// Documents should carry at least this many tags.
pub const MIN_TAGS: usize = 3;

/// Whether a failing rule fails the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One rendered document as seen by the rules.
#[derive(Debug, Clone)]
pub struct Subject<'a> {
    pub file: &'a str,
    /// Full file content.
    pub content: &'a str,
    /// Parsed frontmatter, `None` when the block is missing.
    pub frontmatter: Option<Frontmatter>,
    /// Content after the frontmatter block.
    pub body: &'a str,
    /// Link targets that resolve inside the output tree.
    pub known_targets: &'a BTreeSet<String>,
}

/// A validation rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub check: fn(&Subject<'_>) -> Option<String>,
}

/// All rules, in report order.
pub static RULES: [Rule; 14] = [
    Rule {
        id: "V001",
        description: "exactly one H1 heading",
        severity: Severity::Error,
        check: single_h1,
    },
    Rule {
        id: "V002",
        description: "frontmatter block present",
        severity: Severity::Error,
        check: frontmatter_present,
    },
    Rule {
        id: "V003",
        description: "required frontmatter fields present",
        severity: Severity::Error,
        check: required_fields,
    },
    Rule {
        id: "V004",
        description: "no skipped heading levels",
        severity: Severity::Error,
        check: no_level_skips,
    },
    Rule {
        id: "V005",
        description: "internal link targets exist",
        severity: Severity::Warning,
        check: links_resolve,
    },
    Rule {
        id: "V006",
        description: "at least three tags",
        severity: Severity::Warning,
        check: enough_tags,
    },
    Rule {
        id: "V007",
        description: "context block present",
        severity: Severity::Warning,
        check: context_present,
    },
    Rule {
        id: "V008",
        description: "See Also section present",
        severity: Severity::Warning,
        check: see_also_present,
    },
    Rule {
        id: "V009",
        description: "code fences declare a language",
        severity: Severity::Warning,
        check: fences_labeled,
    },
    Rule {
        id: "V010",
        description: "metadata block inside an HTML comment",
        severity: Severity::Error,
        check: metadata_block_present,
    },
    Rule {
        id: "V011",
        description: "estimated reading time present",
        severity: Severity::Warning,
        check: reading_time_present,
    },
    Rule {
        id: "V012",
        description: "entities cross-check",
        severity: Severity::Warning,
        check: always_pass,
    },
    Rule {
        id: "V013",
        description: "DAG cross-check",
        severity: Severity::Warning,
        check: always_pass,
    },
    Rule {
        id: "V014",
        description: "document ID cross-check",
        severity: Severity::Warning,
        check: always_pass,
    },
];

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn single_h1(s: &Subject<'_>) -> Option<String> {
    let count = syntax::headings(s.body)
        .iter()
        .filter(|h| h.level == 1)
        .count();
    (count != 1).then(|| format!("expected exactly one H1 heading, found {count}"))
}

fn frontmatter_present(s: &Subject<'_>) -> Option<String> {
    s.frontmatter
        .is_none()
        .then(|| "missing frontmatter block".to_string())
}

fn required_fields(s: &Subject<'_>) -> Option<String> {
    let fm = s.frontmatter.as_ref()?;
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !fm.contains_key(*field))
        .collect();
    (!missing.is_empty()).then(|| format!("missing frontmatter fields: {}", missing.join(", ")))
}

fn no_level_skips(s: &Subject<'_>) -> Option<String> {
    let headings = syntax::headings(s.body);
    headings.windows(2).find_map(|pair| {
        (pair[1].level > pair[0].level + 1).then(|| {
            format!(
                "heading level jumps from H{} to H{} at line {}",
                pair[0].level, pair[1].level, pair[1].line
            )
        })
    })
}

/// Path part of a link target: first token, anchor removed.
pub fn link_path(target: &str) -> &str {
    let token = target.split_whitespace().next().unwrap_or_default();
    token.split('#').next().unwrap_or_default()
}

fn links_resolve(s: &Subject<'_>) -> Option<String> {
    let broken: Vec<String> = syntax::links(s.body)
        .into_iter()
        .filter(|l| l.is_internal && !l.target.starts_with('#'))
        .filter(|l| !s.known_targets.contains(link_path(&l.target)))
        .map(|l| l.target)
        .collect();
    (!broken.is_empty()).then(|| format!("unresolved internal links: {}", broken.join(", ")))
}

fn enough_tags(s: &Subject<'_>) -> Option<String> {
    let count = match s.frontmatter.as_ref().and_then(|fm| fm.get("tags")) {
        Some(FrontmatterValue::List(tags)) => tags.len(),
        Some(FrontmatterValue::Text(text)) if !text.trim().is_empty() => 1,
        _ => 0,
    };
    (count < MIN_TAGS).then(|| format!("expected at least {MIN_TAGS} tags, found {count}"))
}

fn context_present(s: &Subject<'_>) -> Option<String> {
    (!s.body.contains("> **Context**:")).then(|| "missing context block".to_string())
}

fn see_also_present(s: &Subject<'_>) -> Option<String> {
    let found = syntax::headings(s.body)
        .iter()
        .any(|h| h.level == 2 && h.text.eq_ignore_ascii_case("see also"));
    (!found).then(|| "missing See Also section".to_string())
}

fn fences_labeled(s: &Subject<'_>) -> Option<String> {
    let mut fences = FenceTracker::new();
    let unlabeled: Vec<String> = s
        .body
        .lines()
        .enumerate()
        .filter(|(_, line)| fences.classify(line) == LineClass::FenceOpen)
        .filter(|(_, line)| syntax::fence_language(line).is_none())
        .map(|(idx, _)| (idx + 1).to_string())
        .collect();
    (!unlabeled.is_empty()).then(|| {
        format!(
            "code fences without a language at lines {}",
            unlabeled.join(", ")
        )
    })
}

fn metadata_block_present(s: &Subject<'_>) -> Option<String> {
    let found = s.content.find("<!--").is_some_and(|start| {
        let rest = &s.content[start..];
        match (rest.find(METADATA_OPEN), rest.find("</doc_metadata>"), rest.find("-->")) {
            (Some(open), Some(close), Some(end)) => open < close && close < end,
            _ => false,
        }
    });
    (!found).then(|| "missing <doc_metadata> block in an HTML comment".to_string())
}

fn reading_time_present(s: &Subject<'_>) -> Option<String> {
    (!s.content.contains("<estimated_reading_time>"))
        .then(|| "missing <estimated_reading_time> field".to_string())
}

fn always_pass(_: &Subject<'_>) -> Option<String> {
    None
}
