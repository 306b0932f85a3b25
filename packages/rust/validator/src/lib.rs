//! Structural validation of rendered output documents.
//!
//! [`validate_document`] runs every rule in [`RULES`] against one file.
//! [`validate_all`] aggregates the per-file results into a
//! [`ValidationReport`]. A document fails only when an error-severity rule
//! fails; warnings are counted but do not change pass status.

mod rules;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use docweave_discovery::{parse_frontmatter, split_frontmatter};
use docweave_markdown::INDEX_LINK_TARGET;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub use rules::{MIN_TAGS, REQUIRED_FIELDS, RULES, Rule, Severity, Subject, link_path};

/// Navigation page link targets, relative to `docs/`.
pub const QUICKREF_LINK_TARGET: &str = "../QUICKREF.md";

// ---------------------------------------------------------------------------
// Report records
// ---------------------------------------------------------------------------

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    /// What the rule checks, from [`Rule::description`].
    pub description: String,
    pub message: String,
}

/// Rule results for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub passed: bool,
    pub errors: Vec<Violation>,
    pub warnings: Vec<Violation>,
    /// IDs of the rules that passed, used for the per-rule tally.
    #[serde(skip)]
    pub passed_rules: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub files_checked: usize,
    pub files_passed: usize,
    pub files_failed: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTally {
    pub passed: usize,
    pub failed: usize,
}

/// Content of `validation_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub by_rule: BTreeMap<String, RuleTally>,
    /// Files with at least one error or warning.
    pub failures: Vec<FileReport>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Link targets that resolve from inside `docs/`: every output file plus the
/// navigation pages.
pub fn known_targets<'a>(output_filenames: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    let mut targets: BTreeSet<String> = output_filenames
        .into_iter()
        .map(|name| format!("./{name}"))
        .collect();
    targets.insert(INDEX_LINK_TARGET.to_string());
    targets.insert(QUICKREF_LINK_TARGET.to_string());
    targets
}

/// Run every rule against one rendered document.
pub fn validate_document(file: &str, content: &str, known: &BTreeSet<String>) -> FileReport {
    let (block, body) = split_frontmatter(content);
    let subject = Subject {
        file,
        content,
        frontmatter: block.map(parse_frontmatter),
        body,
        known_targets: known,
    };

    let mut report = FileReport {
        file: file.to_string(),
        passed: true,
        errors: Vec::new(),
        warnings: Vec::new(),
        passed_rules: Vec::new(),
    };

    for rule in &RULES {
        match (rule.check)(&subject) {
            None => report.passed_rules.push(rule.id),
            Some(message) => {
                let violation = Violation {
                    rule: rule.id.to_string(),
                    description: rule.description.to_string(),
                    message,
                };
                match rule.severity {
                    Severity::Error => report.errors.push(violation),
                    Severity::Warning => report.warnings.push(violation),
                }
            }
        }
    }
    report.passed = report.errors.is_empty();

    debug!(
        file,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated document"
    );
    report
}

/// Validate `(file, content)` pairs and aggregate the report.
#[instrument(skip_all, fields(files = documents.len()))]
pub fn validate_all(
    documents: &[(String, String)],
    known: &BTreeSet<String>,
    run_at: DateTime<Utc>,
) -> ValidationReport {
    let mut summary = ReportSummary::default();
    let mut by_rule: BTreeMap<String, RuleTally> = RULES
        .iter()
        .map(|r| (r.id.to_string(), RuleTally::default()))
        .collect();
    let mut failures = Vec::new();

    for (file, content) in documents {
        let report = validate_document(file, content, known);

        summary.files_checked += 1;
        if report.passed {
            summary.files_passed += 1;
        } else {
            summary.files_failed += 1;
        }
        summary.total_errors += report.errors.len();
        summary.total_warnings += report.warnings.len();

        for id in &report.passed_rules {
            if let Some(tally) = by_rule.get_mut(*id) {
                tally.passed += 1;
            }
        }
        for violation in report.errors.iter().chain(&report.warnings) {
            if let Some(tally) = by_rule.get_mut(&violation.rule) {
                tally.failed += 1;
            }
        }

        if !report.errors.is_empty() || !report.warnings.is_empty() {
            failures.push(report);
        }
    }

    info!(
        checked = summary.files_checked,
        passed = summary.files_passed,
        failed = summary.files_failed,
        warnings = summary.total_warnings,
        "validation complete"
    );

    ValidationReport {
        run_at,
        summary,
        by_rule,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "---\nid: concept/guide/a\ntitle: \"A\"\ncategory: concept\ntags: [\"concept\",\"guide\",\"widgets\"]\ndifficulty: beginner\nreading_time: 1\n---\n<!--\n<doc_metadata>\n  <type>guide</type>\n  <estimated_reading_time>1</estimated_reading_time>\n</doc_metadata>\n-->\n\n# A\n\n> **Context**: About widgets.\n\n## Usage\n\n```rust\nlet x = 1;\n```\n\nSee [B](./concept-guide-b.md#intro).\n\n## See Also\n\n- [Documentation Index](../COMPASS.md)\n";

    fn known() -> BTreeSet<String> {
        known_targets(["concept-guide-a.md", "concept-guide-b.md"])
    }

    fn failed_rules(report: &FileReport) -> Vec<&str> {
        report
            .errors
            .iter()
            .chain(&report.warnings)
            .map(|v| v.rule.as_str())
            .collect()
    }

    #[test]
    fn well_formed_document_passes_everything() {
        let report = validate_document("docs/concept-guide-a.md", GOOD, &known());
        assert!(report.passed);
        assert!(failed_rules(&report).is_empty(), "{:?}", failed_rules(&report));
        assert_eq!(report.passed_rules.len(), RULES.len());
    }

    #[test]
    fn unresolved_link_is_only_a_warning() {
        let content = GOOD.replace("./concept-guide-b.md#intro", "./missing.md");
        let report = validate_document("docs/concept-guide-a.md", &content, &known());
        assert!(report.passed);
        assert_eq!(failed_rules(&report), vec!["V005"]);
        assert!(report.warnings[0].message.contains("./missing.md"));
        assert_eq!(report.warnings[0].description, "internal link targets exist");
        for rule in ["V001", "V002", "V003", "V004"] {
            assert!(report.passed_rules.contains(&rule));
        }
    }

    #[test]
    fn structural_errors_fail_the_document() {
        let content = "# One\n\n#### Deep\n\n# Two\n\n```\nplain\n```\n";
        let report = validate_document("docs/x.md", content, &known());
        assert!(!report.passed);
        let failed = failed_rules(&report);
        for rule in ["V001", "V002", "V004", "V010", "V006", "V007", "V008", "V009", "V011"] {
            assert!(failed.contains(&rule), "{rule} should fail: {failed:?}");
        }
        assert!(!failed.contains(&"V003"));
        assert!(!failed.contains(&"V012"));
    }

    #[test]
    fn missing_fields_and_few_tags() {
        let content = GOOD.replace("category: concept\n", "").replace(
            "tags: [\"concept\",\"guide\",\"widgets\"]",
            "tags: [\"concept\"]",
        );
        let report = validate_document("docs/a.md", &content, &known());
        assert!(!report.passed);
        assert_eq!(failed_rules(&report), vec!["V003", "V006"]);
        assert!(report.errors[0].message.contains("category"));
    }

    #[test]
    fn transformed_shell_block_passes_fence_rule() {
        use docweave_discovery::analyze;
        use docweave_markdown::{render_document, transform};
        use docweave_shared::{DocumentIdentity, LinkMap, SourceFile};

        let source = SourceFile {
            relative_path: "guide/a.md".into(),
            size: 0,
        };
        let content = "# A\n\nHow to run the widget service locally.\n\n```\n$ cargo run\n```\n";
        let analysis = analyze(&source, content);
        let identity = DocumentIdentity {
            id: "concept/guide/a".into(),
            output_filename: "concept-guide-a.md".into(),
            subcategory: "guide".into(),
            slug: "a".into(),
        };
        let rendered = render_document(&transform(&analysis, &identity, &LinkMap::new()));
        assert!(rendered.contains("```bash\n$ cargo run\n```"), "{rendered}");

        let report = validate_document("docs/concept-guide-a.md", &rendered, &known());
        assert!(report.passed_rules.contains(&"V009"));
        assert!(!failed_rules(&report).contains(&"V009"));
    }

    #[test]
    fn report_aggregates_by_rule() {
        let docs = vec![
            ("docs/a.md".to_string(), GOOD.to_string()),
            (
                "docs/b.md".to_string(),
                GOOD.replace("./concept-guide-b.md#intro", "./gone.md"),
            ),
            ("docs/c.md".to_string(), "no structure".to_string()),
        ];
        let report = validate_all(&docs, &known(), Utc::now());

        assert_eq!(report.summary.files_checked, 3);
        assert_eq!(report.summary.files_passed, 2);
        assert_eq!(report.summary.files_failed, 1);
        assert_eq!(report.by_rule["V005"], RuleTally { passed: 2, failed: 1 });
        assert_eq!(report.by_rule["V012"], RuleTally { passed: 3, failed: 0 });
        assert_eq!(report.failures.len(), 2);

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["summary"]["files_failed"], 1);
        assert_eq!(json["failures"][0]["warnings"][0]["rule"], "V005");
        assert_eq!(
            json["failures"][0]["warnings"][0]["description"],
            "internal link targets exist"
        );
        assert!(json["failures"][0].get("passed_rules").is_none());
    }
}
