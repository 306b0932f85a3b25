//! Entity and dependency extraction for the metadata block.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use docweave_shared::syntax::{self, FenceTracker, LineClass};
use docweave_shared::{Dependency, DependencyKind};
use regex::Regex;

/// Entities are capped at this many per document.
pub const MAX_ENTITIES: usize = 20;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

static ENDPOINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(GET|POST|PUT|PATCH|DELETE)\s+(/[A-Za-z0-9_\-./{}:]*)").expect("valid regex")
});

static CLI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:\$\s+)?(cargo|npm|npx|yarn|pnpm|pip|docker|kubectl|git|make|curl|helm|terraform|bun|go)\s+([a-z][a-z0-9-]*)",
    )
    .expect("valid regex")
});

static PROMPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\$\s+([a-z][a-z0-9_-]*)\s+([a-z][a-z0-9-]*)").expect("valid regex"));

static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:fn|def|function|func)\s+([A-Za-z_][A-Za-z0-9_]*)\s*[(<]").expect("valid regex")
});

const DEPENDENCY_VOCABULARY: &[(&str, DependencyKind)] = &[
    ("tokio", DependencyKind::Library),
    ("serde", DependencyKind::Library),
    ("reqwest", DependencyKind::Library),
    ("axum", DependencyKind::Library),
    ("actix", DependencyKind::Library),
    ("sqlx", DependencyKind::Library),
    ("diesel", DependencyKind::Library),
    ("react", DependencyKind::Library),
    ("vue", DependencyKind::Library),
    ("django", DependencyKind::Library),
    ("flask", DependencyKind::Library),
    ("fastapi", DependencyKind::Library),
    ("express", DependencyKind::Library),
    ("pandas", DependencyKind::Library),
    ("numpy", DependencyKind::Library),
    ("postgres", DependencyKind::Service),
    ("postgresql", DependencyKind::Service),
    ("mysql", DependencyKind::Service),
    ("redis", DependencyKind::Service),
    ("kafka", DependencyKind::Service),
    ("rabbitmq", DependencyKind::Service),
    ("nginx", DependencyKind::Service),
    ("elasticsearch", DependencyKind::Service),
    ("s3", DependencyKind::Service),
    ("docker", DependencyKind::Tool),
    ("kubernetes", DependencyKind::Tool),
    ("terraform", DependencyKind::Tool),
    ("helm", DependencyKind::Tool),
    ("graphql", DependencyKind::Api),
    ("grpc", DependencyKind::Api),
    ("oauth", DependencyKind::Api),
    ("openapi", DependencyKind::Api),
];

static DEPENDENCY_RES: LazyLock<Vec<(&'static str, DependencyKind, Regex)>> = LazyLock::new(|| {
    DEPENDENCY_VOCABULARY
        .iter()
        .map(|(name, kind)| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))).expect("valid regex");
            (*name, *kind, re)
        })
        .collect()
});

/// Heading text to entity slug: lowercase, non-alphanumeric runs to `-`.
pub fn heading_slug(text: &str) -> String {
    NON_ALNUM_RE
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Extract sorted, de-duplicated entities from `body`, at most [`MAX_ENTITIES`].
///
/// Sources: H2+ heading slugs, HTTP endpoints anywhere in prose or code,
/// CLI invocations and function definitions inside fenced code.
pub fn extract_entities(body: &str) -> Vec<String> {
    let mut entities = BTreeSet::new();
    let mut fences = FenceTracker::new();

    for line in body.lines() {
        let class = fences.classify(line);

        for caps in ENDPOINT_RE.captures_iter(line) {
            entities.insert(format!("{} {}", &caps[1], &caps[2]));
        }

        match class {
            LineClass::Text => {
                if let Some((level, text)) = syntax::parse_heading(line) {
                    let slug = heading_slug(text);
                    if level >= 2 && !slug.is_empty() {
                        entities.insert(slug);
                    }
                }
            }
            LineClass::Code => {
                if let Some(caps) = CLI_RE.captures(line).or_else(|| PROMPT_RE.captures(line)) {
                    entities.insert(format!("{} {}", &caps[1], &caps[2]));
                }
                for caps in FUNCTION_RE.captures_iter(line) {
                    entities.insert(format!("{}()", &caps[1]));
                }
            }
            LineClass::FenceOpen | LineClass::FenceClose => {}
        }
    }

    entities.into_iter().take(MAX_ENTITIES).collect()
}

/// Vocabulary dependencies found in `body`, plus one `feature:{id}` per linked document.
pub fn extract_dependencies(body: &str, linked_doc_ids: &[String]) -> Vec<Dependency> {
    let mut found: BTreeSet<Dependency> = DEPENDENCY_RES
        .iter()
        .filter(|(_, _, re)| re.is_match(body))
        .map(|(name, kind, _)| Dependency {
            name: (*name).to_string(),
            kind: *kind,
        })
        .collect();

    found.extend(linked_doc_ids.iter().map(|id| Dependency {
        name: format!("feature:{id}"),
        kind: DependencyKind::Feature,
    }));

    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_from_headings_endpoints_and_code() {
        let body = "# Title\n\n## Error Handling\n\nCall GET /v1/users/{id} first.\n\n```bash\n$ cargo build --release\nkubectl apply -f x.yaml\n```\n\n```python\ndef load_config(path):\n    pass\n```\n\n```rust\npub fn connect<T>(x: T) {}\n```\n";
        let entities = extract_entities(body);
        assert_eq!(
            entities,
            vec![
                "GET /v1/users/{id}",
                "cargo build",
                "connect()",
                "error-handling",
                "kubectl apply",
                "load_config()",
            ]
        );
    }

    #[test]
    fn h1_and_prose_commands_ignored() {
        let body = "# Only Title\n\ncargo build is mentioned in prose.\n";
        assert!(extract_entities(body).is_empty());
    }

    #[test]
    fn entities_capped() {
        let body: String = (0..30).map(|i| format!("## Section {i:02}\n")).collect();
        let entities = extract_entities(&body);
        assert_eq!(entities.len(), MAX_ENTITIES);
        assert_eq!(entities[0], "section-00");
    }

    #[test]
    fn dependencies_match_words_and_links() {
        let body = "Uses Tokio with Redis behind nginx. Not redistribution.";
        let deps = extract_dependencies(body, &["ref/api/auth".to_string()]);
        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["feature:ref/api/auth", "nginx", "redis", "tokio"]);
        assert_eq!(deps[0].kind, DependencyKind::Feature);
        assert_eq!(deps[3].kind, DependencyKind::Library);
    }

    #[test]
    fn heading_slugs() {
        assert_eq!(heading_slug("  Retry & Back-off (v2) "), "retry-back-off-v2");
    }
}
