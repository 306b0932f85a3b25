//! Per-file analysis: frontmatter, headings, links, first paragraph, category.

use docweave_shared::syntax::{self, FenceTracker};
use docweave_shared::{Category, DocumentAnalysis, FrontmatterValue, SourceFile, content_hash};
use tracing::debug;

use crate::frontmatter::{parse_frontmatter, split_frontmatter};

/// Minimum length of a paragraph to count as the first paragraph.
const MIN_PARAGRAPH_CHARS: usize = 20;

/// First paragraphs are truncated to this many characters.
const MAX_PARAGRAPH_CHARS: usize = 300;

const META_NAMES: &[&str] = &["readme", "changelog", "contributing", "index", "license"];

const TUTORIAL_MARKERS: &[&str] = &["getting started", "step 1", "step 2", "## step", "quickstart"];

const OPS_MARKERS: &[&str] = &[
    "deploy",
    "install",
    "troubleshoot",
    "debug",
    "error:",
    "$ ",
    "production",
    "monitoring",
    "backup",
    "migration",
];

const REF_MARKERS: &[&str] = &[
    "## api",
    "## reference",
    "## configuration",
    "parameters:",
    "returns:",
    "arguments:",
    "| parameter |",
];

/// Analyze one source file's content.
pub fn analyze(source: &SourceFile, content: &str) -> DocumentAnalysis {
    let (block, body) = split_frontmatter(content);
    let frontmatter = block.map(parse_frontmatter).unwrap_or_default();

    let headings = syntax::headings(body);
    let links = syntax::links(body);

    let title = frontmatter
        .get("title")
        .and_then(FrontmatterValue::as_text)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .or_else(|| {
            headings
                .first()
                .filter(|h| h.level == 1)
                .map(|h| h.text.clone())
        })
        .unwrap_or_else(|| title_from_path(&source.relative_path));

    let category = categorize(&source.relative_path, body);

    debug!(
        path = %source.relative_path,
        %category,
        headings = headings.len(),
        links = links.len(),
        "analyzed document"
    );

    DocumentAnalysis {
        source: source.clone(),
        title,
        category,
        headings,
        links,
        first_paragraph: first_paragraph(body),
        word_count: syntax::word_count(body),
        has_code: body.lines().any(syntax::is_fence),
        has_tables: syntax::has_table(body),
        frontmatter,
        content_hash: content_hash(content.as_bytes()),
        body: body.to_string(),
    }
}

/// Assign a category by marker priority: meta, tutorial, ops, ref, concept.
pub fn categorize(relative_path: &str, body: &str) -> Category {
    let file_name = relative_path
        .rsplit('/')
        .next()
        .unwrap_or(relative_path)
        .to_lowercase();
    if META_NAMES.iter().any(|name| file_name.contains(name)) {
        return Category::Meta;
    }

    let lower = body.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if has_any(TUTORIAL_MARKERS) {
        Category::Tutorial
    } else if has_any(OPS_MARKERS) {
        Category::Ops
    } else if has_any(REF_MARKERS) {
        Category::Ref
    } else {
        Category::Concept
    }
}

/// The first prose paragraph of at least 20 characters, truncated to 300.
///
/// Headings, blockquotes, rules, and fenced code end a paragraph and are
/// never part of one.
pub fn first_paragraph(body: &str) -> String {
    let mut fences = FenceTracker::new();
    let mut current: Vec<&str> = Vec::new();

    for line in body.lines() {
        let class = fences.classify(line);
        let trimmed = line.trim();
        let breaks = class.is_code()
            || trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with('>')
            || trimmed.starts_with("---");

        if breaks {
            if let Some(paragraph) = accept_paragraph(&current) {
                return paragraph;
            }
            current.clear();
        } else {
            current.push(trimmed);
        }
    }

    accept_paragraph(&current).unwrap_or_default()
}

fn accept_paragraph(lines: &[&str]) -> Option<String> {
    let joined = lines.join(" ");
    (joined.chars().count() >= MIN_PARAGRAPH_CHARS)
        .then(|| syntax::truncate_chars(&joined, MAX_PARAGRAPH_CHARS).to_string())
}

/// Title-case a file stem: `getting_started-guide.md` → `Getting Started Guide`.
pub fn title_from_path(relative_path: &str) -> String {
    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|s| !s.is_empty())
        .unwrap_or(file_name);

    stem.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str) -> SourceFile {
        SourceFile {
            relative_path: path.into(),
            size: 0,
        }
    }

    #[test]
    fn category_priority() {
        assert_eq!(categorize("guide/README.md", "step 1"), Category::Meta);
        assert_eq!(
            categorize("a.md", "Getting started: deploy it"),
            Category::Tutorial
        );
        assert_eq!(categorize("a.md", "Run `$ make` to deploy"), Category::Ops);
        assert_eq!(
            categorize("a.md", "## API\n\nparameters: none"),
            Category::Ref
        );
        assert_eq!(categorize("a.md", "Ideas about things."), Category::Concept);
    }

    #[test]
    fn first_paragraph_skips_short_and_structural_lines() {
        let body = "# Title\n\nShort.\n\n> quoted text that is long enough\n\n```\ncode block that is long enough\n```\nThis paragraph is long enough\nand continues here.\n";
        assert_eq!(
            first_paragraph(body),
            "This paragraph is long enough and continues here."
        );
    }

    #[test]
    fn first_paragraph_truncates() {
        let body = "x".repeat(400);
        assert_eq!(first_paragraph(&body).len(), 300);
        assert_eq!(first_paragraph("tiny"), "");
    }

    #[test]
    fn title_resolution_order() {
        let with_fm = analyze(
            &source("a.md"),
            "---\ntitle: \"From FM\"\n---\n# From Heading\n",
        );
        assert_eq!(with_fm.title, "From FM");

        let with_h1 = analyze(&source("a.md"), "# From Heading\n\ntext\n");
        assert_eq!(with_h1.title, "From Heading");

        let with_h2 = analyze(&source("guide/error_handling-tips.md"), "## Sub\n");
        assert_eq!(with_h2.title, "Error Handling Tips");
    }

    #[test]
    fn analysis_counts_body_only() {
        let content = "---\ntitle: T\ntags: [a]\n---\n# T\n\nOne two three.\n\n| a | b |\n|---|---|\n\n```rust\nfn x() {}\n```\n";
        let analysis = analyze(&source("ref/t.md"), content);
        assert_eq!(analysis.word_count, 16);
        assert!(analysis.has_code);
        assert!(analysis.has_tables);
        assert_eq!(analysis.headings.len(), 1);
        assert!(analysis.body.starts_with("# T"));
        assert_eq!(analysis.content_hash.len(), 64);
    }
}
