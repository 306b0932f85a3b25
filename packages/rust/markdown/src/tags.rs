//! Tag generation and difficulty classification.

use std::sync::LazyLock;

use docweave_shared::{Category, Difficulty, DocumentAnalysis};
use regex::Regex;

/// Tags are capped at this many per document.
pub const MAX_TAGS: usize = 5;

/// At most this many technology tags per document.
const MAX_TECH_TAGS: usize = 2;

const TECHNOLOGIES: &[&str] = &[
    "python",
    "rust",
    "typescript",
    "javascript",
    "docker",
    "kubernetes",
    "aws",
    "api",
    "oauth",
    "sql",
    "graphql",
    "postgres",
];

const ADVANCED_TERMS: &[&str] = &[
    "advanced",
    "optimization",
    "performance",
    "internals",
    "architecture",
    "concurrency",
    "distributed",
    "scalability",
    "security",
    "benchmark",
];

const BEGINNER_TERMS: &[&str] = &[
    "introduction",
    "basic",
    "beginner",
    "simple",
    "overview",
    "getting started",
    "first steps",
    "tutorial",
    "quick",
    "example",
];

fn word_patterns(words: &[&'static str]) -> Vec<(&'static str, Regex)> {
    words
        .iter()
        .map(|w| {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(w))).expect("valid regex");
            (*w, re)
        })
        .collect()
}

static TECH_RES: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| word_patterns(TECHNOLOGIES));
static ADVANCED_RES: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| word_patterns(ADVANCED_TERMS));
static BEGINNER_RES: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| word_patterns(BEGINNER_TERMS));

/// Build 1–5 tags for a document. The category tag always comes first.
pub fn generate_tags(analysis: &DocumentAnalysis, subcategory: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(MAX_TAGS);
    let mut push = |tag: String| {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    push(analysis.category.tag().to_string());

    if subcategory != "general" {
        push(subcategory.to_string());
    }

    if let Some(first) = analysis.title.split_whitespace().next() {
        let word: String = first
            .to_lowercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        if word.len() > 2 {
            push(word);
        }
    }

    let haystack = format!(
        "{} {}",
        analysis.title.to_lowercase(),
        analysis.first_paragraph.to_lowercase()
    );
    TECH_RES
        .iter()
        .filter(|(_, re)| re.is_match(&haystack))
        .take(MAX_TECH_TAGS)
        .for_each(|(tech, _)| push((*tech).to_string()));

    if analysis.category == Category::Tutorial {
        push("beginner".into());
    } else if analysis.has_code && analysis.word_count > 500 {
        push("advanced".into());
    }

    tags.truncate(MAX_TAGS);
    tags
}

/// Classify reading difficulty from category, vocabulary, and size.
pub fn classify_difficulty(analysis: &DocumentAnalysis) -> Difficulty {
    if analysis.category == Category::Tutorial {
        return Difficulty::Beginner;
    }

    let lower = analysis.body.to_lowercase();
    let hits = |patterns: &[(&str, Regex)]| {
        patterns.iter().filter(|(_, re)| re.is_match(&lower)).count()
    };

    if hits(ADVANCED_RES.as_slice()) >= 3 || (analysis.has_code && analysis.word_count > 1000) {
        Difficulty::Advanced
    } else if hits(BEGINNER_RES.as_slice()) >= 2 || analysis.word_count < 300 {
        Difficulty::Beginner
    } else {
        Difficulty::Intermediate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_shared::{Frontmatter, SourceFile};

    fn analysis(category: Category, title: &str, para: &str, body: &str) -> DocumentAnalysis {
        DocumentAnalysis {
            source: SourceFile {
                relative_path: "x.md".into(),
                size: 0,
            },
            title: title.into(),
            category,
            headings: vec![],
            links: vec![],
            first_paragraph: para.into(),
            word_count: body.split_whitespace().count(),
            has_code: body.contains("```"),
            has_tables: false,
            frontmatter: Frontmatter::new(),
            content_hash: String::new(),
            body: body.into(),
        }
    }

    #[test]
    fn tags_follow_priority_and_cap() {
        let a = analysis(
            Category::Tutorial,
            "Deploying Rust services",
            "Use docker and kubernetes with python helpers.",
            "short",
        );
        let tags = generate_tags(&a, "guides");
        assert_eq!(
            tags,
            vec!["tutorial", "guides", "deploying", "python", "rust"]
        );
    }

    #[test]
    fn tags_skip_general_and_short_words() {
        let a = analysis(Category::Ref, "An API", "Nothing technical here.", "short");
        let tags = generate_tags(&a, "general");
        assert_eq!(tags, vec!["reference", "api"]);
    }

    #[test]
    fn technology_matching_uses_word_boundaries() {
        let a = analysis(
            Category::Concept,
            "Trust model",
            "Frustrating awsome capital words.",
            "short",
        );
        let tags = generate_tags(&a, "general");
        assert_eq!(tags, vec!["concept", "trust"]);
    }

    #[test]
    fn difficulty_rules() {
        let tutorial = analysis(Category::Tutorial, "T", "", "advanced internals security");
        assert_eq!(classify_difficulty(&tutorial), Difficulty::Beginner);

        let advanced = analysis(
            Category::Concept,
            "T",
            "",
            "advanced internals security topics",
        );
        assert_eq!(classify_difficulty(&advanced), Difficulty::Advanced);

        let long_code = format!("```\ncode\n```\n{}", "word ".repeat(1001));
        let code_heavy = analysis(Category::Ref, "T", "", &long_code);
        assert_eq!(classify_difficulty(&code_heavy), Difficulty::Advanced);

        let short = analysis(Category::Ref, "T", "", "a few words");
        assert_eq!(classify_difficulty(&short), Difficulty::Beginner);

        let medium = analysis(Category::Ref, "T", "", &"word ".repeat(400));
        assert_eq!(classify_difficulty(&medium), Difficulty::Intermediate);
    }
}
