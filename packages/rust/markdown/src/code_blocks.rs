//! Language labels for unlabeled code fences.
//!
//! Every opening fence without a language gets one inferred from the code it
//! encloses. Fences that never close are left as they are.

use std::sync::LazyLock;

use docweave_shared::syntax::{self, FenceTracker, LineClass};
use regex::Regex;

/// Label used when no heuristic matches.
pub const FALLBACK_LANGUAGE: &str = "text";

/// How much of a block the keyword heuristics look at, in characters.
const HEAD_CHARS: usize = 200;

const SHELL_MARKERS: &[&str] = &[
    "$", "#!", "sudo ", "apt ", "docker ", "cd ", "mkdir ", "pip ", "npm ", "yarn ", "git ",
    "curl ", "wget ", "chmod ", "chown ", "export ", "source ", "echo ", "cat ", "ls ", "rm ",
    "cp ", "mv ",
];

const SHELL_PREFIXES: &[&str] = &["docker-compose", "wmill ", "cargo ", "rustup "];

const SQL_MARKERS: &[&str] = &[
    "select ",
    "insert ",
    "update ",
    "delete ",
    "create table",
    "alter table",
    "drop ",
];

const DOCKERFILE_PREFIXES: &[&str] = &[
    "from ",
    "run ",
    "copy ",
    "env ",
    "workdir ",
    "cmd ",
    "entrypoint ",
];

static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]+\s*=").expect("valid regex"));

static YAML_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_-]+:").expect("valid regex"));

/// Result of labelling the fences of one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledBlocks {
    pub body: String,
    /// Number of fences that received a label.
    pub labeled: usize,
}

/// Guess the language of a code block from its content.
pub fn infer_language(code: &str) -> &'static str {
    let lower = code.trim().to_lowercase();
    let first_line = lower.lines().next().unwrap_or_default();
    let head = syntax::truncate_chars(&lower, HEAD_CHARS);
    let has = |needles: &[&str], text: &str| needles.iter().any(|n| text.contains(n));

    if has(SHELL_MARKERS, first_line)
        || SHELL_PREFIXES.iter().any(|p| first_line.starts_with(p))
        || ASSIGNMENT_RE.is_match(first_line)
    {
        return "bash";
    }

    if YAML_KEY_RE.is_match(first_line)
        || first_line.starts_with("---")
        || has(&["version:", "services:"], head)
    {
        return "yaml";
    }

    // A table header reads as JSON otherwise.
    if first_line.starts_with('[') && first_line.ends_with(']') && code.contains('=') {
        if code.contains("[[") || lower.contains("true") || lower.contains("false") {
            return "toml";
        }
        return "ini";
    }

    if first_line.starts_with('{') || first_line.starts_with('[') {
        return "json";
    }

    if has(&["import ", "def ", "class "], head) {
        return "python";
    }

    if has(&["fn ", "let ", "use "], head)
        && (code.contains("::") || code.contains("->") || lower.contains("pub fn"))
    {
        return "rust";
    }
    if has(&["struct ", "impl ", "#[derive"], head) {
        return "rust";
    }

    if has(&["const ", "function ", "export "], head) {
        if has(&[": string", ": number", "interface "], &lower) {
            return "typescript";
        }
        return "javascript";
    }
    if has(&["async function", "await "], &lower) {
        return "typescript";
    }

    if has(SQL_MARKERS, syntax::truncate_chars(&lower, 100)) {
        return "sql";
    }

    if first_line.starts_with('<') || syntax::truncate_chars(code, HEAD_CHARS).contains("</") {
        return "html";
    }

    if has(&["server {", "location "], &lower) {
        return "nginx";
    }

    if DOCKERFILE_PREFIXES.iter().any(|p| first_line.starts_with(p)) {
        return "dockerfile";
    }

    FALLBACK_LANGUAGE
}

/// Add an inferred language to every unlabeled opening fence in `body`.
pub fn label_code_blocks(body: &str) -> LabeledBlocks {
    let mut lines: Vec<String> = body.split('\n').map(String::from).collect();
    let mut fences = FenceTracker::new();
    let mut open: Option<usize> = None;
    let mut labeled = 0usize;

    for idx in 0..lines.len() {
        match fences.classify(&lines[idx]) {
            LineClass::FenceOpen => {
                open = syntax::fence_language(&lines[idx]).is_none().then_some(idx);
            }
            LineClass::FenceClose => {
                if let Some(start) = open.take() {
                    let code = lines[start + 1..idx].join("\n");
                    let language = infer_language(&code);
                    lines[start] = format!("{}{language}", lines[start].trim_end());
                    labeled += 1;
                }
            }
            LineClass::Code | LineClass::Text => {}
        }
    }

    LabeledBlocks {
        body: lines.join("\n"),
        labeled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_common_languages() {
        assert_eq!(infer_language("$ cargo build --release"), "bash");
        assert_eq!(infer_language("docker-compose up -d"), "bash");
        assert_eq!(infer_language("RUST_LOG=debug"), "bash");
        assert_eq!(infer_language("name: docweave\non: push"), "yaml");
        assert_eq!(infer_language("{\"id\": 1}"), "json");
        assert_eq!(infer_language("import os\nprint(os.getcwd())"), "python");
        assert_eq!(
            infer_language("use std::fs;\n\nfn main() -> std::io::Result<()> {}"),
            "rust"
        );
        assert_eq!(infer_language("#[derive(Debug)]\nstruct A;"), "rust");
        assert_eq!(infer_language("const a: string = 'x';"), "typescript");
        assert_eq!(infer_language("const a = 1;"), "javascript");
        assert_eq!(infer_language("SELECT * FROM users;"), "sql");
        assert_eq!(infer_language("<div>hi</div>"), "html");
        assert_eq!(infer_language("[server]\nport = 80\nenabled = true"), "toml");
        assert_eq!(infer_language("FROM rust:1.85\nRUN cargo build"), "dockerfile");
        assert_eq!(infer_language("thread panicked at startup"), "text");
        assert_eq!(infer_language("[db]\nhost = \"x\""), "ini");
        assert_eq!(infer_language(""), "text");
    }

    #[test]
    fn labels_only_unlabeled_fences() {
        let body = "# T\n\n```\ncurl localhost\n```\n\n```rust\nlet x = 1;\n```\n";
        let result = label_code_blocks(body);
        assert_eq!(result.labeled, 1);
        assert_eq!(
            result.body,
            "# T\n\n```bash\ncurl localhost\n```\n\n```rust\nlet x = 1;\n```\n"
        );
    }

    #[test]
    fn keeps_fence_indentation_and_ignores_unclosed_blocks() {
        let result = label_code_blocks("  ```\n  {\"a\": 1}\n  ```\n\n```\nnever closed\n");
        assert_eq!(result.labeled, 1);
        assert_eq!(
            result.body,
            "  ```json\n  {\"a\": 1}\n  ```\n\n```\nnever closed\n"
        );
    }
}
