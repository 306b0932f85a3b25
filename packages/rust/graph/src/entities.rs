//! Entity naming and lexical typing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Entity IDs are truncated to this many characters.
pub const MAX_ENTITY_CHARS: usize = 50;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

const TOOL_CUES: &[&str] = &["api", "cli", "sdk", "tool", "client", "command"];
const FEATURE_CUES: &[&str] = &[
    "flow", "retry", "error", "branch", "loop", "handler", "approval", "trigger",
];
const DEPLOY_CUES: &[&str] = &["deploy", "production", "release", "infra", "ops"];
const REQUIRES_CUES: &[&str] = &["error", "fail", "retry", "exception", "recover"];
const MANAGES_CUES: &[&str] = &["deploy", "cli", "release"];

/// Kind of thing an entity names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Concept,
    Tool,
    Feature,
}

/// Label of a directed edge between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Uses,
    Manages,
    Requires,
}

fn has_cue(name: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| name.contains(cue))
}

/// Normalize free text to an entity ID, or `None` when nothing is left.
pub fn normalize_entity(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let replaced = NON_ALNUM_RE.replace_all(&lower, "_");
    let trimmed = replaced.trim_matches('_');
    let id: String = trimmed.chars().take(MAX_ENTITY_CHARS).collect();
    let id = id.trim_end_matches('_');
    (!id.is_empty()).then(|| id.to_string())
}

/// Type of an entity from its name.
pub fn entity_type(name: &str) -> EntityType {
    if has_cue(name, TOOL_CUES) {
        EntityType::Tool
    } else if has_cue(name, FEATURE_CUES) {
        EntityType::Feature
    } else {
        EntityType::Concept
    }
}

/// Layer 1 to 4; deployment cues override the type layer.
pub fn entity_layer(name: &str, kind: EntityType) -> u8 {
    if has_cue(name, DEPLOY_CUES) {
        return 4;
    }
    match kind {
        EntityType::Feature => 1,
        EntityType::Concept => 2,
        EntityType::Tool => 3,
    }
}

/// Relationship of an edge `from -> to`.
pub fn relationship(from: &str, to: &str) -> Relationship {
    if has_cue(to, REQUIRES_CUES) {
        Relationship::Requires
    } else if has_cue(from, MANAGES_CUES) {
        Relationship::Manages
    } else {
        Relationship::Uses
    }
}
