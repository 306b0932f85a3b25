//! Core domain records passed between pipeline stages.
//!
//! Each stage produces a new immutable record from the previous one:
//! [`SourceFile`] → [`DocumentAnalysis`] → [`TransformedDocument`] → [`Chunk`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Discovery records
// ---------------------------------------------------------------------------

/// A candidate file found under the source root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the source root, always `/`-separated.
    pub relative_path: String,
    /// File size in bytes at discovery time.
    pub size: u64,
}

/// Document category, assigned by content markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Meta,
    Tutorial,
    Ops,
    Ref,
    Concept,
}

impl Category {
    /// All categories in detection priority order.
    pub const ALL: [Category; 5] = [
        Category::Meta,
        Category::Tutorial,
        Category::Ops,
        Category::Ref,
        Category::Concept,
    ];

    /// Short identifier used in document IDs and filenames.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Tutorial => "tutorial",
            Self::Ops => "ops",
            Self::Ref => "ref",
            Self::Concept => "concept",
        }
    }

    /// Long-form tag emitted into document tags.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Ref => "reference",
            Self::Ops => "operations",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A markdown heading found outside fenced code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 for `#`, up to 6.
    pub level: u8,
    pub text: String,
    /// 1-based line number within the body.
    pub line: usize,
}

/// A `[text](target)` occurrence found outside fenced code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub target: String,
    /// 1-based line number within the body.
    pub line: usize,
    /// `false` when the target is an absolute URL.
    pub is_internal: bool,
}

/// A frontmatter value: plain scalar or bracketed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    Text(String),
    List(Vec<String>),
}

impl FrontmatterValue {
    /// The scalar value, if this is not a list.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }
}

/// Parsed frontmatter, keyed by field name.
pub type Frontmatter = BTreeMap<String, FrontmatterValue>;

/// Everything the analyzer learned about one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub source: SourceFile,
    pub title: String,
    pub category: Category,
    pub headings: Vec<Heading>,
    pub links: Vec<Link>,
    /// First prose paragraph of at least 20 chars, at most 300 chars.
    pub first_paragraph: String,
    pub word_count: usize,
    pub has_code: bool,
    pub has_tables: bool,
    pub frontmatter: Frontmatter,
    /// SHA-256 of the raw source bytes.
    pub content_hash: String,
    /// Source content with any frontmatter block removed.
    #[serde(skip)]
    pub body: String,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable identity assigned to a document for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentity {
    /// `{category}/{subcategory}/{slug}`, suffixed on collision.
    pub id: String,
    pub output_filename: String,
    pub subcategory: String,
    pub slug: String,
}

/// Source path (relative, `/`-separated) to assigned identity.
pub type LinkMap = BTreeMap<String, DocumentIdentity>;

// ---------------------------------------------------------------------------
// Transformed document
// ---------------------------------------------------------------------------

/// Reading difficulty of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

/// What kind of thing a document depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Library,
    Service,
    Tool,
    Api,
    Feature,
}

impl DependencyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Library => "library",
            Self::Service => "service",
            Self::Tool => "tool",
            Self::Api => "api",
            Self::Feature => "feature",
        }
    }
}

/// A named external or cross-document dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub kind: DependencyKind,
}

/// A document after heading repair, metadata generation, and link rewriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedDocument {
    pub identity: DocumentIdentity,
    pub source_path: String,
    pub title: String,
    pub category: Category,
    /// Between 1 and 5 tags; the category tag is always first.
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub reading_time_minutes: usize,
    pub word_count: usize,
    /// First paragraph of the source, used as the description.
    pub summary: String,
    /// Sorted, at most 20.
    pub entities: Vec<String>,
    pub dependencies: Vec<Dependency>,
    /// IDs of known documents this one links to, in link order.
    pub linked_doc_ids: Vec<String>,
    /// Repaired body without frontmatter or metadata block.
    #[serde(skip)]
    pub body: String,
}

// ---------------------------------------------------------------------------
// Chunks
// ---------------------------------------------------------------------------

/// Dominant content of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Prose,
    Code,
    Table,
    Mixed,
}

impl ChunkType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prose => "prose",
            Self::Code => "code",
            Self::Table => "table",
            Self::Mixed => "mixed",
        }
    }
}

/// A bounded slice of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    /// `{doc_id}#chunk-{index}`.
    pub chunk_id: String,
    /// 1-based position within the document.
    pub index: usize,
    pub heading_path: Vec<String>,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub tokens: usize,
    pub summary: String,
    pub content: String,
}

impl Chunk {
    /// File name used under `chunks/`.
    pub fn file_name(&self) -> String {
        format!("{}.md", self.chunk_id.replace(['/', '#'], "-"))
    }
}

// ---------------------------------------------------------------------------
// Run errors
// ---------------------------------------------------------------------------

/// A per-file failure recorded in the run manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub path: String,
    /// Pipeline stage that failed (`analyze`, `transform`, `write`, ...).
    pub stage: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Estimates
// ---------------------------------------------------------------------------

/// Estimated LLM tokens for a word count.
pub fn estimate_tokens(word_count: usize) -> usize {
    (word_count as f64 * 1.3).round() as usize
}

/// Estimated reading time in minutes at 200 words per minute, never below 1.
pub fn reading_time_minutes(word_count: usize) -> usize {
    ((word_count as f64 / 200.0).round() as usize).max(1)
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
