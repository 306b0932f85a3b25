//! Keyword index, document index, and the `INDEX.json` record.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use docweave_graph::{Dag, EntityGraph};
use docweave_shared::{Category, Chunk, Difficulty, TransformedDocument};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Format version written to `INDEX.json`.
pub const INDEX_VERSION: &str = "1.0";

/// Title words shorter than this are not indexed.
const MIN_KEYWORD_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "for", "to", "of", "in", "on", "with",
];

static NON_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Entities reachable from a document's own entities, one hop each way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagContext {
    pub prerequisites: Vec<String>,
    pub dependents: Vec<String>,
}

/// One document in `INDEX.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: String,
    pub title: String,
    pub path: String,
    pub source_path: String,
    pub category: Category,
    pub subcategory: String,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub reading_time: usize,
    pub word_count: usize,
    pub summary: String,
    pub chunk_count: usize,
    /// IDs of the document's chunks, in chunk order.
    pub chunk_ids: Vec<String>,
    pub tokens: usize,
    pub entities: Vec<String>,
    pub dag_context: DagContext,
}

/// A document-to-document link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocLink {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub link_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocGraph {
    pub links: Vec<DocLink>,
}

/// Corpus totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub total_tokens: usize,
    pub total_entities: usize,
    pub total_edges: usize,
    pub cycles: usize,
    pub by_category: BTreeMap<String, usize>,
}

/// Content of `INDEX.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFile {
    pub version: String,
    pub generated: DateTime<Utc>,
    pub stats: IndexStats,
    pub documents: Vec<DocumentEntry>,
    pub graph: DocGraph,
    pub keywords: BTreeMap<String, Vec<String>>,
    pub dag: Dag,
    pub entity_index: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Keywords
// ---------------------------------------------------------------------------

fn keyword(text: &str) -> Option<String> {
    let word = NON_KEYWORD_RE.replace_all(&text.to_lowercase(), "").to_string();
    (!word.is_empty() && !STOP_WORDS.contains(&word.as_str())).then_some(word)
}

/// Keywords of one document: normalized tags plus significant title words.
pub fn document_keywords(doc: &TransformedDocument) -> BTreeSet<String> {
    let tags = doc.tags.iter().filter_map(|t| keyword(t));
    let title_words = NON_KEYWORD_RE
        .split(&doc.title.to_lowercase())
        .filter(|w| w.len() >= MIN_KEYWORD_CHARS)
        .filter_map(keyword)
        .collect::<Vec<_>>();
    tags.chain(title_words).collect()
}

/// Keyword to the IDs of the documents that carry it, in document order.
pub fn build_keyword_index(docs: &[TransformedDocument]) -> BTreeMap<String, Vec<String>> {
    let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for doc in docs {
        for word in document_keywords(doc) {
            let ids = index.entry(word).or_default();
            if !ids.contains(&doc.identity.id) {
                ids.push(doc.identity.id.clone());
            }
        }
    }
    index
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Prerequisites and dependents of a document's entities, excluding its own.
pub fn dag_context(doc_id: &str, graph: &EntityGraph) -> DagContext {
    let Some(own) = graph.doc_entities.get(doc_id) else {
        return DagContext::default();
    };
    let own_set: BTreeSet<&str> = own.iter().map(String::as_str).collect();

    let mut prerequisites = BTreeSet::new();
    let mut dependents = BTreeSet::new();
    for entity in own {
        prerequisites.extend(graph.prerequisites(entity).filter(|e| !own_set.contains(e)));
        dependents.extend(graph.dependents(entity).filter(|e| !own_set.contains(e)));
    }

    DagContext {
        prerequisites: prerequisites.into_iter().map(String::from).collect(),
        dependents: dependents.into_iter().map(String::from).collect(),
    }
}

/// One index entry per document, with chunk totals.
pub fn build_document_index(
    docs: &[TransformedDocument],
    chunks: &[Chunk],
    graph: &EntityGraph,
) -> Vec<DocumentEntry> {
    docs.iter()
        .map(|doc| {
            let id = doc.identity.id.as_str();
            let mut own_chunks: Vec<&Chunk> = chunks.iter().filter(|c| c.doc_id == id).collect();
            own_chunks.sort_by_key(|c| c.index);
            let tokens: usize = own_chunks.iter().map(|c| c.tokens).sum();
            DocumentEntry {
                id: id.to_string(),
                title: doc.title.clone(),
                path: format!("docs/{}", doc.identity.output_filename),
                source_path: doc.source_path.clone(),
                category: doc.category,
                subcategory: doc.identity.subcategory.clone(),
                tags: doc.tags.clone(),
                difficulty: doc.difficulty,
                reading_time: doc.reading_time_minutes,
                word_count: doc.word_count,
                summary: doc.summary.clone(),
                chunk_count: own_chunks.len(),
                chunk_ids: own_chunks.iter().map(|c| c.chunk_id.clone()).collect(),
                tokens,
                entities: graph.doc_entities.get(id).cloned().unwrap_or_default(),
                dag_context: dag_context(id, graph),
            }
        })
        .collect()
}

/// Assemble `INDEX.json`.
pub fn build_index(
    docs: &[TransformedDocument],
    chunks: &[Chunk],
    graph: &EntityGraph,
    generated: DateTime<Utc>,
) -> IndexFile {
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    for doc in docs {
        *by_category.entry(doc.category.to_string()).or_default() += 1;
    }

    let links = docs
        .iter()
        .flat_map(|doc| {
            doc.linked_doc_ids.iter().map(|to| DocLink {
                from: doc.identity.id.clone(),
                to: to.clone(),
                link_type: "internal_link".into(),
            })
        })
        .collect();

    IndexFile {
        version: INDEX_VERSION.to_string(),
        generated,
        stats: IndexStats {
            total_documents: docs.len(),
            total_chunks: chunks.len(),
            total_tokens: chunks.iter().map(|c| c.tokens).sum(),
            total_entities: graph.nodes.len(),
            total_edges: graph.edges.len(),
            cycles: graph.cycles.len(),
            by_category,
        },
        documents: build_document_index(docs, chunks, graph),
        graph: DocGraph { links },
        keywords: build_keyword_index(docs),
        dag: graph.dag(),
        entity_index: graph.entity_index(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{chunk, doc};
    use docweave_graph::build_graph;

    #[test]
    fn keywords_drop_stop_words_and_short_words() {
        let d = doc("concept/guide/a", "The Guide to Deploying on AWS", &["concept", "Guide"], &[]);
        let words: Vec<_> = document_keywords(&d).into_iter().collect();
        assert_eq!(words, vec!["aws", "concept", "deploying", "guide"]);
    }

    #[test]
    fn keyword_index_maps_to_docs() {
        let docs = vec![
            doc("concept/x/a", "Widget basics", &["concept"], &[]),
            doc("concept/x/b", "Widget internals", &["concept"], &[]),
        ];
        let index = build_keyword_index(&docs);
        assert_eq!(index["widget"], vec!["concept/x/a", "concept/x/b"]);
        assert_eq!(index["basics"], vec!["concept/x/a"]);
    }

    #[test]
    fn dag_context_excludes_own_entities() {
        let docs = vec![
            doc("ops/deploy/a", "A", &["deploy_cli"], &["concept/errors/b"]),
            doc("concept/errors/b", "B", &["error_handler"], &[]),
        ];
        let graph = build_graph(&docs);
        let ctx = dag_context("ops/deploy/a", &graph);
        assert_eq!(ctx.prerequisites, vec!["b", "error_handler"]);
        assert!(ctx.dependents.is_empty());

        let ctx_b = dag_context("concept/errors/b", &graph);
        assert_eq!(ctx_b.dependents, vec!["a", "deploy_cli"]);
    }

    #[test]
    fn index_file_shape() {
        let docs = vec![
            doc("concept/x/a", "Alpha", &["concept"], &["concept/x/b"]),
            doc("concept/x/b", "Beta", &["concept"], &[]),
        ];
        let chunks = vec![
            chunk("concept/x/a", 2, 5),
            chunk("concept/x/b", 1, 3),
            chunk("concept/x/a", 1, 10),
        ];
        let graph = build_graph(&docs);
        let index = build_index(&docs, &chunks, &graph, Utc::now());

        assert_eq!(index.stats.total_documents, 2);
        assert_eq!(index.stats.total_tokens, 18);
        assert_eq!(index.stats.by_category["concept"], 2);
        assert_eq!(index.documents[0].chunk_count, 2);
        assert_eq!(index.documents[0].tokens, 15);
        assert_eq!(
            index.documents[0].chunk_ids,
            vec!["concept/x/a#chunk-1", "concept/x/a#chunk-2"]
        );
        assert_eq!(index.documents[1].chunk_ids, vec!["concept/x/b#chunk-1"]);
        assert_eq!(index.documents[0].path, "docs/concept-x-a.md");

        let json = serde_json::to_value(&index).expect("serialize");
        assert_eq!(json["version"], INDEX_VERSION);
        assert_eq!(json["graph"]["links"][0]["type"], "internal_link");
        assert_eq!(json["graph"]["links"][0]["to"], "concept/x/b");
        assert_eq!(json["documents"][0]["chunk_ids"][1], "concept/x/a#chunk-2");
        assert!(json["generated"].is_string());
        assert!(json["dag"]["nodes"].is_array());
    }
}
