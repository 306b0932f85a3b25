//! Aggregate outputs of a run: indexes, graph files, and navigation pages.
//!
//! Everything here is a pure function of the transformed documents, their
//! chunks, and the entity graph. Writing to disk is left to the caller.

mod index;
mod outputs;
mod pages;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use docweave_graph::{Dag, EntityGraph};
use docweave_shared::{Chunk, TransformedDocument};
use tracing::{info, instrument};

pub use index::{
    DagContext, DocGraph, DocLink, DocumentEntry, INDEX_VERSION, IndexFile, IndexStats,
    build_document_index, build_index, build_keyword_index, dag_context, document_keywords,
};
pub use outputs::{
    ChunkRef, ChunksManifest, EntityIndexEntry, EntityIndexFile, KnowledgeDocument,
    KnowledgeGraph, build_chunks_manifest, build_entity_index, build_knowledge_graph,
};
pub use pages::{render_compass, render_quickref};

/// Every aggregate output of one run.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub index: IndexFile,
    pub dag: Dag,
    /// Subsystem name to its DAG.
    pub subsystem_dags: BTreeMap<String, Dag>,
    pub entity_index: EntityIndexFile,
    pub knowledge_graph: KnowledgeGraph,
    pub chunks_manifest: ChunksManifest,
    pub compass: String,
    pub quickref: String,
}

/// Build all aggregate outputs.
#[instrument(skip_all, fields(documents = docs.len(), chunks = chunks.len()))]
pub fn build_artifacts(
    docs: &[TransformedDocument],
    chunks: &[Chunk],
    graph: &EntityGraph,
    generated: DateTime<Utc>,
) -> Artifacts {
    let index = build_index(docs, chunks, graph, generated);
    let subsystem_dags: BTreeMap<String, Dag> = graph
        .subsystems()
        .into_iter()
        .map(|(system, sub)| (system, sub.dag()))
        .collect();

    let compass = render_compass(&index);
    let quickref = render_quickref(&index);

    info!(
        keywords = index.keywords.len(),
        subsystems = subsystem_dags.len(),
        "artifacts built"
    );

    Artifacts {
        dag: index.dag.clone(),
        subsystem_dags,
        entity_index: build_entity_index(graph, generated),
        knowledge_graph: build_knowledge_graph(docs, graph, generated),
        chunks_manifest: build_chunks_manifest(chunks, generated),
        compass,
        quickref,
        index,
    }
}
