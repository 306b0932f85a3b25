//! Graph, entity, and chunk records written next to `INDEX.json`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use docweave_graph::{Edge, EntityGraph, EntityNode, EntityType};
use docweave_shared::{Category, Chunk, ChunkType, TransformedDocument};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENTITY_INDEX.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIndexEntry {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub layer: u8,
    pub doc_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIndexFile {
    pub generated: DateTime<Utc>,
    pub total_entities: usize,
    pub entities: BTreeMap<String, EntityIndexEntry>,
}

/// Every entity with its type, layer, and all documents that mention it.
pub fn build_entity_index(graph: &EntityGraph, generated: DateTime<Utc>) -> EntityIndexFile {
    let mut docs_by_entity = graph.entity_index();
    let entities: BTreeMap<String, EntityIndexEntry> = graph
        .nodes
        .values()
        .map(|node| {
            let entry = EntityIndexEntry {
                entity_type: node.entity_type,
                layer: node.layer,
                doc_ids: docs_by_entity.remove(&node.id).unwrap_or_default(),
            };
            (node.id.clone(), entry)
        })
        .collect();

    EntityIndexFile {
        generated,
        total_entities: entities.len(),
        entities,
    }
}

// ---------------------------------------------------------------------------
// KNOWLEDGE_GRAPH.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub entities: Vec<String>,
    pub links_to: Vec<String>,
}

/// Documents and entities in one graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub generated: DateTime<Utc>,
    pub documents: Vec<KnowledgeDocument>,
    pub entities: Vec<EntityNode>,
    pub relations: Vec<Edge>,
    pub cycles: Vec<Vec<String>>,
}

pub fn build_knowledge_graph(
    docs: &[TransformedDocument],
    graph: &EntityGraph,
    generated: DateTime<Utc>,
) -> KnowledgeGraph {
    KnowledgeGraph {
        generated,
        documents: docs
            .iter()
            .map(|doc| KnowledgeDocument {
                id: doc.identity.id.clone(),
                title: doc.title.clone(),
                category: doc.category,
                entities: graph
                    .doc_entities
                    .get(&doc.identity.id)
                    .cloned()
                    .unwrap_or_default(),
                links_to: doc.linked_doc_ids.clone(),
            })
            .collect(),
        entities: graph.nodes.values().cloned().collect(),
        relations: graph.edges.clone(),
        cycles: graph.cycles.clone(),
    }
}

// ---------------------------------------------------------------------------
// chunks_manifest.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRef {
    pub chunk_id: String,
    pub doc_id: String,
    pub path: String,
    pub tokens: usize,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunksManifest {
    pub generated_at: DateTime<Utc>,
    pub total_chunks: usize,
    pub chunks: Vec<ChunkRef>,
}

pub fn build_chunks_manifest(chunks: &[Chunk], generated_at: DateTime<Utc>) -> ChunksManifest {
    ChunksManifest {
        generated_at,
        total_chunks: chunks.len(),
        chunks: chunks
            .iter()
            .map(|c| ChunkRef {
                chunk_id: c.chunk_id.clone(),
                doc_id: c.doc_id.clone(),
                path: format!("chunks/{}", c.file_name()),
                tokens: c.tokens,
                chunk_type: c.chunk_type,
            })
            .collect(),
    }
}
