//! Entity graph over a document corpus.
//!
//! Entities come from document tags and titles. Edges are derived from
//! internal links between documents: a link `A -> B` connects the leading
//! entities of `A` to those of `B`. Cycles are detected and reported; they
//! never abort the build.

mod cycles;
mod entities;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use docweave_shared::TransformedDocument;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

pub use cycles::{detect_cycles, topological_order};
pub use entities::{
    EntityType, MAX_ENTITY_CHARS, Relationship, entity_layer, entity_type, normalize_entity,
    relationship,
};

/// Nodes keep at most this many owning documents.
pub const MAX_NODE_DOCS: usize = 5;

/// Each side of a document link contributes at most this many entities.
pub const LINK_FANOUT: usize = 3;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A named entity shared by one or more documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNode {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub layer: u8,
    pub doc_ids: Vec<String>,
}

/// A directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub relationship: Relationship,
}

/// Entity graph with per-document entity lists and detected cycles.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    pub nodes: BTreeMap<String, EntityNode>,
    pub edges: Vec<Edge>,
    /// Document ID to its entities in priority order.
    pub doc_entities: BTreeMap<String, Vec<String>>,
    pub cycles: Vec<Vec<String>>,
}

/// Serializable DAG view of an [`EntityGraph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dag {
    pub nodes: Vec<EntityNode>,
    pub edges: Vec<Edge>,
    pub is_dag: bool,
    pub cycles: Vec<Vec<String>>,
    /// Topological order, empty when cyclic.
    pub order: Vec<String>,
    /// Layer number to the entity IDs in it.
    pub layers: BTreeMap<u8, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Entities of one document: its tags then its title token, de-duplicated.
pub fn document_entities(doc: &TransformedDocument) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for candidate in doc.tags.iter().chain(std::iter::once(&doc.title)) {
        if let Some(id) = normalize_entity(candidate) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }
    out
}

/// Build the entity graph for every document of the run.
#[instrument(skip_all, fields(documents = docs.len()))]
pub fn build_graph(docs: &[TransformedDocument]) -> EntityGraph {
    let mut graph = EntityGraph::default();

    for doc in docs {
        let entities = document_entities(doc);
        for entity in &entities {
            let node = graph.nodes.entry(entity.clone()).or_insert_with(|| {
                let kind = entity_type(entity);
                EntityNode {
                    id: entity.clone(),
                    entity_type: kind,
                    layer: entity_layer(entity, kind),
                    doc_ids: Vec::new(),
                }
            });
            if node.doc_ids.len() < MAX_NODE_DOCS && !node.doc_ids.contains(&doc.identity.id) {
                node.doc_ids.push(doc.identity.id.clone());
            }
        }
        graph.doc_entities.insert(doc.identity.id.clone(), entities);
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    for doc in docs {
        let Some(sources) = graph.doc_entities.get(&doc.identity.id) else {
            continue;
        };
        for target_id in &doc.linked_doc_ids {
            let Some(targets) = graph.doc_entities.get(target_id) else {
                continue;
            };
            for from in sources.iter().take(LINK_FANOUT) {
                for to in targets.iter().take(LINK_FANOUT) {
                    if from == to || !seen.insert((from.clone(), to.clone())) {
                        continue;
                    }
                    graph.edges.push(Edge {
                        from: from.clone(),
                        to: to.clone(),
                        relationship: relationship(from, to),
                    });
                }
            }
        }
    }

    graph.cycles = detect_cycles(graph.nodes.keys().map(String::as_str), &graph.edges);
    for cycle in &graph.cycles {
        warn!(cycle = %cycle.join(" -> "), "cycle detected in entity graph");
    }

    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        cycles = graph.cycles.len(),
        "entity graph built"
    );
    graph
}

impl EntityGraph {
    pub fn is_dag(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Targets of edges leaving `entity`.
    pub fn prerequisites(&self, entity: &str) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter(move |e| e.from == entity)
            .map(|e| e.to.as_str())
    }

    /// Sources of edges entering `entity`.
    pub fn dependents(&self, entity: &str) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter(move |e| e.to == entity)
            .map(|e| e.from.as_str())
    }

    /// Entity IDs to every document that mentions them, uncapped.
    pub fn entity_index(&self) -> BTreeMap<String, Vec<String>> {
        let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (doc_id, entities) in &self.doc_entities {
            for entity in entities {
                index.entry(entity.clone()).or_default().push(doc_id.clone());
            }
        }
        index
    }

    /// DAG view with topological order and layer grouping.
    pub fn dag(&self) -> Dag {
        let order = if self.is_dag() {
            topological_order(self.nodes.keys().map(String::as_str), &self.edges)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut layers: BTreeMap<u8, Vec<String>> = BTreeMap::new();
        for node in self.nodes.values() {
            layers.entry(node.layer).or_default().push(node.id.clone());
        }

        Dag {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.clone(),
            is_dag: self.is_dag(),
            cycles: self.cycles.clone(),
            order,
            layers,
        }
    }

    /// Split into one sub-graph per subsystem, the subcategory segment of doc IDs.
    ///
    /// A node joins every subsystem of its documents; an edge joins a
    /// subsystem when both its endpoints do.
    pub fn subsystems(&self) -> BTreeMap<String, EntityGraph> {
        let mut members: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        for node in self.nodes.values() {
            for doc_id in &node.doc_ids {
                if let Some(system) = subsystem_of(doc_id) {
                    members
                        .entry(system.to_string())
                        .or_default()
                        .insert(node.id.as_str());
                }
            }
        }

        members
            .into_iter()
            .map(|(system, ids)| {
                let nodes: BTreeMap<String, EntityNode> = ids
                    .iter()
                    .filter_map(|id| self.nodes.get(*id))
                    .map(|n| (n.id.clone(), n.clone()))
                    .collect();
                let edges: Vec<Edge> = self
                    .edges
                    .iter()
                    .filter(|e| ids.contains(e.from.as_str()) && ids.contains(e.to.as_str()))
                    .cloned()
                    .collect();
                let doc_entities = self
                    .doc_entities
                    .iter()
                    .filter(|(doc_id, _)| subsystem_of(doc_id) == Some(system.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let cycles = detect_cycles(nodes.keys().map(String::as_str), &edges);
                let sub = EntityGraph {
                    nodes,
                    edges,
                    doc_entities,
                    cycles,
                };
                (system, sub)
            })
            .collect()
    }
}

/// Subcategory segment of a `{category}/{subcategory}/{slug}` ID.
pub fn subsystem_of(doc_id: &str) -> Option<&str> {
    doc_id.split('/').nth(1).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_shared::{Category, Difficulty, DocumentIdentity};
    use proptest::prelude::*;

    fn doc(id: &str, title: &str, tags: &[&str], links: &[&str]) -> TransformedDocument {
        TransformedDocument {
            identity: DocumentIdentity {
                id: id.into(),
                output_filename: format!("{}.md", id.replace('/', "-")),
                subcategory: subsystem_of(id).unwrap_or("general").into(),
                slug: id.rsplit('/').next().unwrap_or_default().into(),
            },
            source_path: format!("{id}.md"),
            title: title.into(),
            category: Category::Concept,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            difficulty: Difficulty::Beginner,
            reading_time_minutes: 1,
            word_count: 10,
            summary: String::new(),
            entities: vec![],
            dependencies: vec![],
            linked_doc_ids: links.iter().map(|l| l.to_string()).collect(),
            body: String::new(),
        }
    }

    #[test]
    fn link_produces_requires_edge() {
        let docs = vec![
            doc("ops/deploy/a", "A", &["deploy_cli"], &["concept/errors/b"]),
            doc("concept/errors/b", "B", &["error_handler"], &[]),
        ];
        let graph = build_graph(&docs);
        let edge = graph
            .edges
            .iter()
            .find(|e| e.from == "deploy_cli" && e.to == "error_handler")
            .expect("edge deploy_cli -> error_handler");
        assert_eq!(edge.relationship, Relationship::Requires);
        assert!(graph.is_dag());
        assert_eq!(graph.nodes["deploy_cli"].layer, 4);
        assert_eq!(graph.nodes["error_handler"].entity_type, EntityType::Feature);
    }

    #[test]
    fn document_entities_dedup_and_order() {
        let d = doc("concept/x/a", "Widget Flow", &["concept", "x", "concept"], &[]);
        assert_eq!(document_entities(&d), vec!["concept", "x", "widget_flow"]);
    }

    #[test]
    fn no_self_loops_or_duplicates() {
        let docs = vec![
            doc("concept/x/a", "Shared", &["shared"], &["concept/x/b", "concept/x/b"]),
            doc("concept/x/b", "Shared", &["shared"], &[]),
        ];
        let graph = build_graph(&docs);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes["shared"].doc_ids.len(), 2);
    }

    #[test]
    fn mutual_links_report_cycle() {
        let docs = vec![
            doc("concept/x/a", "Alpha", &["alpha"], &["concept/y/b"]),
            doc("concept/y/b", "Beta", &["beta"], &["concept/x/a"]),
        ];
        let graph = build_graph(&docs);
        assert!(!graph.is_dag());
        let dag = graph.dag();
        assert!(!dag.is_dag);
        assert!(dag.order.is_empty());
        assert_eq!(dag.cycles.len(), graph.cycles.len());
    }

    #[test]
    fn node_doc_ids_capped() {
        let docs: Vec<_> = (0..8)
            .map(|i| doc(&format!("concept/x/d{i}"), &format!("Doc {i}"), &["common"], &[]))
            .collect();
        let graph = build_graph(&docs);
        assert_eq!(graph.nodes["common"].doc_ids.len(), MAX_NODE_DOCS);
        assert_eq!(graph.entity_index()["common"].len(), 8);
    }

    #[test]
    fn subsystems_partition_nodes_and_edges() {
        let docs = vec![
            doc("concept/api/a", "A", &["tokens"], &["concept/api/b", "concept/web/c"]),
            doc("concept/api/b", "B", &["sessions"], &[]),
            doc("concept/web/c", "C", &["pages"], &[]),
        ];
        let graph = build_graph(&docs);
        let systems = graph.subsystems();
        assert_eq!(systems.keys().collect::<Vec<_>>(), vec!["api", "web"]);

        let api = &systems["api"];
        assert!(api.nodes.contains_key("tokens"));
        assert!(!api.nodes.contains_key("pages"));
        assert!(api.edges.iter().all(|e| e.to != "pages"));
        assert!(api.edges.iter().any(|e| e.from == "tokens" && e.to == "sessions"));
        assert_eq!(api.doc_entities.len(), 2);
    }

    #[test]
    fn dag_layers_and_order() {
        let docs = vec![
            doc("concept/x/a", "A", &["retry_flow"], &["concept/x/b"]),
            doc("concept/x/b", "B", &["sdk"], &[]),
        ];
        let dag = build_graph(&docs).dag();
        assert!(dag.is_dag);
        assert_eq!(dag.layers[&1], vec!["retry_flow"]);
        assert_eq!(dag.layers[&3], vec!["sdk"]);
        let pos = |id: &str| dag.order.iter().position(|n| n == id).expect("in order");
        assert!(pos("retry_flow") < pos("sdk"));

        let json = serde_json::to_value(&dag).expect("serialize");
        assert_eq!(json["nodes"][0]["type"], "concept");
        assert_eq!(json["edges"][0]["relationship"], "uses");
        assert!(json["layers"]["1"].is_array());
    }

    fn linked_docs() -> impl Strategy<Value = Vec<TransformedDocument>> {
        let tags = prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "e"]), 1..3);
        let links = prop::collection::vec(0usize..6, 0..3);
        prop::collection::vec((tags, links), 1..7).prop_map(|specs| {
            let n = specs.len();
            specs
                .iter()
                .enumerate()
                .map(|(i, (tags, links))| {
                    let targets: Vec<String> = links
                        .iter()
                        .filter(|t| **t < n && **t != i)
                        .map(|t| format!("concept/p/d{t}"))
                        .collect();
                    let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
                    doc(&format!("concept/p/d{i}"), "", tags, &targets)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn cycles_flagged_or_graph_acyclic(docs in linked_docs()) {
            let graph = build_graph(&docs);
            let order = topological_order(graph.nodes.keys().map(String::as_str), &graph.edges);

            prop_assert_eq!(graph.cycles.is_empty(), order.is_some());
            for cycle in &graph.cycles {
                for (i, from) in cycle.iter().enumerate() {
                    let to = &cycle[(i + 1) % cycle.len()];
                    prop_assert!(graph.edges.iter().any(|e| &e.from == from && &e.to == to));
                }
            }
            prop_assert!(graph.edges.iter().all(|e| e.from != e.to));
        }
    }
}
