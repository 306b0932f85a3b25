//! Markdown navigation pages: `COMPASS.md` and `QUICKREF.md`.

use std::collections::BTreeMap;

use docweave_shared::Category;

use crate::index::{DocumentEntry, IndexFile};

/// Entries in the compass quick start list.
const QUICK_START_LIMIT: usize = 5;

/// Rows in the compass keyword table.
const TOP_KEYWORDS: usize = 20;

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn link(doc: &DocumentEntry) -> String {
    format!("[{}]({})", doc.title.replace(']', "\\]"), doc.path)
}

fn average(total: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (total as f64 / count as f64).round() as usize
    }
}

fn title_case(category: Category) -> String {
    let name = category.tag();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render `COMPASS.md`, the overview page at the output root.
pub fn render_compass(index: &IndexFile) -> String {
    let mut out = String::new();
    let stats = &index.stats;

    out.push_str("# Documentation Compass\n\n");
    out.push_str(&format!(
        "> Navigation hub for this documentation set. Generated {}.\n\n",
        index.generated.format("%Y-%m-%d %H:%M UTC"),
    ));

    out.push_str("## Overview\n\n| Metric | Value |\n|--------|-------|\n");
    for (metric, value) in [
        ("Documents", stats.total_documents),
        ("Chunks", stats.total_chunks),
        ("Total tokens", stats.total_tokens),
        ("Entities", stats.total_entities),
        ("Relationships", stats.total_edges),
        ("Cycles", stats.cycles),
    ] {
        out.push_str(&format!("| {metric} | {value} |\n"));
    }

    out.push_str("\n## Quick Start\n\n");
    let mut starters: Vec<&DocumentEntry> = index
        .documents
        .iter()
        .filter(|d| d.category == Category::Tutorial)
        .take(QUICK_START_LIMIT)
        .collect();
    if starters.is_empty() {
        starters = index.documents.iter().take(QUICK_START_LIMIT).collect();
    }
    if starters.is_empty() {
        out.push_str("No documents were indexed.\n");
    }
    for doc in starters {
        if doc.summary.is_empty() {
            out.push_str(&format!("- {}\n", link(doc)));
        } else {
            out.push_str(&format!("- {}: {}\n", link(doc), doc.summary));
        }
    }

    out.push_str("\n## Documents by Category\n");
    for category in Category::ALL {
        let docs: Vec<&DocumentEntry> = index
            .documents
            .iter()
            .filter(|d| d.category == category)
            .collect();
        if docs.is_empty() {
            continue;
        }
        out.push_str(&format!("\n### {} ({})\n\n", title_case(category), docs.len()));
        out.push_str("| Document | Difficulty | Reading time | Tags |\n");
        out.push_str("|----------|------------|--------------|------|\n");
        for doc in docs {
            out.push_str(&format!(
                "| {} | {} | {} min | {} |\n",
                cell(&link(doc)),
                doc.difficulty.as_str(),
                doc.reading_time,
                cell(&doc.tags.join(", ")),
            ));
        }
    }

    out.push_str("\n## Top Keywords\n\n| Keyword | Documents |\n|---------|-----------|\n");
    let mut keywords: Vec<(&String, usize)> =
        index.keywords.iter().map(|(k, ids)| (k, ids.len())).collect();
    keywords.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (keyword, count) in keywords.into_iter().take(TOP_KEYWORDS) {
        out.push_str(&format!("| {} | {count} |\n", cell(keyword)));
    }

    out.push_str(
        "\n## Search Guide\n\n\
         - Keywords: `INDEX.json` under `keywords`\n\
         - Entities: `ENTITY_INDEX.json`\n\
         - Dependency graph: `DOCUMENTATION_DAG.json`, per-subsystem graphs in `dags/`\n\
         - Document relations: `KNOWLEDGE_GRAPH.json`\n\
         - Chunks: `chunks_manifest.json`, files in `chunks/`\n\
         - Structural checks: `validation_report.json`\n",
    );

    out.push_str("\n## All Documents\n\n");
    let mut all: Vec<&DocumentEntry> = index.documents.iter().collect();
    all.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    for doc in all {
        out.push_str(&format!("- {} `{}`\n", link(doc), doc.id));
    }

    out
}

/// Render `QUICKREF.md`, a short entry point for agents and scripts.
pub fn render_quickref(index: &IndexFile) -> String {
    let mut out = String::from("# Quick Reference\n\n");
    let stats = &index.stats;

    out.push_str("## Category Prefixes\n\n| Prefix | Category | Documents |\n|--------|----------|-----------|\n");
    let counts: BTreeMap<&str, usize> = stats
        .by_category
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect();
    for category in Category::ALL {
        let count = counts.get(category.as_str()).copied().unwrap_or(0);
        out.push_str(&format!(
            "| `{}/` | {} | {count} |\n",
            category.as_str(),
            category.tag(),
        ));
    }

    out.push_str(
        "\n## Chunk Lookup\n\n\
         Chunk IDs have the form `{doc_id}#chunk-{n}`. Chunk files replace `/` and `#` with `-`:\n\n\
         `chunks/{category}-{subcategory}-{slug}-chunk-{n}.md`\n\n\
         `chunks_manifest.json` lists every chunk with its token count and type.\n",
    );

    out.push_str("\n## Token Costs\n\n| Scope | Average tokens |\n|-------|----------------|\n");
    out.push_str(&format!(
        "| Document | {} |\n",
        average(stats.total_tokens, stats.total_documents),
    ));
    out.push_str(&format!(
        "| Chunk | {} |\n",
        average(stats.total_tokens, stats.total_chunks),
    ));

    out.push_str("\nSee [COMPASS.md](COMPASS.md) for the full overview.\n");
    out
}
