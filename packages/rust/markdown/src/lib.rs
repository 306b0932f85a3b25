//! Document transformation: analysis + identity → normalized markdown.
//!
//! [`transform`] applies a fixed sequence of passes to one document body:
//! 1. Repair the heading structure (single H1, no gaps, max depth 4)
//! 2. Label unlabeled code fences with an inferred language
//! 3. Rewrite internal links to output filenames
//! 4. Insert a context callout after the H1
//! 5. Append a "See Also" section
//! 6. Normalize whitespace outside fenced code
//!
//! It then derives tags, difficulty, entities, and dependencies. The result
//! is rendered to its final file form by [`render_document`].

mod code_blocks;
mod extract;
mod headings;
mod links;
mod metadata;
mod sections;
mod tags;
mod tidy;

use docweave_shared::{
    DocumentAnalysis, DocumentIdentity, LinkMap, TransformedDocument, reading_time_minutes,
};
use tracing::{debug, instrument};

pub use code_blocks::{FALLBACK_LANGUAGE, LabeledBlocks, infer_language, label_code_blocks};
pub use extract::{MAX_ENTITIES, extract_dependencies, extract_entities, heading_slug};
pub use headings::repair_headings;
pub use links::{ResolvedTarget, RewrittenLinks, resolve_target, rewrite_links, rewrite_target};
pub use metadata::{
    METADATA_OPEN, render_document, render_frontmatter, render_metadata_block, xml_escape,
};
pub use sections::{
    INDEX_LINK_TARGET, MAX_SEE_ALSO, append_see_also, has_context, has_see_also, insert_context,
};
pub use tags::{MAX_TAGS, classify_difficulty, generate_tags};

/// Transform one analyzed document using the run's link map.
#[instrument(skip_all, fields(path = %analysis.source.relative_path, id = %identity.id))]
pub fn transform(
    analysis: &DocumentAnalysis,
    identity: &DocumentIdentity,
    links: &LinkMap,
) -> TransformedDocument {
    let source_path = analysis.source.relative_path.as_str();
    let title = if analysis.title.trim().is_empty() {
        identity.slug.clone()
    } else {
        analysis.title.trim().to_string()
    };

    let repaired = repair_headings(&analysis.body, &title);
    let labeled = label_code_blocks(&repaired);
    let rewritten = rewrite_links(&labeled.body, source_path, links);
    let with_context = insert_context(&rewritten.body, &analysis.first_paragraph);
    let entries = see_also_entries(analysis, links);
    let body = tidy::tidy(&append_see_also(&with_context, &entries));

    let tags = generate_tags(analysis, &identity.subcategory);
    let difficulty = classify_difficulty(analysis);
    let entities = extract_entities(&analysis.body);
    let dependencies = extract_dependencies(&analysis.body, &rewritten.linked_doc_ids);

    debug!(
        tags = tags.len(),
        entities = entities.len(),
        dependencies = dependencies.len(),
        linked = rewritten.linked_doc_ids.len(),
        labeled_fences = labeled.labeled,
        "transformed document"
    );

    TransformedDocument {
        identity: identity.clone(),
        source_path: source_path.to_string(),
        title,
        category: analysis.category,
        tags,
        difficulty,
        reading_time_minutes: reading_time_minutes(analysis.word_count),
        word_count: analysis.word_count,
        summary: analysis.first_paragraph.clone(),
        entities,
        dependencies,
        linked_doc_ids: rewritten.linked_doc_ids,
        body,
    }
}

/// Up to [`MAX_SEE_ALSO`] distinct internal links, rewritten where they resolve.
fn see_also_entries(analysis: &DocumentAnalysis, links: &LinkMap) -> Vec<(String, String)> {
    let source_path = analysis.source.relative_path.as_str();
    let mut entries: Vec<(String, String)> = Vec::new();

    for link in analysis
        .links
        .iter()
        .filter(|l| l.is_internal && !l.target.starts_with('#'))
    {
        let target = rewrite_target(source_path, &link.target, links)
            .unwrap_or_else(|| link.target.clone());
        if entries.iter().any(|(_, t)| *t == target) {
            continue;
        }
        entries.push((link.text.clone(), target));
        if entries.len() == MAX_SEE_ALSO {
            break;
        }
    }

    entries
}
