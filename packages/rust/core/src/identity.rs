//! Document identity assignment.
//!
//! IDs have the form `{category}/{subcategory}/{slug}`. Collisions get a
//! numeric suffix (`-2`, `-3`, ...). Files are processed in sorted path order
//! so the same tree always yields the same IDs.

use std::collections::BTreeSet;

use docweave_shared::syntax::slugify;
use docweave_shared::{DocumentAnalysis, DocumentIdentity, LinkMap};
use tracing::{debug, info, instrument};

/// Maximum slug length in characters.
pub const MAX_SLUG_CHARS: usize = 40;

/// Subcategory for files at the source root.
pub const ROOT_SUBCATEGORY: &str = "general";

const EMPTY_SLUG: &str = "untitled";

/// Top-level folder of a relative path, lower-cased, or `general` at the root.
pub fn subcategory_of(relative_path: &str) -> String {
    match relative_path.split_once('/') {
        Some((folder, _)) if !folder.is_empty() => folder.to_lowercase(),
        _ => ROOT_SUBCATEGORY.to_string(),
    }
}

/// Slug for a relative path: the file stem, slugified.
pub fn slug_of(relative_path: &str) -> String {
    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    let slug = slugify(stem, MAX_SLUG_CHARS);
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

fn output_filename(id: &str) -> String {
    format!("{}.md", id.replace('/', "-"))
}

/// Assign an identity to every analysis.
///
/// The returned identities are aligned with `analyses`. The link map is keyed
/// by source-relative path.
#[instrument(skip_all, fields(documents = analyses.len()))]
pub fn assign_identities(analyses: &[DocumentAnalysis]) -> (Vec<DocumentIdentity>, LinkMap) {
    let mut order: Vec<usize> = (0..analyses.len()).collect();
    order.sort_by(|&a, &b| {
        analyses[a]
            .source
            .relative_path
            .cmp(&analyses[b].source.relative_path)
    });

    let mut used_ids: BTreeSet<String> = BTreeSet::new();
    let mut used_files: BTreeSet<String> = BTreeSet::new();
    let mut assigned: Vec<Option<DocumentIdentity>> = vec![None; analyses.len()];
    let mut collisions = 0usize;

    for idx in order {
        let analysis = &analyses[idx];
        let path = analysis.source.relative_path.as_str();
        let subcategory = subcategory_of(path);
        let base_slug = slug_of(path);
        let base = format!("{}/{subcategory}/{base_slug}", analysis.category.as_str());

        let mut slug = base_slug.clone();
        let mut id = base.clone();
        let mut suffix = 2usize;
        while used_ids.contains(&id) || used_files.contains(&output_filename(&id)) {
            slug = format!("{base_slug}-{suffix}");
            id = format!("{base}-{suffix}");
            suffix += 1;
        }
        if suffix > 2 {
            collisions += 1;
            debug!(path, %id, "resolved ID collision");
        }

        let filename = output_filename(&id);
        used_ids.insert(id.clone());
        used_files.insert(filename.clone());
        assigned[idx] = Some(DocumentIdentity {
            id,
            output_filename: filename,
            subcategory,
            slug,
        });
    }

    let identities: Vec<DocumentIdentity> = assigned.into_iter().flatten().collect();
    let links: LinkMap = analyses
        .iter()
        .zip(&identities)
        .map(|(analysis, identity)| (analysis.source.relative_path.clone(), identity.clone()))
        .collect();

    info!(documents = identities.len(), collisions, "identities assigned");
    (identities, links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_shared::{Category, SourceFile};

    fn analysis(path: &str, category: Category) -> DocumentAnalysis {
        DocumentAnalysis {
            source: SourceFile {
                relative_path: path.into(),
                size: 0,
            },
            title: "T".into(),
            category,
            headings: vec![],
            links: vec![],
            first_paragraph: String::new(),
            word_count: 0,
            has_code: false,
            has_tables: false,
            frontmatter: Default::default(),
            content_hash: String::new(),
            body: String::new(),
        }
    }

    #[test]
    fn subcategory_and_slug() {
        assert_eq!(subcategory_of("Guide/Setup.md"), "guide");
        assert_eq!(subcategory_of("setup.md"), "general");
        assert_eq!(slug_of("guide/Getting Started.md"), "getting-started");
        assert_eq!(slug_of("a/my_notes.mdx"), "my-notes");
        assert_eq!(slug_of("a/!!!.md"), "untitled");
        assert_eq!(slug_of(&format!("{}.md", "x".repeat(60))).len(), MAX_SLUG_CHARS);
    }

    #[test]
    fn ids_follow_category_subcategory_slug() {
        let analyses = vec![
            analysis("guide/setup.md", Category::Tutorial),
            analysis("README.md", Category::Meta),
        ];
        let (ids, links) = assign_identities(&analyses);
        assert_eq!(ids[0].id, "tutorial/guide/setup");
        assert_eq!(ids[0].output_filename, "tutorial-guide-setup.md");
        assert_eq!(ids[1].id, "meta/general/readme");
        assert_eq!(links["guide/setup.md"], ids[0]);
    }

    #[test]
    fn collisions_are_suffixed_in_path_order() {
        // Given out of order on purpose.
        let analyses = vec![
            analysis("guide/setup.mdx", Category::Tutorial),
            analysis("guide/Setup.md", Category::Tutorial),
            analysis("guide/setup.txt", Category::Tutorial),
        ];
        let (ids, _) = assign_identities(&analyses);
        assert_eq!(ids[1].id, "tutorial/guide/setup");
        assert_eq!(ids[0].id, "tutorial/guide/setup-2");
        assert_eq!(ids[2].id, "tutorial/guide/setup-3");
        assert_eq!(ids[2].slug, "setup-3");
        assert_eq!(ids[2].output_filename, "tutorial-guide-setup-3.md");
    }

    #[test]
    fn filename_clashes_across_ids_are_suffixed() {
        // `a-b/c` and `a/b-c` differ as IDs but share a filename.
        let analyses = vec![
            analysis("b/c-d.md", Category::Concept),
            analysis("b-c/d.md", Category::Concept),
        ];
        let (ids, _) = assign_identities(&analyses);
        let mut files: Vec<&str> = ids.iter().map(|i| i.output_filename.as_str()).collect();
        files.sort();
        files.dedup();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn assignment_is_deterministic() {
        let analyses = vec![
            analysis("x/one.md", Category::Concept),
            analysis("x/One.md", Category::Concept),
            analysis("y/two.md", Category::Ref),
        ];
        let first = assign_identities(&analyses).0;
        let second = assign_identities(&analyses).0;
        assert_eq!(first, second);
    }
}
