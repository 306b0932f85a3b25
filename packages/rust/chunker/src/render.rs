//! Chunk file rendering with sequence and related-chunk navigation.

use std::collections::{BTreeMap, BTreeSet};

use docweave_shared::Chunk;

/// Related links list at most this many chunks.
pub const MAX_RELATED: usize = 4;

/// Documents must share at least this many tags to be related.
pub const MIN_SHARED_TAGS: usize = 2;

/// Navigation targets of one chunk file, as chunk file names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkLinks {
    pub prev: Option<String>,
    pub next: Option<String>,
    /// `(doc_id, file_name)` of the first chunk of each related document.
    pub related: Vec<(String, String)>,
}

impl ChunkLinks {
    pub fn is_empty(&self) -> bool {
        self.prev.is_none() && self.next.is_none() && self.related.is_empty()
    }
}

/// Compute navigation for `chunks`, which must be grouped by document in order.
///
/// `doc_tags` maps document IDs to their tags. Related documents share at
/// least [`MIN_SHARED_TAGS`] tags and are ordered by most shared, then ID.
pub fn link_chunks(chunks: &[Chunk], doc_tags: &BTreeMap<String, Vec<String>>) -> Vec<ChunkLinks> {
    let mut first_chunk: BTreeMap<&str, String> = BTreeMap::new();
    for chunk in chunks {
        first_chunk
            .entry(chunk.doc_id.as_str())
            .or_insert_with(|| chunk.file_name());
    }

    let related_by_doc: BTreeMap<&str, Vec<(String, String)>> = first_chunk
        .keys()
        .map(|doc_id| (*doc_id, related_docs(doc_id, doc_tags, &first_chunk)))
        .collect();

    chunks
        .iter()
        .enumerate()
        .map(|(idx, chunk)| {
            let same_doc = |other: &Chunk| other.doc_id == chunk.doc_id;
            let prev = idx
                .checked_sub(1)
                .and_then(|i| chunks.get(i))
                .filter(|c| same_doc(*c))
                .map(Chunk::file_name);
            let next = chunks
                .get(idx + 1)
                .filter(|c| same_doc(*c))
                .map(Chunk::file_name);
            ChunkLinks {
                prev,
                next,
                related: related_by_doc
                    .get(chunk.doc_id.as_str())
                    .cloned()
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn related_docs(
    doc_id: &str,
    doc_tags: &BTreeMap<String, Vec<String>>,
    first_chunk: &BTreeMap<&str, String>,
) -> Vec<(String, String)> {
    let Some(own) = doc_tags.get(doc_id) else {
        return Vec::new();
    };
    let own: BTreeSet<&str> = own.iter().map(String::as_str).collect();

    let mut scored: Vec<(usize, &str)> = first_chunk
        .keys()
        .filter(|other| **other != doc_id)
        .filter_map(|other| {
            let shared = doc_tags
                .get(*other)?
                .iter()
                .filter(|t| own.contains(t.as_str()))
                .count();
            (shared >= MIN_SHARED_TAGS).then_some((shared, *other))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    scored
        .into_iter()
        .take(MAX_RELATED)
        .filter_map(|(_, other)| {
            first_chunk
                .get(other)
                .map(|file| (other.to_string(), file.clone()))
        })
        .collect()
}

/// Render a chunk file: frontmatter, content, then the navigation footer.
pub fn render_chunk(chunk: &Chunk, links: &ChunkLinks) -> String {
    let heading_path = serde_json::Value::from(chunk.heading_path.clone());
    let summary = serde_json::Value::from(chunk.summary.as_str());

    let mut out = format!(
        "---\ndoc_id: {}\nchunk_id: {}\nheading_path: {heading_path}\nchunk_type: {}\ntokens: {}\nsummary: {summary}\n---\n\n{}\n",
        chunk.doc_id,
        chunk.chunk_id,
        chunk.chunk_type.as_str(),
        chunk.tokens,
        chunk.content.trim_end(),
    );

    if !links.is_empty() {
        out.push_str("\n---\n<!-- Navigation (auto-generated) -->\n");
        let sequence: Vec<String> = [
            links.prev.as_ref().map(|f| format!("[<< Prev](./{f})")),
            links.next.as_ref().map(|f| format!("[Next >>](./{f})")),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !sequence.is_empty() {
            out.push_str(&format!("**Sequence:** {}\n", sequence.join(" | ")));
        }
        if !links.related.is_empty() {
            let related: Vec<String> = links
                .related
                .iter()
                .map(|(doc_id, file)| format!("[{doc_id}](./{file})"))
                .collect();
            out.push_str(&format!("**Related:** {}\n", related.join(", ")));
        }
    }

    out
}
