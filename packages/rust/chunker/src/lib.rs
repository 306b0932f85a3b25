//! Heading-aware chunking of transformed documents.
//!
//! A document is split at H2. Sections above the token limit are re-split
//! at H3, and fenced blocks longer than the code threshold become chunks of
//! their own. Every document yields at least one chunk.

mod classify;
mod render;
mod split;

use docweave_shared::syntax;
use docweave_shared::{Chunk, ChunkType, ChunkingConfig, TransformedDocument, estimate_tokens};
use tracing::{debug, instrument};

pub use classify::{NO_SUMMARY, classify, has_body_text, summarize};
pub use render::{ChunkLinks, MAX_RELATED, MIN_SHARED_TAGS, link_chunks, render_chunk};
pub use split::{Piece, Section, extract_large_code, split_at_level};

/// Limits that control where documents are split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    pub max_section_tokens: usize,
    pub large_code_block_lines: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self::from(&ChunkingConfig::default())
    }
}

impl From<&ChunkingConfig> for ChunkOptions {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            max_section_tokens: config.max_section_tokens,
            large_code_block_lines: config.large_code_block_lines,
        }
    }
}

/// Split one document into ordered chunks numbered from 1.
#[instrument(skip_all, fields(id = %doc.identity.id))]
pub fn chunk_document(doc: &TransformedDocument, options: &ChunkOptions) -> Vec<Chunk> {
    let mut builder = ChunkBuilder::new(doc);

    for section in split_at_level(&doc.body, 2) {
        let mut path = vec![doc.title.clone()];
        path.extend(section.heading.clone());

        let tokens = estimate_tokens(syntax::word_count(&section.content));
        if section.heading.is_some() && tokens > options.max_section_tokens {
            debug!(heading = ?section.heading, tokens, "re-splitting oversized section at H3");
            for sub in split_at_level(&section.content, 3) {
                let mut sub_path = path.clone();
                sub_path.extend(sub.heading);
                builder.add_section(sub_path, &sub.content, options);
            }
        } else {
            builder.add_section(path, &section.content, options);
        }
    }

    let chunks = builder.finish();
    debug!(chunks = chunks.len(), "chunked document");
    chunks
}

struct ChunkBuilder<'a> {
    doc: &'a TransformedDocument,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkBuilder<'a> {
    fn new(doc: &'a TransformedDocument) -> Self {
        Self {
            doc,
            chunks: Vec::new(),
        }
    }

    fn add_section(&mut self, heading_path: Vec<String>, content: &str, options: &ChunkOptions) {
        for piece in extract_large_code(content, options.large_code_block_lines) {
            if piece.is_code {
                self.push(heading_path.clone(), piece.content, ChunkType::Code);
            } else if has_body_text(&piece.content) {
                let chunk_type = classify(&piece.content);
                self.push(heading_path.clone(), piece.content, chunk_type);
            }
        }
    }

    fn push(&mut self, heading_path: Vec<String>, content: String, chunk_type: ChunkType) {
        let index = self.chunks.len() + 1;
        self.chunks.push(Chunk {
            doc_id: self.doc.identity.id.clone(),
            chunk_id: format!("{}#chunk-{index}", self.doc.identity.id),
            index,
            heading_path,
            chunk_type,
            tokens: estimate_tokens(syntax::word_count(&content)),
            summary: summarize(&content),
            content,
        });
    }

    /// Chunks produced so far, or the whole document as a single chunk.
    fn finish(mut self) -> Vec<Chunk> {
        if self.chunks.is_empty() {
            let content = self.doc.body.trim().to_string();
            let chunk_type = classify(&content);
            self.push(vec![self.doc.title.clone()], content, chunk_type);
        }
        self.chunks
    }
}
