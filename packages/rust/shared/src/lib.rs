//! Shared types, error model, configuration, and markdown grammar for docweave.
//!
//! This crate is the foundation depended on by all other docweave crates.
//! It provides:
//! - [`DocweaveError`], the unified error type
//! - Stage records ([`SourceFile`], [`DocumentAnalysis`], [`TransformedDocument`], [`Chunk`])
//! - Configuration ([`AppConfig`], config loading)
//! - Fence-aware line grammar ([`syntax`])

pub mod config;
pub mod error;
pub mod syntax;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChunkingConfig, DefaultsConfig, DiscoveryConfig, PipelineSettings, config_dir,
    config_file_path, init_config, init_config_in, load_config, load_config_from,
};
pub use error::{DocweaveError, Result};
pub use types::{
    Category, Chunk, ChunkType, Dependency, DependencyKind, Difficulty, DocumentAnalysis,
    DocumentIdentity, FileError, Frontmatter, FrontmatterValue, Heading, Link, LinkMap, RunId,
    SourceFile, TransformedDocument, content_hash, estimate_tokens, reading_time_minutes,
};
