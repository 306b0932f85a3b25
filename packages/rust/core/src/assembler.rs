//! Output directory assembler.
//!
//! Writes rendered documents, chunks, aggregate JSON files, navigation pages,
//! and the run manifest. Every file is written to a `.{name}.tmp` sibling
//! first and then renamed into place.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use docweave_artifacts::Artifacts;
use docweave_shared::{
    Category, DocweaveError, FileError, Result, RunId, TransformedDocument, content_hash,
};
use docweave_validator::ValidationReport;

/// Rendered documents, relative to the output root.
pub const DOCS_DIR: &str = "docs";
/// Rendered chunks, relative to the output root.
pub const CHUNKS_DIR: &str = "chunks";
/// Per-subsystem DAG files, relative to the output root.
pub const DAGS_DIR: &str = "dags";

pub const MANIFEST_FILE: &str = "manifest.json";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A rendered file waiting to be written.
#[derive(Debug, Clone)]
pub struct RenderedFile {
    /// Path relative to the output root, `/`-separated.
    pub relative_path: String,
    /// Source file it came from, used in error records.
    pub origin: String,
    pub content: String,
}

/// Metadata for one written aggregate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// One processed document in `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestFile {
    pub source_path: String,
    pub id: String,
    pub filename: String,
    pub title: String,
    pub category: Category,
    pub subcategory: String,
    pub word_count: usize,
    pub tags: Vec<String>,
    pub content_hash: String,
}

/// Content of `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub tool_version: String,
    pub source_dir: String,
    pub output_dir: String,
    pub discovered_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub files: Vec<ManifestFile>,
    pub errors: Vec<FileError>,
    /// Aggregate files written by the run, with checksums.
    pub artifacts: Vec<ArtifactMeta>,
}

impl ManifestFile {
    pub fn new(doc: &TransformedDocument, content_hash: &str) -> Self {
        Self {
            source_path: doc.source_path.clone(),
            id: doc.identity.id.clone(),
            filename: doc.identity.output_filename.clone(),
            title: doc.title.clone(),
            category: doc.category,
            subcategory: doc.identity.subcategory.clone(),
            word_count: doc.word_count,
            tags: doc.tags.clone(),
            content_hash: content_hash.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Create the output root and its subdirectories.
pub fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    let dirs = [
        output_dir.to_path_buf(),
        output_dir.join(DOCS_DIR),
        output_dir.join(CHUNKS_DIR),
        output_dir.join(DAGS_DIR),
    ];

    for dir in &dirs {
        std::fs::create_dir_all(dir).map_err(|e| DocweaveError::io(dir, e))?;
    }

    debug!(path = %output_dir.display(), "output directories ready");
    Ok(())
}

/// Write `content` to `root/relative` through a temp file and a rename.
pub fn write_atomic(root: &Path, relative: &str, content: &[u8]) -> Result<ArtifactMeta> {
    let target = root.join(relative);
    let parent = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| DocweaveError::output(format!("invalid output path: {relative}")))?;
    let temp = parent.join(format!(".{name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| DocweaveError::io(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, &target) {
        let _ = std::fs::remove_file(&temp);
        return Err(DocweaveError::io(&target, e));
    }

    debug!(file = relative, size = content.len(), "wrote file");
    Ok(ArtifactMeta {
        filename: relative.to_string(),
        sha256: content_hash(content),
        size_bytes: content.len(),
    })
}

/// Write a pretty-printed JSON file.
pub fn write_json<T: Serialize>(root: &Path, relative: &str, data: &T) -> Result<ArtifactMeta> {
    let json = serde_json::to_string_pretty(data)?;
    write_atomic(root, relative, json.as_bytes())
}

/// Write per-document files. A failed write is recorded and skipped.
///
/// Returns the relative paths that were written and the failures.
#[instrument(skip_all, fields(files = files.len()))]
pub fn write_rendered(root: &Path, files: &[RenderedFile]) -> (Vec<String>, Vec<FileError>) {
    let mut written = Vec::with_capacity(files.len());
    let mut errors = Vec::new();

    for file in files {
        match write_atomic(root, &file.relative_path, file.content.as_bytes()) {
            Ok(_) => written.push(file.relative_path.clone()),
            Err(e) => {
                warn!(path = %file.relative_path, error = %e, "write failed");
                errors.push(FileError {
                    path: file.origin.clone(),
                    stage: "write".into(),
                    message: e.to_string(),
                });
            }
        }
    }

    (written, errors)
}

/// Write every aggregate file of the run.
#[instrument(skip_all, fields(output = %root.display()))]
pub fn write_artifacts(
    root: &Path,
    artifacts: &Artifacts,
    report: &ValidationReport,
) -> Result<Vec<ArtifactMeta>> {
    let mut metas = vec![
        write_json(root, "INDEX.json", &artifacts.index)?,
        write_json(root, "DOCUMENTATION_DAG.json", &artifacts.dag)?,
        write_json(root, "ENTITY_INDEX.json", &artifacts.entity_index)?,
        write_json(root, "KNOWLEDGE_GRAPH.json", &artifacts.knowledge_graph)?,
        write_json(root, "chunks_manifest.json", &artifacts.chunks_manifest)?,
        write_json(root, "validation_report.json", report)?,
        write_atomic(root, "COMPASS.md", artifacts.compass.as_bytes())?,
        write_atomic(root, "QUICKREF.md", artifacts.quickref.as_bytes())?,
    ];

    for (system, dag) in &artifacts.subsystem_dags {
        metas.push(write_json(
            root,
            &format!("{DAGS_DIR}/{system}_dag.json"),
            dag,
        )?);
    }

    info!(count = metas.len(), "aggregate files written");
    Ok(metas)
}

/// Write `manifest.json` last, once every other file is in place.
pub fn write_manifest(root: &Path, manifest: &RunManifest) -> Result<PathBuf> {
    write_json(root, MANIFEST_FILE, manifest)?;
    Ok(root.join(MANIFEST_FILE))
}
