//! End-to-end run: source tree → analysis → identities → transform/chunk →
//! graph, indexes, validation → output directory.
//!
//! Per-document stages run as tokio tasks bounded by a semaphore. Identity
//! assignment and everything from the graph onward run after a full barrier.
//! A failure in one document is recorded and never affects another.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use docweave_artifacts::build_artifacts;
use docweave_chunker::{ChunkOptions, chunk_document, link_chunks, render_chunk};
use docweave_discovery::{analyze, discover};
use docweave_graph::build_graph;
use docweave_markdown::{render_document, transform};
use docweave_shared::{
    AppConfig, Chunk, DiscoveryConfig, DocumentAnalysis, DocumentIdentity, DocweaveError,
    FileError, LinkMap, Result, RunId, SourceFile, TransformedDocument,
};
use docweave_validator::{known_targets, validate_all};

use crate::assembler::{self, CHUNKS_DIR, DOCS_DIR, ManifestFile, RenderedFile, RunManifest};
use crate::identity::assign_identities;

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub discovery: DiscoveryConfig,
    pub chunking: ChunkOptions,
    /// Maximum documents processed at once.
    pub workers: usize,
    pub tool_version: String,
}

impl RunConfig {
    /// Build run settings from the loaded config and the chosen directories.
    pub fn from_app_config(
        config: &AppConfig,
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        tool_version: impl Into<String>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            discovery: config.discovery.clone(),
            chunking: ChunkOptions::from(&config.chunking),
            workers: config.pipeline.workers,
            tool_version: tool_version.into(),
        }
    }
}

/// Final tally of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub output_dir: PathBuf,
    pub documents: usize,
    pub chunks: usize,
    pub entities: usize,
    pub edges: usize,
    pub cycles: usize,
    pub files_passed: usize,
    pub files_failed: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    /// Files skipped because a stage failed for them.
    pub file_errors: Vec<FileError>,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a document finishes a per-document stage.
    fn document_done(&self, path: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_done(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Output of the transform stage for one document.
struct Processed {
    doc: TransformedDocument,
    chunks: Vec<Chunk>,
    rendered: String,
}

/// Execute a full run.
#[instrument(skip_all, fields(source = %config.source_dir.display(), output = %config.output_dir.display()))]
pub async fn run(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<RunSummary> {
    let start = Instant::now();
    let run_id = RunId::new();
    let mut file_errors: Vec<FileError> = Vec::new();

    // --- Phase 1: Discovery ---
    progress.phase("Discovering files...");
    let files = discover(&config.source_dir, &config.discovery)?;
    let discovered_at = Utc::now();
    assembler::prepare_output_dir(&config.output_dir)?;
    info!(files = files.len(), "discovery finished");

    // --- Phase 2: Analysis ---
    progress.phase("Analyzing documents...");
    let analyses = analyze_all(
        &config.source_dir,
        files,
        config.workers,
        progress,
        &mut file_errors,
    )
    .await;

    // --- Phase 3: Identity (barrier) ---
    progress.phase("Assigning identities...");
    let (identities, links) = assign_identities(&analyses);
    let hashes: BTreeMap<String, String> = analyses
        .iter()
        .map(|a| (a.source.relative_path.clone(), a.content_hash.clone()))
        .collect();

    // --- Phase 4: Transform + chunk ---
    progress.phase("Transforming documents...");
    let processed = transform_all(
        analyses,
        identities,
        Arc::new(links),
        config.chunking,
        config.workers,
        progress,
        &mut file_errors,
    )
    .await;

    // --- Phase 5: Graph, indexes, validation (barrier) ---
    progress.phase("Building graph and indexes...");
    let mut docs = Vec::with_capacity(processed.len());
    let mut chunks = Vec::new();
    let mut doc_files = Vec::with_capacity(processed.len());
    for item in processed {
        doc_files.push(RenderedFile {
            relative_path: format!("{DOCS_DIR}/{}", item.doc.identity.output_filename),
            origin: item.doc.source_path.clone(),
            content: item.rendered,
        });
        chunks.extend(item.chunks);
        docs.push(item.doc);
    }

    let graph = build_graph(&docs);
    let generated = Utc::now();
    let artifacts = build_artifacts(&docs, &chunks, &graph, generated);

    let known = known_targets(docs.iter().map(|d| d.identity.output_filename.as_str()));
    let to_validate: Vec<(String, String)> = doc_files
        .iter()
        .map(|f| (f.relative_path.clone(), f.content.clone()))
        .collect();
    let report = validate_all(&to_validate, &known, generated);

    let doc_tags: BTreeMap<String, Vec<String>> = docs
        .iter()
        .map(|d| (d.identity.id.clone(), d.tags.clone()))
        .collect();
    let origins: BTreeMap<&str, &str> = docs
        .iter()
        .map(|d| (d.identity.id.as_str(), d.source_path.as_str()))
        .collect();
    let chunk_files: Vec<RenderedFile> = chunks
        .iter()
        .zip(link_chunks(&chunks, &doc_tags))
        .map(|(chunk, chunk_links)| RenderedFile {
            relative_path: format!("{CHUNKS_DIR}/{}", chunk.file_name()),
            origin: origins
                .get(chunk.doc_id.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| chunk.doc_id.clone()),
            content: render_chunk(chunk, &chunk_links),
        })
        .collect();

    // --- Phase 6: Write ---
    progress.phase("Writing output...");
    let (written_docs, doc_write_errors) =
        assembler::write_rendered(&config.output_dir, &doc_files);
    let (_, chunk_write_errors) = assembler::write_rendered(&config.output_dir, &chunk_files);
    file_errors.extend(doc_write_errors);
    file_errors.extend(chunk_write_errors);
    let artifact_metas = assembler::write_artifacts(&config.output_dir, &artifacts, &report)?;

    let written: BTreeSet<&str> = written_docs.iter().map(String::as_str).collect();
    let manifest_files: Vec<ManifestFile> = docs
        .iter()
        .filter(|d| written.contains(format!("{DOCS_DIR}/{}", d.identity.output_filename).as_str()))
        .map(|d| {
            let hash = hashes.get(&d.source_path).map(String::as_str).unwrap_or_default();
            ManifestFile::new(d, hash)
        })
        .collect();

    let manifest = RunManifest {
        run_id: run_id.clone(),
        tool_version: config.tool_version.clone(),
        source_dir: display_path(&config.source_dir),
        output_dir: display_path(&config.output_dir),
        discovered_at,
        completed_at: Utc::now(),
        files: manifest_files,
        errors: file_errors.clone(),
        artifacts: artifact_metas,
    };
    assembler::write_manifest(&config.output_dir, &manifest)?;

    let summary = RunSummary {
        run_id,
        output_dir: config.output_dir.clone(),
        documents: docs.len(),
        chunks: chunks.len(),
        entities: graph.nodes.len(),
        edges: graph.edges.len(),
        cycles: graph.cycles.len(),
        files_passed: report.summary.files_passed,
        files_failed: report.summary.files_failed,
        total_errors: report.summary.total_errors,
        total_warnings: report.summary.total_warnings,
        file_errors,
        elapsed: start.elapsed(),
    };

    info!(
        documents = summary.documents,
        chunks = summary.chunks,
        entities = summary.entities,
        cycles = summary.cycles,
        skipped = summary.file_errors.len(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "run complete"
    );

    progress.done(&summary);
    Ok(summary)
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

// ---------------------------------------------------------------------------
// Per-document stages
// ---------------------------------------------------------------------------

/// Read and analyze every file. Failures are recorded under `analyze`.
async fn analyze_all(
    root: &Path,
    files: Vec<SourceFile>,
    workers: usize,
    progress: &dyn ProgressReporter,
    errors: &mut Vec<FileError>,
) -> Vec<DocumentAnalysis> {
    let root = Arc::new(root.to_path_buf());
    let paths: Vec<String> = files.iter().map(|f| f.relative_path.clone()).collect();

    let results = run_bounded(files, workers, move |source: SourceFile| {
        let root = root.clone();
        async move {
            let path = root.join(&source.relative_path);
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| DocweaveError::io(&path, e))?;
            let content = String::from_utf8(bytes).map_err(|e| {
                DocweaveError::parse(format!("{} is not valid UTF-8: {e}", source.relative_path))
            })?;
            Ok::<_, DocweaveError>(analyze(&source, &content))
        }
    })
    .await;

    collect_results(results, &paths, "analyze", progress, errors)
}

/// Transform, render, and chunk every analyzed document.
async fn transform_all(
    analyses: Vec<DocumentAnalysis>,
    identities: Vec<DocumentIdentity>,
    links: Arc<LinkMap>,
    options: ChunkOptions,
    workers: usize,
    progress: &dyn ProgressReporter,
    errors: &mut Vec<FileError>,
) -> Vec<Processed> {
    let paths: Vec<String> = analyses
        .iter()
        .map(|a| a.source.relative_path.clone())
        .collect();
    let items: Vec<(DocumentAnalysis, DocumentIdentity)> =
        analyses.into_iter().zip(identities).collect();

    let run_one = move |(analysis, identity): (DocumentAnalysis, DocumentIdentity)| {
        let links = links.clone();
        async move {
            // CPU-bound; runs on the blocking pool while the permit is held.
            tokio::task::spawn_blocking(move || {
                let doc = transform(&analysis, &identity, &links);
                let rendered = render_document(&doc);
                let chunks = chunk_document(&doc, &options);
                Processed {
                    doc,
                    chunks,
                    rendered,
                }
            })
            .await
            .map_err(|e| DocweaveError::worker(format!("transform task failed: {e}")))
        }
    };
    let results = run_bounded(items, workers, run_one).await;

    collect_results(results, &paths, "transform", progress, errors)
}

/// Keep successes in input order; record failures against their path.
fn collect_results<T>(
    results: Vec<std::result::Result<T, String>>,
    paths: &[String],
    stage: &str,
    progress: &dyn ProgressReporter,
    errors: &mut Vec<FileError>,
) -> Vec<T> {
    let total = results.len();
    let mut ok = Vec::with_capacity(total);

    for (i, (result, path)) in results.into_iter().zip(paths).enumerate() {
        match result {
            Ok(value) => ok.push(value),
            Err(message) => {
                warn!(path = %path, stage, error = %message, "skipping file");
                errors.push(FileError {
                    path: path.clone(),
                    stage: stage.to_string(),
                    message,
                });
            }
        }
        progress.document_done(path, i + 1, total);
    }

    ok
}

/// Run `task` for every item on the tokio runtime, at most `workers` at a
/// time. Results come back in input order; a panicking task becomes an error.
async fn run_bounded<T, R, F, Fut>(
    items: Vec<T>,
    workers: usize,
    task: F,
) -> Vec<std::result::Result<R, String>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::with_capacity(items.len());

    for item in items {
        let sem = semaphore.clone();
        let fut = task(item);
        handles.push(tokio::spawn(async move {
            let _permit = sem
                .acquire()
                .await
                .map_err(|e| DocweaveError::worker(format!("worker pool closed: {e}")))?;
            fut.await
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(match handle.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("worker task failed: {e}")),
        });
    }
    results
}
