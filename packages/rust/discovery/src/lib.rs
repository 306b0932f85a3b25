//! Source tree discovery and per-file analysis.
//!
//! [`discover`] walks the source root and returns the candidate files in a
//! stable order. [`analyze`] turns one file's content into a
//! [`DocumentAnalysis`](docweave_shared::DocumentAnalysis).

mod analyze;
mod frontmatter;

use std::path::{Component, Path};

use docweave_shared::{DiscoveryConfig, DocweaveError, Result, SourceFile};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

pub use analyze::{analyze, categorize, first_paragraph, title_from_path};
pub use frontmatter::{parse_frontmatter, split_frontmatter};

/// Walk `root` and return every included file, sorted by relative path.
///
/// A file is included when its extension (case-insensitive) is listed in
/// `include_extensions` and its `/`-separated relative path contains none of
/// the `exclude_patterns`. Unreadable entries are logged and skipped.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover(root: &Path, config: &DiscoveryConfig) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(DocweaveError::config(format!(
            "source directory {} does not exist",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let mut excluded = 0usize;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative_path) = relative_slash_path(root, entry.path()) else {
            continue;
        };

        if !has_included_extension(&relative_path, &config.include_extensions) {
            continue;
        }
        if config
            .exclude_patterns
            .iter()
            .any(|pattern| relative_path.contains(pattern.as_str()))
        {
            excluded += 1;
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(path = %relative_path, error = %e, "skipping file without metadata");
                continue;
            }
        };

        debug!(path = %relative_path, size, "discovered file");
        files.push(SourceFile {
            relative_path,
            size,
        });
    }

    files.sort();
    files.dedup_by(|a, b| a.relative_path == b.relative_path);

    info!(files = files.len(), excluded, "discovery complete");
    Ok(files)
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn has_included_extension(relative_path: &str, extensions: &[String]) -> bool {
    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    let ext = format!(".{}", ext.to_lowercase());
    extensions.iter().any(|allowed| allowed.to_lowercase() == ext)
}
