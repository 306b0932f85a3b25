//! Application configuration for docweave.
//!
//! User config lives at `~/.docweave/docweave.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocweaveError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docweave.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docweave";

// ---------------------------------------------------------------------------
// Config structs (matching docweave.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Source tree filtering.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Chunk sizing thresholds.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Worker pool settings.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory scanned when no source is given on the command line.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Directory written when no output is given on the command line.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_source_dir() -> String {
    "docs".into()
}
fn default_output_dir() -> String {
    "docs/_indexed".into()
}

/// `[discovery]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Path substrings that exclude a file (matched against `/`-separated relative paths).
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// File extensions (with leading dot) that are processed.
    #[serde(default = "default_include_extensions")]
    pub include_extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: default_exclude_patterns(),
            include_extensions: default_include_extensions(),
        }
    }
}

fn default_exclude_patterns() -> Vec<String> {
    ["node_modules/", ".git/", "_build/", "dist/", "vendor/", "_indexed/"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_include_extensions() -> Vec<String> {
    [".md", ".mdx", ".rst", ".txt"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// `[chunking]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Estimated token count above which an H2 section is re-split at H3.
    #[serde(default = "default_max_section_tokens")]
    pub max_section_tokens: usize,

    /// Fenced blocks with more content lines than this become their own chunk.
    #[serde(default = "default_large_code_block_lines")]
    pub large_code_block_lines: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_section_tokens: default_max_section_tokens(),
            large_code_block_lines: default_large_code_block_lines(),
        }
    }
}

fn default_max_section_tokens() -> usize {
    1500
}
fn default_large_code_block_lines() -> usize {
    50
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Maximum number of documents processed concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    4
}

impl AppConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.workers == 0 {
            return Err(DocweaveError::config("pipeline.workers must be at least 1"));
        }
        if self.chunking.max_section_tokens == 0 {
            return Err(DocweaveError::config(
                "chunking.max_section_tokens must be at least 1",
            ));
        }
        if self.discovery.include_extensions.is_empty() {
            return Err(DocweaveError::config(
                "discovery.include_extensions must not be empty",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docweave/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocweaveError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docweave/docweave.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocweaveError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        DocweaveError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_in(&config_dir()?)
}

/// Write a default config file into `dir`, creating it if needed.
pub fn init_config_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| DocweaveError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocweaveError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocweaveError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("node_modules/"));
        assert!(toml_str.contains("max_section_tokens = 1500"));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let toml_str = r#"
[chunking]
max_section_tokens = 800

[pipeline]
workers = 2
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.chunking.max_section_tokens, 800);
        assert_eq!(config.chunking.large_code_block_lines, 50);
        assert_eq!(config.pipeline.workers, 2);
        assert_eq!(config.defaults.output_dir, "docs/_indexed");
        assert_eq!(config.discovery.include_extensions.len(), 4);
    }

    #[test]
    fn zero_workers_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn init_then_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = init_config_in(dir.path()).expect("init");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.defaults.source_dir, "docs");
        assert_eq!(loaded.pipeline.workers, 4);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("docweave.toml");
        std::fs::write(&path, "[pipeline\nworkers = ").expect("write");
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("docweave.toml"));
    }
}
