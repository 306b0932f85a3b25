//! Error types for docweave.
//!
//! Library crates use [`DocweaveError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docweave operations.
#[derive(Debug, thiserror::Error)]
pub enum DocweaveError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Frontmatter or markdown structure could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An output record could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An output path is not usable as a file target.
    #[error("output error: {message}")]
    Output { message: String },

    /// A per-document worker failed outside the document's own stage.
    #[error("worker error: {message}")]
    Worker { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocweaveError>;

impl DocweaveError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create an output error from any displayable message.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output {
            message: msg.into(),
        }
    }

    /// Create a worker error from any displayable message.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocweaveError::config("workers must be at least 1");
        assert_eq!(err.to_string(), "config error: workers must be at least 1");

        let err = DocweaveError::output("invalid output path: docs/..");
        assert_eq!(err.to_string(), "output error: invalid output path: docs/..");

        let err = DocweaveError::worker("worker pool closed");
        assert_eq!(err.to_string(), "worker error: worker pool closed");
    }

    #[test]
    fn serde_errors_convert() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DocweaveError = source.into();
        assert!(matches!(err, DocweaveError::Serialize(_)));
        assert!(err.to_string().starts_with("serialization error:"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = DocweaveError::io(
            "docs/missing.md",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("docs/missing.md"));
        assert!(err.to_string().contains("gone"));
    }
}
