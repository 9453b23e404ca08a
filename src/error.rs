//! Error handling module for adconfig
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Line and file level problems are recovered by the caller (skip + diagnostic),
//! directory level problems fail the whole run.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for adconfig
#[derive(Error, Debug)]
pub enum ConfigError {
    /// External override file does not exist or cannot be read
    #[error("Override source not found: {}: {source}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A discovered template could not be opened or read
    #[error("Template unreadable: {}: {source}", path.display())]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template could not be moved into the archive directory
    #[error("Failed to archive {} into {}: {reason}", path.display(), archive.display())]
    ArchiveMoveFailed {
        path: PathBuf,
        archive: PathBuf,
        reason: String,
    },

    /// A line in an override source was skipped
    #[error("Malformed override line {line}: {reason}")]
    MalformedOverrideLine { line: usize, reason: String },

    /// The working directory is missing or not a directory
    #[error("Working directory not found: {}", path.display())]
    WorkingDirMissing { path: PathBuf },

    /// The same macro name was declared twice in a registry
    #[error("Macro '{name}' is declared more than once in the registry")]
    DuplicateMacro { name: String },

    /// Registry file could not be used
    #[error("Invalid registry: {0}")]
    InvalidRegistry(String),

    /// Template name has nothing left after the marker prefix is removed
    #[error("Template name '{name}' has no output name after removing the marker prefix")]
    InvalidTemplateName { name: String },

    /// Other IO errors (writing outputs, listing directories, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for adconfig operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create a source-not-found error
    pub fn source_not_found(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::SourceNotFound {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a template-unreadable error
    pub fn template_unreadable(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::TemplateUnreadable {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an archive-move error
    pub fn archive_move_failed(
        path: impl AsRef<Path>,
        archive: impl AsRef<Path>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ArchiveMoveFailed {
            path: path.as_ref().to_path_buf(),
            archive: archive.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create a malformed-line diagnostic
    pub fn malformed_line(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedOverrideLine {
            line,
            reason: reason.into(),
        }
    }

    /// Create an invalid registry error
    pub fn invalid_registry(msg: impl Into<String>) -> Self {
        Self::InvalidRegistry(msg.into())
    }

    /// Process exit code for this error category.
    ///
    /// `0` is reserved for success and `1` for anything uncategorised.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::SourceNotFound { .. } => 2,
            Self::TemplateUnreadable { .. } => 3,
            Self::ArchiveMoveFailed { .. } => 4,
            Self::MalformedOverrideLine { .. } => 5,
            Self::WorkingDirMissing { .. } => 6,
            Self::DuplicateMacro { .. } | Self::InvalidRegistry(_) => 7,
            Self::InvalidTemplateName { .. } => 8,
        }
    }
}
