//! Error types for release packaging.
//!
//! Input problems are detected before the filesystem is touched. Every
//! variant names the offending value or path.

use std::path::PathBuf;
use thiserror::Error;

/// Errors arising while packaging a release.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The release name is empty or whitespace.
    #[error("release name cannot be empty")]
    EmptyReleaseName,

    /// The release name is not a single path component.
    #[error("release name '{name}' must be a single path component")]
    InvalidReleaseName {
        /// The rejected name.
        name: String,
    },

    /// No payload files were provided.
    #[error("no files provided for packaging")]
    EmptyFileList,

    /// A target name would land outside the staging directory.
    #[error("target name '{name}' escapes the release directory")]
    InvalidTargetName {
        /// The rejected target name.
        name: String,
    },

    /// Two payload files map to the same path inside the release.
    #[error("target name '{name}' is used by more than one file")]
    DuplicateTarget {
        /// The clashing target name.
        name: String,
    },

    /// A payload file would overwrite the generated NFO.
    #[error("target name '{name}' is reserved for the release NFO")]
    ReservedTarget {
        /// The rejected target name.
        name: String,
    },

    /// The archive would exceed the per-ZIP file limit.
    #[error("{count} files exceed the limit of {max} per archive")]
    TooManyFiles {
        /// Files that would be archived, including the NFO.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The staging directory is already present.
    #[error("staging directory already exists: {}", path.display())]
    StagingExists {
        /// The existing directory.
        path: PathBuf,
    },

    /// The archive is already present.
    #[error("archive already exists: {}", path.display())]
    ArchiveExists {
        /// The existing archive.
        path: PathBuf,
    },

    /// A payload source file does not exist.
    #[error("source file not found: {}", path.display())]
    MissingSource {
        /// The missing source.
        path: PathBuf,
    },

    /// An I/O operation failed (copying sources, writing the NFO or archive).
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),

    /// The ZIP writer failed.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
