//! Error types for docmerge runs.

use docmerge_sheet::SheetError;
use docmerge_stamper::StampError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for generation runs.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Errors that abort a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The data source could not be loaded or the sheet was not found.
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// The template could not be read or is not a docx archive.
    #[error("Template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: StampError,
    },

    /// Stamping failed for one row.
    #[error("Failed to generate document for '{key}': {source}")]
    Stamp {
        key: String,
        #[source]
        source: StampError,
    },

    /// Directory creation, file removal or output write failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    /// Create an I/O error for a path.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
