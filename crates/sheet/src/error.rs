use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a workbook and reading its rows
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Failed to load workbook {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Sheet not found: {name} (available: {})", available.join(", "))]
    SheetNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Workbook has no sheets")]
    NoSheets,
}

pub type Result<T> = std::result::Result<T, SheetError>;
