//! Output path derivation and the existing-file policy.

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, GenerateResult};
use docmerge_sheet::Row;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// What to do with one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDecision {
    /// The row has no populated cell
    BlankRow,
    /// The entity column is absent, empty or whitespace
    BlankKey,
    /// The key is not a plain file name, e.g. `a/b`, `..` or `/etc/x`
    UnsafeKey(String),
    /// The output exists and replacing is off
    Exists(PathBuf),
    /// Stamp the row into `path`
    Generate { key: String, path: PathBuf },
}

/// Derives output paths from the entity column and applies the
/// skip/replace policy.
#[derive(Debug, Clone)]
pub struct OutputPolicy {
    output_dir: PathBuf,
    entity_column: String,
    extension: String,
    replace: bool,
}

impl OutputPolicy {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        entity_column: impl Into<String>,
        replace: bool,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            entity_column: entity_column.into(),
            extension: "docx".to_string(),
            replace,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(&config.output_dir, &config.entity_column, config.replace)
            .with_extension(&config.extension)
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// `<output_dir>/<key>.<extension>`
    pub fn output_path(&self, key: &str) -> PathBuf {
        self.output_dir.join(format!("{key}.{}", self.extension))
    }

    /// Decide the fate of a row.
    ///
    /// For rows with a usable key this creates the output directory and,
    /// when replacing, removes any previous output.
    pub fn decide(&self, row: &Row) -> GenerateResult<OutputDecision> {
        if row.is_blank() {
            tracing::debug!("Skipping row because it is empty");
            return Ok(OutputDecision::BlankRow);
        }

        let key = match row.column(&self.entity_column) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                tracing::warn!(
                    "Skipping row as column '{}' is empty: {}",
                    self.entity_column,
                    row
                );
                return Ok(OutputDecision::BlankKey);
            }
        };

        if !is_file_stem(key) {
            tracing::warn!(
                "Skipping row as column '{}' value '{}' is not a file name: {}",
                self.entity_column,
                key,
                row
            );
            return Ok(OutputDecision::UnsafeKey(key.to_string()));
        }

        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| GenerateError::io(&self.output_dir, e))?;

        let path = self.output_path(key);
        if self.replace {
            remove_existing(&path)?;
        } else if path.exists() {
            tracing::info!("File {} exists, skipping", path.display());
            return Ok(OutputDecision::Exists(path));
        }

        Ok(OutputDecision::Generate {
            key: key.to_string(),
            path,
        })
    }
}

/// Whether `key` names a file directly inside the output directory
fn is_file_stem(key: &str) -> bool {
    !matches!(key, "." | "..") && !key.contains(['/', '\\', '\0'])
}

/// Remove a file; a missing file is fine.
fn remove_existing(path: &Path) -> GenerateResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed existing output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GenerateError::io(path, e)),
    }
}
