//! The row-per-document generation pipeline.

use crate::config::{GeneratorConfig, RowErrorPolicy};
use crate::error::{GenerateError, GenerateResult};
use crate::output::{OutputDecision, OutputPolicy};
use crate::summary::{RowFailure, RunSummary};
use docmerge_sheet::Row;
use docmerge_stamper::{DocxStamper, Stamper, Template};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Generates one document per eligible row of a worksheet
#[derive(Debug, Clone)]
pub struct Generator<S = DocxStamper> {
    config: GeneratorConfig,
    stamper: S,
}

impl Generator<DocxStamper> {
    /// Generator using the default docx stamper
    pub fn with_docx(config: GeneratorConfig) -> Self {
        Self::new(config, DocxStamper::default())
    }
}

impl<S: Stamper> Generator<S> {
    pub fn new(config: GeneratorConfig, stamper: S) -> Self {
        Self { config, stamper }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn stamper(&self) -> &S {
        &self.stamper
    }

    /// Read the data rows, load the template and generate every document.
    pub fn run(&self) -> GenerateResult<RunSummary> {
        tracing::info!(
            "Generating documents. Data file = {}, Template = {}, Output directory = {}",
            self.config.data_file.display(),
            self.config.template_file.display(),
            self.config.output_dir.display()
        );

        let sheet =
            docmerge_sheet::read_rows(&self.config.data_file, self.config.sheet.as_deref())?;
        let template = Template::load(&self.config.template_file).map_err(|source| {
            GenerateError::Template {
                path: self.config.template_file.clone(),
                source,
            }
        })?;

        let mut summary = self.generate(&template, &sheet.rows)?;
        summary.sheet = sheet.sheet_name;
        tracing::info!("Finished: {}", summary);
        Ok(summary)
    }

    /// Generate documents for already-read rows, in order.
    pub fn generate(&self, template: &Template, rows: &[Row]) -> GenerateResult<RunSummary> {
        let policy = OutputPolicy::from_config(&self.config);
        let mut summary = RunSummary {
            rows: rows.len(),
            ..RunSummary::default()
        };

        for row in rows {
            match policy.decide(row)? {
                OutputDecision::BlankRow => summary.skipped_blank_rows += 1,
                OutputDecision::BlankKey => summary.skipped_blank_keys += 1,
                OutputDecision::UnsafeKey(_) => summary.skipped_unsafe_keys += 1,
                OutputDecision::Exists(_) => summary.skipped_existing += 1,
                OutputDecision::Generate { key, path } => {
                    let generated = self.generate_row(template, row, &key, &path, &mut summary)?;
                    if generated && self.config.first_row_only {
                        tracing::debug!("First-row-only mode, stopping");
                        summary.stopped_early = true;
                        break;
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Stamp and write one row; `Ok(false)` when an isolated failure
    /// was recorded instead.
    fn generate_row(
        &self,
        template: &Template,
        row: &Row,
        key: &str,
        path: &Path,
        summary: &mut RunSummary,
    ) -> GenerateResult<bool> {
        tracing::info!("Generating output file '{}'. {}", path.display(), row);

        let bytes = match self.stamper.stamp(template, row) {
            Ok(bytes) => bytes,
            Err(source) if self.config.row_errors == RowErrorPolicy::Skip => {
                tracing::error!("Failed to generate document for '{}': {}", key, source);
                summary.failures.push(RowFailure {
                    key: key.to_string(),
                    error: source.to_string(),
                });
                return Ok(false);
            }
            Err(source) => {
                return Err(GenerateError::Stamp {
                    key: key.to_string(),
                    source,
                })
            }
        };

        write_new(path, &bytes)?;
        summary.generated.push(path.to_path_buf());
        Ok(true)
    }
}

/// Write a file that must not exist yet
fn write_new(path: &Path, bytes: &[u8]) -> GenerateResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| GenerateError::io(path, e))?;
    file.write_all(bytes).map_err(|e| GenerateError::io(path, e))
}
