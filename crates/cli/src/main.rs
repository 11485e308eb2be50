//! # docmerge-cli
//!
//! Generates one docx file per row of an xlsx data file from a docx template.

mod logging;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use docmerge_core::{
    default_output_dir, DocxStamper, Generator, GeneratorConfig, RowErrorPolicy, StamperOptions,
    UnresolvedPolicy,
};
use std::path::PathBuf;

/// docmerge - generate docx files from an xlsx data file and a docx template
#[derive(Parser, Debug)]
#[command(name = "docmerge")]
#[command(author, version, about = "Generates docx files based on an xlsx for data and a template in docx", long_about = None)]
struct Cli {
    /// Template file (docx)
    #[arg(short = 't', long = "template-file", value_name = "PATH")]
    template_file: PathBuf,

    /// Data file (xlsx)
    #[arg(short = 'd', long = "data-file", value_name = "PATH")]
    data_file: PathBuf,

    /// Entity column (name), used to name the output files
    #[arg(short = 'c', long = "entity-column", value_name = "NAME")]
    entity_column: String,

    /// Directory to write the output files to
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", default_value_os_t = default_output_dir())]
    output_dir: PathBuf,

    /// Name of the sheet to use (default: first sheet of the workbook)
    #[arg(short = 's', long = "sheet", value_name = "NAME")]
    sheet: Option<String>,

    /// Replace output files if they exist
    #[arg(short = 'r', long = "replace", overrides_with = "no_replace")]
    replace: bool,

    /// Skip rows whose output file exists (default)
    #[arg(long = "no-replace", overrides_with = "replace")]
    no_replace: bool,

    /// Only generate one document
    #[arg(short = '1', long = "first-row-only", overrides_with = "no_first_row_only")]
    first_row_only: bool,

    /// Process every row (default)
    #[arg(long = "no-first-row-only", overrides_with = "first_row_only")]
    no_first_row_only: bool,

    /// Log rows that fail to stamp and continue with the next row
    #[arg(long = "continue-on-error")]
    continue_on_error: bool,

    /// What to render for a placeholder naming a column the row lacks
    #[arg(long = "unresolved", value_enum, default_value_t = Unresolved::Keep)]
    unresolved: Unresolved,

    /// Print the run summary as JSON
    #[arg(long = "json")]
    json: bool,

    /// Verbose mode. Multiple -v options increase the verbosity
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Quiet mode. Multiple -q options decrease the verbosity
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    quiet: u8,
}

/// Placeholder policy for missing columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Unresolved {
    /// Leave the placeholder in the document (default)
    #[default]
    Keep,
    /// Render as empty text
    Blank,
    /// Fail the row
    Fail,
}

impl From<Unresolved> for UnresolvedPolicy {
    fn from(value: Unresolved) -> Self {
        match value {
            Unresolved::Blank => UnresolvedPolicy::Blank,
            Unresolved::Keep => UnresolvedPolicy::Keep,
            Unresolved::Fail => UnresolvedPolicy::Fail,
        }
    }
}

impl Cli {
    fn replace(&self) -> bool {
        self.replace && !self.no_replace
    }

    fn first_row_only(&self) -> bool {
        self.first_row_only && !self.no_first_row_only
    }

    fn generator_config(&self) -> GeneratorConfig {
        let row_errors = if self.continue_on_error {
            RowErrorPolicy::Skip
        } else {
            RowErrorPolicy::Abort
        };
        GeneratorConfig::new(&self.template_file, &self.data_file, &self.entity_column)
            .with_output_dir(&self.output_dir)
            .with_sheet(self.sheet.clone())
            .with_replace(self.replace())
            .with_first_row_only(self.first_row_only())
            .with_row_errors(row_errors)
    }

    fn stamper_options(&self) -> StamperOptions {
        StamperOptions::default().with_unresolved(self.unresolved.into())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    logging::init(logging::verbosity(cli.verbose, cli.quiet));

    let generator = Generator::new(cli.generator_config(), DocxStamper::new(cli.stamper_options()));
    let summary = generator.run().with_context(|| {
        format!(
            "Failed to generate documents from {}",
            cli.data_file.display()
        )
    })?;

    tracing::info!(
        "{} document(s) written to {}",
        summary.generated_count(),
        cli.output_dir.display()
    );
    if summary.failure_count() > 0 {
        tracing::warn!("{} row(s) failed: {}", summary.failure_count(), summary);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
