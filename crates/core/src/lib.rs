//! # docmerge-core
//!
//! Batch document merge: every data row of a worksheet is stamped into a
//! docx template and written as its own file, named after the row's entity
//! column.
//!
//! This crate provides:
//! - Run configuration
//! - The output path and existing-file policy
//! - The generation pipeline and its run summary
//! - Error types

/// Run configuration.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Output path derivation and skip/replace policy.
pub mod output;
/// Generation pipeline.
pub mod pipeline;
/// Run summary.
pub mod summary;

pub use config::{default_output_dir, GeneratorConfig, RowErrorPolicy};
pub use error::{GenerateError, GenerateResult};
pub use output::{OutputDecision, OutputPolicy};
pub use pipeline::Generator;
pub use summary::{RowFailure, RunSummary};

/// Re-export the row type produced by the sheet reader.
pub use docmerge_sheet::Row;
/// Re-export stamping types.
pub use docmerge_stamper::{DocxStamper, StampError, Stamper, StamperOptions, Template, UnresolvedPolicy};
