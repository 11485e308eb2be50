//! Per-run outcome counters.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A row whose stamping failed while failures were isolated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub key: String,
    pub error: String,
}

/// Outcome of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Sheet the rows were read from
    pub sheet: String,
    /// Data rows read from the sheet
    pub rows: usize,
    /// Written output files, in row order
    pub generated: Vec<PathBuf>,
    pub skipped_blank_rows: usize,
    pub skipped_blank_keys: usize,
    /// Rows whose key is not a plain file name
    pub skipped_unsafe_keys: usize,
    pub skipped_existing: usize,
    pub failures: Vec<RowFailure>,
    /// Whether the run stopped early in first-row-only mode
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_blank_rows
            + self.skipped_blank_keys
            + self.skipped_unsafe_keys
            + self.skipped_existing
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sheet={} rows={} generated={} skipped={} (blank={} blank_key={} unsafe_key={} existing={}) failed={}",
            self.sheet,
            self.rows,
            self.generated_count(),
            self.skipped_count(),
            self.skipped_blank_rows,
            self.skipped_blank_keys,
            self.skipped_unsafe_keys,
            self.skipped_existing,
            self.failure_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_display() {
        let summary = RunSummary {
            sheet: "Data".to_string(),
            rows: 7,
            generated: vec![PathBuf::from("/out/1.docx")],
            skipped_blank_rows: 1,
            skipped_blank_keys: 2,
            skipped_unsafe_keys: 1,
            skipped_existing: 1,
            failures: vec![RowFailure {
                key: "9".to_string(),
                error: "boom".to_string(),
            }],
            stopped_early: false,
        };

        assert_eq!(summary.skipped_count(), 5);
        assert_eq!(
            summary.to_string(),
            "sheet=Data rows=7 generated=1 skipped=5 (blank=1 blank_key=2 unsafe_key=1 existing=1) failed=1"
        );
    }
}
