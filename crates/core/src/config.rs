use std::path::PathBuf;

/// What to do when stamping a single row fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowErrorPolicy {
    /// Abort the whole run on the first failure
    #[default]
    Abort,
    /// Log the failure, record it in the summary and continue
    Skip,
}

/// Settings of one generation run
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub template_file: PathBuf,
    pub data_file: PathBuf,
    /// Column whose value names each output file
    pub entity_column: String,
    pub output_dir: PathBuf,
    /// Worksheet name, matched case-insensitively; first sheet if unset
    pub sheet: Option<String>,
    /// Replace existing output files instead of skipping their rows
    pub replace: bool,
    /// Stop after the first generated document
    pub first_row_only: bool,
    pub row_errors: RowErrorPolicy,
    /// Output file extension, without the dot
    pub extension: String,
}

impl GeneratorConfig {
    pub fn new(
        template_file: impl Into<PathBuf>,
        data_file: impl Into<PathBuf>,
        entity_column: impl Into<String>,
    ) -> Self {
        Self {
            template_file: template_file.into(),
            data_file: data_file.into(),
            entity_column: entity_column.into(),
            output_dir: default_output_dir(),
            sheet: None,
            replace: false,
            first_row_only: false,
            row_errors: RowErrorPolicy::default(),
            extension: "docx".to_string(),
        }
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    #[must_use]
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    #[must_use]
    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    #[must_use]
    pub fn with_first_row_only(mut self, first_row_only: bool) -> Self {
        self.first_row_only = first_row_only;
        self
    }

    #[must_use]
    pub fn with_row_errors(mut self, policy: RowErrorPolicy) -> Self {
        self.row_errors = policy;
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// `<system temp dir>/output`
pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("output")
}
