//! Docx template stamping for docmerge
//!
//! A [`Template`] is a docx archive holding `${...}` placeholders. Stamping
//! replaces every placeholder with the value of the column it names in a
//! [`Row`] and returns the bytes of the rendered document.
//!
//! ```no_run
//! use docmerge_sheet::Row;
//! use docmerge_stamper::{DocxStamper, Stamper, Template};
//!
//! let template = Template::load("letter.docx").unwrap();
//! let row: Row = [("Name", "Ann")].into_iter().collect();
//! let bytes = DocxStamper::default().stamp(&template, &row).unwrap();
//! std::fs::write("Ann.docx", bytes).unwrap();
//! ```

mod docx;
pub mod error;
mod placeholder;

use docmerge_sheet::Row;
use std::path::Path;

pub use error::{Result, StampError};
pub use placeholder::{column_name, find_placeholders, Placeholder, UnresolvedPolicy};

use placeholder::Resolver;

/// Renders one output document per row
pub trait Stamper {
    fn stamp(&self, template: &Template, row: &Row) -> Result<Vec<u8>>;
}

/// A validated docx template, read once and reused for every row
#[derive(Debug, Clone)]
pub struct Template {
    bytes: Vec<u8>,
}

impl Template {
    /// Read and validate a template file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Validate in-memory template bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        docx::validate(&bytes)?;
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Options for [`DocxStamper`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StamperOptions {
    pub unresolved: UnresolvedPolicy,
}

impl StamperOptions {
    #[must_use]
    pub fn with_unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }
}

/// Stamps docx templates
#[derive(Debug, Clone, Default)]
pub struct DocxStamper {
    options: StamperOptions,
}

impl DocxStamper {
    pub fn new(options: StamperOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &StamperOptions {
        &self.options
    }
}

impl Stamper for DocxStamper {
    fn stamp(&self, template: &Template, row: &Row) -> Result<Vec<u8>> {
        let resolver = Resolver {
            row,
            policy: self.options.unresolved,
        };
        docx::stamp_archive(template.bytes(), &resolver)
    }
}
