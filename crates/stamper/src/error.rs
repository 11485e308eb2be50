use thiserror::Error;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("Invalid template archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid template XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Template part missing: {0}")]
    MissingPart(String),

    #[error("Malformed placeholder: ${{{0}}}")]
    MalformedPlaceholder(String),

    #[error("Unresolved placeholder: ${{{expression}}}")]
    Unresolved { expression: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StampError>;
