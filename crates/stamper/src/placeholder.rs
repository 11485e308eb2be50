//! `${...}` placeholder scanning and column resolution.

use crate::error::{Result, StampError};
use docmerge_sheet::Row;
use std::ops::Range;

const OPEN: &str = "${";
const CLOSE: char = '}';

/// A placeholder found in paragraph text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte span of the whole `${...}` token
    pub span: Range<usize>,
    /// Text between the braces
    pub expression: String,
}

/// What to render when a placeholder names a column the row does not have
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Leave the `${...}` token in the output
    #[default]
    Keep,
    /// Render as empty text
    Blank,
    /// Fail the row with [`StampError::Unresolved`]
    Fail,
}

/// Find every complete `${...}` token, left to right.
///
/// An opening `${` without a closing brace is plain text.
pub fn find_placeholders(text: &str) -> Vec<Placeholder> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find(OPEN) {
        let start = pos + rel;
        let body = start + OPEN.len();
        let Some(close) = text[body..].find(CLOSE) else {
            break;
        };
        let end = body + close + 1;
        found.push(Placeholder {
            span: start..end,
            expression: text[body..end - 1].to_string(),
        });
        pos = end;
    }

    found
}

/// Column named by a placeholder expression.
///
/// Accepted forms: `Name`, `column['Name']`, `columns['Name']`, with single
/// or double quotes.
pub fn column_name(expression: &str) -> Result<&str> {
    let trimmed = expression.trim();
    let malformed = || StampError::MalformedPlaceholder(expression.to_string());

    let indexed = ["columns[", "column["]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix));

    let name = match indexed {
        Some(rest) => {
            let inner = rest.strip_suffix(']').ok_or_else(malformed)?.trim();
            unquote(inner).ok_or_else(malformed)?
        }
        None => trimmed,
    };

    if name.is_empty() {
        return Err(malformed());
    }
    Ok(name)
}

fn unquote(text: &str) -> Option<&str> {
    ['\'', '"']
        .iter()
        .find_map(|q| text.strip_prefix(*q)?.strip_suffix(*q))
}

/// Resolves placeholders against one row
pub(crate) struct Resolver<'a> {
    pub row: &'a Row,
    pub policy: UnresolvedPolicy,
}

impl Resolver<'_> {
    pub fn resolve(&self, placeholder: &Placeholder) -> Result<String> {
        let name = column_name(&placeholder.expression)?;
        if let Some(value) = self.row.column(name) {
            return Ok(value.to_string());
        }

        match self.policy {
            UnresolvedPolicy::Blank => Ok(String::new()),
            UnresolvedPolicy::Keep => Ok(format!("{OPEN}{}{CLOSE}", placeholder.expression)),
            UnresolvedPolicy::Fail => Err(StampError::Unresolved {
                expression: placeholder.expression.clone(),
            }),
        }
    }
}
