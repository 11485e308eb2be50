use crate::error::{Result, SheetError};

/// Pick the worksheet to process from the workbook's ordered sheet names.
///
/// Without a requested name (or with a blank one) the first sheet wins.
/// Otherwise the first sheet whose name matches case-insensitively is used.
pub fn select_sheet<'a>(names: &'a [String], requested: Option<&str>) -> Result<&'a str> {
    let first = names.first().ok_or(SheetError::NoSheets)?;

    let requested = match requested.map(str::trim) {
        None | Some("") => return Ok(first),
        Some(name) => name,
    };

    names
        .iter()
        .find(|name| name.to_lowercase() == requested.to_lowercase())
        .map(String::as_str)
        .ok_or_else(|| SheetError::SheetNotFound {
            name: requested.to_string(),
            available: names.to_vec(),
        })
}
