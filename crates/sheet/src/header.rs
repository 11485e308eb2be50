//! Header resolution and row building over a grid of referenced cells.

use crate::a1_notation::column_key;
use crate::row::Row;
use std::collections::HashMap;

/// A populated cell: its A1 reference and displayed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCell {
    pub reference: String,
    pub text: String,
}

impl SheetCell {
    pub fn new(reference: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            text: text.into(),
        }
    }
}

/// Column key (e.g. "B") to the header text of that column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnNames {
    names: HashMap<String, String>,
}

impl ColumnNames {
    /// Header name for a column key
    pub fn name(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Build the column-name mapping from the header row.
///
/// A header cell whose reference has no leading letters cannot be aligned
/// with data cells; it is reported and left out of the mapping.
pub fn resolve_header(cells: &[SheetCell]) -> ColumnNames {
    let mut names = HashMap::with_capacity(cells.len());
    for cell in cells {
        let key = column_key(&cell.reference);
        if key.is_empty() {
            tracing::warn!(
                "Ignoring header cell '{}' with unparsable reference '{}'",
                cell.text,
                cell.reference
            );
            continue;
        }
        names.insert(key.to_string(), cell.text.clone());
    }
    ColumnNames { names }
}

/// Build a row by naming each cell after the header of its column.
///
/// Cells in columns without a header are dropped.
pub fn build_row(cells: &[SheetCell], names: &ColumnNames) -> Row {
    cells
        .iter()
        .filter_map(|cell| match names.name(column_key(&cell.reference)) {
            Some(name) => Some((name.to_string(), cell.text.clone())),
            None => {
                tracing::debug!(
                    "Dropping cell {} outside of the header columns",
                    cell.reference
                );
                None
            }
        })
        .collect()
}

/// Convert a grid whose first row is the header into data rows.
pub fn rows_from_grid(grid: &[Vec<SheetCell>]) -> Vec<Row> {
    let Some((header, data)) = grid.split_first() else {
        return Vec::new();
    };
    let names = resolve_header(header);
    data.iter().map(|cells| build_row(cells, &names)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<SheetCell> {
        vec![
            SheetCell::new("A1", "Id"),
            SheetCell::new("B1", "Name"),
            SheetCell::new("C1", "Email"),
        ]
    }

    #[test]
    fn test_resolve_header() {
        let names = resolve_header(&header());
        assert_eq!(names.len(), 3);
        assert_eq!(names.name("A"), Some("Id"));
        assert_eq!(names.name("C"), Some("Email"));
        assert_eq!(names.name("D"), None);
    }

    #[test]
    fn test_build_row_is_sparse() {
        let names = resolve_header(&header());
        let row = build_row(
            &[SheetCell::new("A2", "42"), SheetCell::new("B2", "Ann")],
            &names,
        );

        let expected: Row = [("Id", "42"), ("Name", "Ann")].into_iter().collect();
        assert_eq!(row, expected);
        assert_eq!(row.column("Email"), None);
    }

    #[test]
    fn test_unparsable_header_reference_is_dropped() {
        let names = resolve_header(&[SheetCell::new("A1", "Id"), SheetCell::new("17", "Bad")]);
        assert_eq!(names.len(), 1);
        assert_eq!(names.name(""), None);
    }

    #[test]
    fn test_cells_outside_header_are_dropped() {
        let names = resolve_header(&header());
        let row = build_row(
            &[SheetCell::new("A2", "1"), SheetCell::new("F2", "stray")],
            &names,
        );
        assert_eq!(row.len(), 1);
        assert_eq!(row.column("Id"), Some("1"));
    }

    #[test]
    fn test_rows_from_grid() {
        let grid = vec![
            header(),
            vec![SheetCell::new("A2", "1"), SheetCell::new("C2", "a@example.com")],
            vec![],
            vec![SheetCell::new("B4", "Bob")],
        ];

        let rows = rows_from_grid(&grid);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].column("Email"), Some("a@example.com"));
        assert!(rows[1].is_blank());
        assert_eq!(rows[2].column("Name"), Some("Bob"));
    }

    #[test]
    fn test_rows_from_empty_grid() {
        assert!(rows_from_grid(&[]).is_empty());
        assert!(rows_from_grid(&[header()]).is_empty());
    }
}
