//! Worksheet reading for docmerge
//!
//! Loads one worksheet of an xlsx workbook and turns every data row into a
//! [`Row`]: a sparse map from header name to the cell text as a spreadsheet
//! application would display it, under the cell's number format.
//!
//! # Examples
//!
//! ## Building rows from referenced cells
//!
//! ```
//! use docmerge_sheet::{rows_from_grid, SheetCell};
//!
//! let grid = vec![
//!     vec![
//!         SheetCell::new("A1", "Id"),
//!         SheetCell::new("B1", "Name"),
//!         SheetCell::new("C1", "Email"),
//!     ],
//!     vec![SheetCell::new("A2", "42"), SheetCell::new("B2", "Ann")],
//! ];
//!
//! let rows = rows_from_grid(&grid);
//! assert_eq!(rows[0].column("Name"), Some("Ann"));
//! assert_eq!(rows[0].column("Email"), None);
//! ```
//!
//! ## Reading a workbook
//!
//! ```no_run
//! use docmerge_sheet::read_rows;
//!
//! // First sheet of the workbook
//! let first = read_rows("data.xlsx", None).unwrap();
//! // Sheet matched case-insensitively
//! let summary = read_rows("data.xlsx", Some("summary")).unwrap();
//! ```

mod a1_notation;
mod display;
mod error;
mod header;
mod number_format;
mod row;
mod selector;
mod styles;
mod xlsx;

pub use a1_notation::{column_index_to_letters, column_key, parse_a1, to_a1_notation};
pub use display::{display_text, format_general};
pub use error::{Result, SheetError};
pub use header::{build_row, resolve_header, rows_from_grid, ColumnNames, SheetCell};
pub use number_format::{builtin_format, format_number, format_text, is_general, FormatOptions};
pub use row::Row;
pub use selector::select_sheet;
pub use styles::{CellFormats, StyleTable};
pub use xlsx::{read_rows, SheetRows, Workbook};
