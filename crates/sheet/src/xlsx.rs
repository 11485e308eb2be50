use crate::a1_notation::to_a1_notation;
use crate::display::display_text;
use crate::error::{Result, SheetError};
use crate::header::{rows_from_grid, SheetCell};
use crate::row::Row;
use crate::selector::select_sheet;
use crate::styles::CellFormats;
use calamine::{open_workbook, Data, Range, Reader, Xlsx, XlsxError};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// An opened xlsx workbook
pub struct Workbook {
    path: PathBuf,
    inner: Xlsx<BufReader<File>>,
}

impl Workbook {
    /// Open an Excel workbook
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Load`] if the file cannot be opened or is not a
    /// valid workbook.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner: Xlsx<BufReader<File>> =
            open_workbook(&path).map_err(|e: XlsxError| load_error(&path, &e))?;
        Ok(Self { path, inner })
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names().to_vec()
    }

    /// Read the referenced, populated cells of a sheet, row by row, as
    /// displayed under their number formats.
    ///
    /// Empty rows inside the used range are kept as empty vectors.
    pub fn sheet_cells(&mut self, sheet_name: &str) -> Result<Vec<Vec<SheetCell>>> {
        let range = self
            .inner
            .worksheet_range(sheet_name)
            .map_err(|e: XlsxError| load_error(&self.path, &e))?;
        let formats = CellFormats::read(&self.path, sheet_name)?;
        Ok(range_to_cells(&range, &formats))
    }

    /// Select a sheet and convert it to header-keyed rows.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::SheetNotFound`] when `sheet` names no sheet.
    pub fn read_rows(&mut self, sheet: Option<&str>) -> Result<SheetRows> {
        let names = self.sheet_names();
        let selected = select_sheet(&names, sheet)?.to_string();
        let grid = self.sheet_cells(&selected)?;
        if grid.is_empty() {
            tracing::warn!("Sheet '{}' has no header row", selected);
        }
        let rows = rows_from_grid(&grid);
        tracing::debug!("Read {} data rows from sheet '{}'", rows.len(), selected);
        Ok(SheetRows {
            sheet_name: selected,
            rows,
        })
    }
}

/// Data rows read from one worksheet
#[derive(Debug, Clone, Default)]
pub struct SheetRows {
    pub sheet_name: String,
    pub rows: Vec<Row>,
}

/// Load a workbook, select a sheet and read its rows in one step
pub fn read_rows<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<SheetRows> {
    Workbook::open(path)?.read_rows(sheet)
}

fn load_error(path: &Path, err: &XlsxError) -> SheetError {
    SheetError::Load {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Convert a calamine range to cells carrying absolute A1 references
fn range_to_cells(range: &Range<Data>, formats: &CellFormats) -> Vec<Vec<SheetCell>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    range
        .rows()
        .enumerate()
        .map(|(row_idx, row)| {
            row.iter()
                .enumerate()
                .filter_map(|(col_idx, data)| {
                    let row = start_row + row_idx as u32;
                    let col = start_col + col_idx as u32;
                    let text = display_text(data, formats.code_at(row, col), formats.options())?;
                    let reference = to_a1_notation(row as usize, col as usize);
                    Some(SheetCell { reference, text })
                })
                .collect()
        })
        .collect()
}
