//! Number formats of worksheet cells, read from the xlsx package.
//!
//! The displayed text of a cell depends on its number format, which calamine
//! does not expose. The format of a cell is found through three parts: the
//! `s` attribute of the cell in the worksheet part, the `cellXfs` entry it
//! indexes in `xl/styles.xml`, and the built-in or custom code of that
//! entry's `numFmtId`.

use crate::a1_notation::parse_a1;
use crate::error::{Result, SheetError};
use crate::number_format::{builtin_format, is_general, FormatOptions};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";

/// Custom number formats and the format id of every cell style
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTable {
    custom: HashMap<u32, String>,
    cell_xfs: Vec<u32>,
}

impl StyleTable {
    /// Parse `xl/styles.xml`
    pub fn parse(xml: &[u8]) -> quick_xml::Result<Self> {
        let mut reader = Reader::from_reader(xml);
        let mut table = Self::default();
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
                Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"numFmt" => {
                        let id = attribute(&e, b"numFmtId")?.and_then(|id| id.parse().ok());
                        if let (Some(id), Some(code)) = (id, attribute(&e, b"formatCode")?) {
                            table.custom.insert(id, code);
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        let id = attribute(&e, b"numFmtId")?
                            .and_then(|id| id.parse().ok())
                            .unwrap_or(0);
                        table.cell_xfs.push(id);
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        Ok(table)
    }

    /// Format code of a cell style, `None` for General
    pub fn code(&self, style: usize) -> Option<&str> {
        let id = self.cell_xfs.get(style).copied().unwrap_or(0);
        let code = self
            .custom
            .get(&id)
            .map(String::as_str)
            .or_else(|| builtin_format(id))?;
        (!is_general(code)).then_some(code)
    }
}

/// Number format codes of one worksheet's cells
#[derive(Debug, Clone, Default)]
pub struct CellFormats {
    styles: StyleTable,
    /// Style index of every cell whose format is not General
    cells: HashMap<(u32, u32), usize>,
    options: FormatOptions,
}

impl CellFormats {
    /// Read the cell formats of `sheet_name` from an xlsx file.
    ///
    /// A package without style or worksheet parts yields General for
    /// every cell.
    pub fn read(path: &Path, sheet_name: &str) -> Result<Self> {
        let mut package = Package::open(path)?;

        let Some(workbook) = package.part(WORKBOOK_PART)? else {
            return Ok(Self::default());
        };
        let workbook =
            parse_workbook(&workbook).map_err(|e| package.error(WORKBOOK_PART, &e))?;
        let options = FormatOptions {
            date1904: workbook.date1904,
        };

        let Some(styles) = package.part(STYLES_PART)? else {
            tracing::debug!("Workbook has no {}, using General formats", STYLES_PART);
            return Ok(Self {
                options,
                ..Self::default()
            });
        };
        let styles = StyleTable::parse(&styles).map_err(|e| package.error(STYLES_PART, &e))?;

        let relationships = match package.part(WORKBOOK_RELS_PART)? {
            Some(xml) => {
                parse_relationships(&xml).map_err(|e| package.error(WORKBOOK_RELS_PART, &e))?
            }
            None => HashMap::new(),
        };
        let part = workbook
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .and_then(|(_, id)| relationships.get(id))
            .map(|target| part_name(target));

        let Some(part) = part else {
            tracing::debug!("No worksheet part for sheet '{}'", sheet_name);
            return Ok(Self {
                styles,
                options,
                ..Self::default()
            });
        };
        let Some(xml) = package.part(&part)? else {
            tracing::debug!("Worksheet part {} is missing", part);
            return Ok(Self {
                styles,
                options,
                ..Self::default()
            });
        };
        let cells = parse_cell_styles(&xml, &styles).map_err(|e| package.error(&part, &e))?;
        tracing::debug!("Read number formats of {} cells from {}", cells.len(), part);

        Ok(Self {
            styles,
            cells,
            options,
        })
    }

    /// Format code of the cell at an absolute 0-based position, `None`
    /// for General
    pub fn code_at(&self, row: u32, col: u32) -> Option<&str> {
        let style = *self.cells.get(&(row, col))?;
        self.styles.code(style)
    }

    pub fn options(&self) -> FormatOptions {
        self.options
    }

    /// Number of cells with a non-General format
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

struct Package<'a> {
    path: &'a Path,
    archive: ZipArchive<BufReader<File>>,
}

impl<'a> Package<'a> {
    fn open(path: &'a Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SheetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| SheetError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self { path, archive })
    }

    /// Bytes of a package part, `None` when absent
    fn part(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(part_error(self.path, name, &e)),
        };
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| SheetError::Io {
                path: self.path.to_path_buf(),
                source,
            })?;
        Ok(Some(bytes))
    }

    fn error(&self, part: &str, err: &dyn Display) -> SheetError {
        part_error(self.path, part, err)
    }
}

fn part_error(path: &Path, part: &str, err: &dyn Display) -> SheetError {
    SheetError::Load {
        path: path.to_path_buf(),
        message: format!("{part}: {err}"),
    }
}

struct WorkbookInfo {
    /// Sheet name and relationship id, in workbook order
    sheets: Vec<(String, String)>,
    date1904: bool,
}

fn parse_workbook(xml: &[u8]) -> quick_xml::Result<WorkbookInfo> {
    let mut reader = Reader::from_reader(xml);
    let mut info = WorkbookInfo {
        sheets: Vec::new(),
        date1904: false,
    };

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sheet" => {
                    // `r:id`; `sheetId` has a different local name
                    if let (Some(name), Some(id)) =
                        (attribute(&e, b"name")?, attribute(&e, b"id")?)
                    {
                        info.sheets.push((name, id));
                    }
                }
                b"workbookPr" => {
                    info.date1904 =
                        matches!(attribute(&e, b"date1904")?.as_deref(), Some("1" | "true"));
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(info)
}

fn parse_relationships(xml: &[u8]) -> quick_xml::Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                {
                    targets.insert(id, target);
                }
            }
            _ => {}
        }
    }

    Ok(targets)
}

/// Package part name of a workbook relationship target
fn part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

/// Style index of every non-General cell, keyed by 0-based (row, col).
///
/// Cells and rows without an `r` attribute follow the previous one.
fn parse_cell_styles(
    xml: &[u8],
    styles: &StyleTable,
) -> quick_xml::Result<HashMap<(u32, u32), usize>> {
    let mut reader = Reader::from_reader(xml);
    let mut cells = HashMap::new();
    let mut row = 0;
    let mut next_row = 0;
    let mut next_col = 0;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = attribute(&e, b"r")?
                        .and_then(|r| r.parse::<u32>().ok())
                        .map_or(next_row, |r| r.saturating_sub(1));
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let (cell_row, col) = attribute(&e, b"r")?
                        .as_deref()
                        .and_then(parse_a1)
                        .unwrap_or((row, next_col));
                    next_col = col + 1;
                    let style = attribute(&e, b"s")?
                        .and_then(|s| s.parse::<usize>().ok())
                        .unwrap_or(0);
                    if styles.code(style).is_some() {
                        cells.insert((cell_row, col), style);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(cells)
}

/// Unescaped value of the attribute with the given local name
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> quick_xml::Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
