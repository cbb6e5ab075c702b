//! `.xlsx` reading and writing
//!
//! Reading takes the first worksheet, treats its first row as headers, and
//! turns every following non-blank row into a header -> trimmed text map.
//! Writing builds a workbook from one or more [`Sheet`]s and returns the
//! bytes, ready to be sent as a download.

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::collections::HashMap;
use std::io::Cursor;

/// MIME type of `.xlsx` downloads
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    /// The upload is not a readable workbook
    #[error("Unreadable spreadsheet: {0}")]
    Read(String),

    #[error("Failed to write spreadsheet: {0}")]
    Write(#[from] XlsxError),
}

/// One data row of an uploaded sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based row number as shown in a spreadsheet program
    pub row_number: usize,

    cells: HashMap<String, String>,
}

impl SheetRow {
    pub fn new(row_number: usize, cells: HashMap<String, String>) -> Self {
        Self { row_number, cells }
    }

    /// Builds a row from header/value pairs
    pub fn from_pairs<'a>(row_number: usize, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let cells = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.trim().to_string()))
            .collect();
        Self { row_number, cells }
    }

    /// The trimmed cell under `header`, None when absent or blank
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .get(header)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Reads the data rows of the first worksheet in an `.xlsx` file
///
/// Header cells are trimmed and lowercased. Rows with no text at all are
/// skipped, but row numbers keep counting them.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<SheetRow>, SpreadsheetError> {
    let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes.to_vec()))
        .map_err(|e| SpreadsheetError::Read(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let first = sheet_names
        .first()
        .ok_or_else(|| SpreadsheetError::Read("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| SpreadsheetError::Read(e.to_string()))?;

    // Absolute position of the first used cell; 0-based
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| cell_text(c).to_lowercase()).collect(),
        None => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for (offset, row) in rows.enumerate() {
        let cells: HashMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell_text(cell)))
            .collect();

        if cells.values().all(String::is_empty) {
            continue;
        }

        // +1 for the header row, +1 to make it 1-based
        out.push(SheetRow::new(first_row + offset + 2, cells));
    }

    Ok(out)
}

/// A worksheet to be written
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,

    /// Column widths in characters, by column index
    pub column_widths: Vec<f64>,

    pub rows: Vec<Vec<Cell>>,
}

/// A value written into a cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            column_widths: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_widths(mut self, widths: &[f64]) -> Self {
        self.column_widths = widths.to_vec();
        self
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

/// Writes the sheets into a new workbook and returns its bytes
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>, SpreadsheetError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            let row_num = (row_idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row_num, col as u16, text)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row_num, col as u16, *n)?;
                    }
                    Cell::Empty => {}
                }
            }
        }

        for (col, width) in sheet.column_widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_keeps_text_and_numbers() {
        let mut sheet = Sheet::new("Data", &["Name", "Count", "Note"]);
        sheet.push_row(vec!["  padded  ".into(), Cell::from(3i64), Cell::Empty]);
        sheet.push_row(vec![Cell::Empty, Cell::Empty, Cell::Empty]);
        sheet.push_row(vec!["second".into(), Cell::from(2.5), "x".into()]);

        let bytes = write_workbook(&[sheet]).unwrap();
        let rows = read_rows(&bytes).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].get("name"), Some("padded"));
        assert_eq!(rows[0].get("count"), Some("3"));
        assert_eq!(rows[0].get("note"), None);

        // the blank row is skipped but still counted
        assert_eq!(rows[1].row_number, 4);
        assert_eq!(rows[1].get("count"), Some("2.5"));
    }

    #[test]
    fn test_garbage_is_a_read_error() {
        let result = read_rows(b"definitely not a zip archive");
        assert!(matches!(result, Err(SpreadsheetError::Read(_))));
    }

    #[test]
    fn test_header_only_sheet_has_no_rows() {
        let bytes = write_workbook(&[Sheet::new("Empty", &["email"])]).unwrap();
        assert!(read_rows(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_sheet_row_get_treats_blank_as_missing() {
        let row = SheetRow::from_pairs(2, [("email", "  "), ("role", " admin ")]);
        assert_eq!(row.get("email"), None);
        assert_eq!(row.get("role"), Some("admin"));
        assert_eq!(row.get("department"), None);
    }
}
