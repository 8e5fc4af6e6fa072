//! XLSX reader

mod address;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::options::XlsxReadOptions;
use address::{parse_cell_ref, row_index, MAX_COLUMNS, MAX_ROWS};
use sheetgraph_core::column::header_names;
use sheetgraph_core::{clean_text, CellValue, Sheet, StringPool, Workbook};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);

    result
}

/// Raw cell attributes collected while scanning a `<c>` element
#[derive(Debug, Default)]
struct RawCell {
    reference: Option<String>,
    cell_type: Option<String>,
    value: Option<String>,
}

/// Cells of one worksheet, indexed by zero-based row then column
type Grid = Vec<Vec<CellValue>>;

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P, options: &XlsxReadOptions) -> XlsxResult<Workbook> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut workbook = Self::read(file, options)?;
        workbook.set_source(path);
        Ok(workbook)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R, options: &XlsxReadOptions) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut pool = StringPool::new();
        let mut workbook = Workbook::new();

        for (name, r_id) in &sheet_info {
            let Some(path) = sheet_paths.get(r_id) else {
                log::warn!("Sheet '{}' has no worksheet part, skipping", name);
                continue;
            };

            let grid = Self::read_worksheet(&mut archive, path, &shared_strings, options, &mut pool)?;
            if grid.is_empty() && options.skip_empty_sheets {
                log::debug!("Skipping empty sheet '{}'", name);
                continue;
            }

            let mut sheet = Self::build_sheet(name, grid)?;
            if options.normalize_column_names {
                sheet.normalize_column_names()?;
            }
            log::debug!(
                "Read sheet '{}': {} columns, {} rows",
                sheet.name(),
                sheet.column_count(),
                sheet.row_count()
            );
            workbook.add_sheet(sheet)?;
        }

        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        // Runs keep their whitespace; only the finished cell value is cleaned
        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // Phonetic runs repeat the text in another script
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current_string.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names and rIds, in workbook order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let name = attribute(&e, b"name");
                    let r_id = attribute(&e, b"r:id");
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get worksheet part paths by rId
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attribute(&e, b"Id");
                    let target = attribute(&e, b"Target");
                    let rel_type = attribute(&e, b"Type");

                    // Only include worksheet relationships
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to xl/ folder
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read the cell values of a worksheet into a dense grid
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        shared_strings: &[String],
        options: &XlsxReadOptions,
        pool: &mut StringPool,
    ) -> XlsxResult<Grid> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut grid: Grid = Vec::new();

        // Position of the next cell when references are omitted
        let mut next_row = 0usize;
        let mut current_row = 0usize;
        let mut next_col = 0usize;

        let mut cell: Option<RawCell> = None;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        current_row = row_position(&e, next_row)?;
                        next_row = current_row + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        cell = Some(RawCell {
                            reference: attribute(&e, b"r"),
                            cell_type: attribute(&e, b"t"),
                            value: None,
                        });
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"is" if cell.is_some() => in_inline_str = true,
                    b"t" if in_inline_str => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        current_row = row_position(&e, next_row)?;
                        next_row = current_row + 1;
                    }
                    b"c" => {
                        // A value-less cell only advances the column cursor
                        let col = attribute(&e, b"r")
                            .and_then(|r| parse_cell_ref(&r))
                            .map_or(next_col, |(_, col)| col);
                        next_col = col + 1;
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(raw) = cell.take() {
                            let (row, col) = match raw.reference.as_deref() {
                                Some(r) => parse_cell_ref(r).ok_or_else(|| {
                                    XlsxError::Parse(format!("Invalid cell reference '{}'", r))
                                })?,
                                None if next_col >= MAX_COLUMNS => {
                                    return Err(XlsxError::Parse(format!(
                                        "Row {} has more than {} cells",
                                        current_row + 1,
                                        MAX_COLUMNS
                                    )))
                                }
                                None => (current_row, next_col),
                            };
                            next_col = col + 1;

                            let value = Self::convert_cell(&raw, shared_strings, options, pool)?;
                            if !value.is_empty() {
                                set_cell(&mut grid, row, col, value);
                            }
                        }
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let (Some(raw), Ok(text)) = (cell.as_mut(), e.unescape()) {
                        if in_inline_text {
                            // Rich inline strings arrive as several runs
                            raw.value.get_or_insert_with(String::new).push_str(&text);
                            raw.cell_type = Some("inlineStr".to_string());
                        } else {
                            raw.value = Some(text.to_string());
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(grid)
    }

    /// Convert a raw cell to a value
    ///
    /// Formula cells carry their cached result in `<v>`, so they go through
    /// the same path as literal cells.
    fn convert_cell(
        raw: &RawCell,
        shared_strings: &[String],
        options: &XlsxReadOptions,
        pool: &mut StringPool,
    ) -> XlsxResult<CellValue> {
        let Some(value) = raw.value.as_deref() else {
            return Ok(CellValue::Empty);
        };

        let text = match raw.cell_type.as_deref() {
            // Shared string
            Some("s") => {
                let idx: usize = value.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", value))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                s.clone()
            }

            // Boolean
            Some("b") => {
                let flag = value.trim();
                return Ok(CellValue::Boolean(
                    flag == "1" || flag.eq_ignore_ascii_case("true"),
                ));
            }

            // Inline or formula string - decode Excel escape sequences
            Some("inlineStr") | Some("str") => decode_excel_escapes(value),

            // Number (default type or explicit "n")
            None | Some("n") => {
                let trimmed = value.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Ok(CellValue::Integer(n));
                }
                if let Ok(n) = trimmed.parse::<f64>() {
                    return Ok(CellValue::from(n));
                }
                value.to_string()
            }

            // Errors (#N/A, #DIV/0!), ISO dates and unknown types keep their text
            Some(_) => value.to_string(),
        };

        let text = if options.trim_strings {
            clean_text(&text)
        } else {
            text.as_str()
        };

        if text.trim().is_empty() {
            Ok(CellValue::Empty)
        } else {
            Ok(pool.string_value(text))
        }
    }

    /// Turn a grid into a sheet: the first non-empty row is the header
    fn build_sheet(name: &str, mut grid: Grid) -> XlsxResult<Sheet> {
        let mut sheet = Sheet::new(name);

        let Some(header_row) = grid.iter().position(|row| !row.is_empty()) else {
            return Ok(sheet);
        };
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);

        let mut rows = grid.split_off(header_row);
        let header = rows.remove(0);
        let raw_headers: Vec<String> = (0..width)
            .map(|col| header.get(col).map(CellValue::to_string).unwrap_or_default())
            .collect();
        for column in header_names(raw_headers) {
            sheet.add_column(column)?;
        }

        for cells in rows {
            sheet.push_row(cells)?;
        }

        Ok(sheet)
    }
}

/// Get an unescaped attribute value
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|s| s.to_string()))
}

/// Zero-based index of a `<row>`, from its `r` attribute or the running
/// position when `r` is absent
fn row_position(e: &BytesStart, next_row: usize) -> XlsxResult<usize> {
    match attribute(e, b"r") {
        Some(r) => row_index(&r)
            .ok_or_else(|| XlsxError::Parse(format!("Invalid row number '{}'", r))),
        None if next_row >= MAX_ROWS => Err(XlsxError::Parse(format!(
            "Worksheet has more than {} rows",
            MAX_ROWS
        ))),
        None => Ok(next_row),
    }
}

/// Store a value, growing the grid as needed; rows only grow up to their
/// last non-empty cell
fn set_cell(grid: &mut Grid, row: usize, col: usize, value: CellValue) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let cells = &mut grid[row];
    if cells.len() <= col {
        cells.resize(col + 1, CellValue::Empty);
    }
    cells[col] = value;
}
