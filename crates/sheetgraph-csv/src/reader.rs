//! CSV reader

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use sheetgraph_core::column::header_names;
use sheetgraph_core::{clean_text, CellValue, Sheet, StringPool, Workbook};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a sheet named after the file stem
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Sheet> {
        let path = path.as_ref();
        let name = sheet_name(path)?;
        let file = File::open(path)?;
        Self::read(file, &name, options)
    }

    /// Read a CSV file into a single-sheet workbook
    pub fn read_workbook<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let path = path.as_ref();
        let mut workbook = Workbook::new();
        workbook.add_sheet(Self::read_file(path, options)?)?;
        workbook.set_source(path);
        Ok(workbook)
    }

    /// Read every `*.csv` file of a directory into one workbook
    ///
    /// Files are visited in file-name order so the sheet order is stable.
    pub fn read_dir<P: AsRef<Path>>(dir: P, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_csv(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CsvError::EmptyDirectory(dir.to_path_buf()));
        }

        let mut workbook = Workbook::new();
        for path in &paths {
            log::debug!("Reading {}", path.display());
            workbook.add_sheet(Self::read_file(path, options)?)?;
        }
        workbook.set_source(dir);
        Ok(workbook)
    }

    /// Read CSV from a reader into a sheet
    pub fn read<R: Read>(reader: R, name: &str, options: &CsvReadOptions) -> CsvResult<Sheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(options.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut pool = StringPool::new();
        let mut sheet = Sheet::new(name);
        let mut header_width = 0;

        if options.has_header {
            let headers = csv_reader.headers()?.clone();
            header_width = headers.len();
            for column in header_names(headers.iter()) {
                sheet.add_column(column)?;
            }
        }

        for result in csv_reader.records() {
            let record = result?;

            if !options.has_header && record.len() > header_width {
                for col in header_width..record.len() {
                    sheet.add_column(format!("Unnamed: {}", col))?;
                }
                header_width = record.len();
            }

            let mut cells: Vec<CellValue> = record
                .iter()
                .map(|field| Self::convert_field(field, options, &mut pool))
                .collect();

            // Trailing delimiters produce empty fields past the header
            while cells.len() > header_width && cells.last().map_or(false, CellValue::is_empty) {
                cells.pop();
            }

            sheet.push_row(cells)?;
        }

        if options.normalize_column_names {
            sheet.normalize_column_names()?;
        }

        log::debug!(
            "Read sheet '{}': {} columns, {} rows",
            sheet.name(),
            sheet.column_count(),
            sheet.row_count()
        );
        Ok(sheet)
    }

    fn convert_field(field: &str, options: &CsvReadOptions, pool: &mut StringPool) -> CellValue {
        let text = if options.trim_strings {
            clean_text(field)
        } else {
            field
        };

        if text.trim().is_empty() {
            return CellValue::Empty;
        }

        if options.auto_detect_types {
            if let Some(value) = Self::detect_type(text) {
                return value;
            }
        }

        pool.string_value(text)
    }

    /// Detect a boolean or numeric field value, `None` for plain text
    fn detect_type(field: &str) -> Option<CellValue> {
        let field = field.trim();

        if field.eq_ignore_ascii_case("true") {
            return Some(CellValue::Boolean(true));
        }
        if field.eq_ignore_ascii_case("false") {
            return Some(CellValue::Boolean(false));
        }

        if let Ok(n) = field.parse::<i64>() {
            return Some(CellValue::Integer(n));
        }

        if let Ok(n) = field.parse::<f64>() {
            return Some(CellValue::from(n));
        }

        None
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}

fn sheet_name(path: &Path) -> CsvResult<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CsvError::SheetName(path.to_path_buf()))
}
