//! Tabular sources: where sheets come from

use std::path::Path;

use sheetgraph_csv::{CsvReadOptions, CsvReader};
use sheetgraph_xlsx::{XlsxReadOptions, XlsxReader};

use crate::error::{Error, Result};
use crate::Workbook;

/// Anything that can turn a path into an ordered set of sheets
///
/// Implementations preserve column and row order and classify every non-empty
/// cell as integer, float, string or boolean.
pub trait TabularSource {
    fn load_sheets(&self, path: &Path) -> Result<Workbook>;
}

/// Options shared by the file-based sources
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Trim string cells and strip trailing commas
    pub trim_strings: bool,
    /// Replace spaces in column names with underscores
    pub normalize_column_names: bool,
    /// CSV field delimiter
    pub delimiter: u8,
    /// CSV quote character
    pub quote: u8,
    /// Drop worksheets without any cell
    pub skip_empty_sheets: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            trim_strings: true,
            normalize_column_names: true,
            delimiter: b',',
            quote: b'"',
            skip_empty_sheets: false,
        }
    }
}

impl LoadOptions {
    pub fn csv_options(&self) -> CsvReadOptions {
        CsvReadOptions {
            delimiter: self.delimiter,
            quote: self.quote,
            trim_strings: self.trim_strings,
            normalize_column_names: self.normalize_column_names,
            ..CsvReadOptions::default()
        }
    }

    pub fn xlsx_options(&self) -> XlsxReadOptions {
        XlsxReadOptions {
            trim_strings: self.trim_strings,
            normalize_column_names: self.normalize_column_names,
            skip_empty_sheets: self.skip_empty_sheets,
        }
    }
}

/// Loads `.xlsx`/`.xlsm` workbooks, single `.csv` files and directories of
/// CSV files
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    pub options: LoadOptions,
}

impl FileSource {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }
}

impl TabularSource for FileSource {
    fn load_sheets(&self, path: &Path) -> Result<Workbook> {
        if path.is_dir() {
            log::info!("Loading CSV directory {}", path.display());
            return Ok(CsvReader::read_dir(path, &self.options.csv_options())?);
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let workbook = match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => {
                XlsxReader::read_file(path, &self.options.xlsx_options())?
            }
            Some("csv") => CsvReader::read_workbook(path, &self.options.csv_options())?,
            _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
        };
        log::info!(
            "Loaded {} sheets from {}",
            workbook.sheet_count(),
            path.display()
        );
        Ok(workbook)
    }
}

/// Load a path with [`FileSource`] and default options
pub fn load_sheets<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    FileSource::default().load_sheets(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_load_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Molecule.csv");
        fs::write(&path, "molecule name,mass\nglc,180.16\neth,\n").unwrap();

        let workbook = load_sheets(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Molecule"]);
        let sheet = workbook.sheet_by_name("Molecule").unwrap();
        assert_eq!(sheet.columns(), &["molecule_name".to_string(), "mass".to_string()]);
        assert_eq!(sheet.value(1, "mass"), Some(&CellValue::Empty));
        assert_eq!(workbook.source(), Some(path.as_path()));
    }

    #[test]
    fn test_raw_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Reaction.CSV");
        fs::write(&path, "well id;volume\nA1;3\n").unwrap();

        let source = FileSource::new(LoadOptions {
            normalize_column_names: false,
            delimiter: b';',
            ..LoadOptions::default()
        });
        let workbook = source.load_sheets(&path).unwrap();
        let sheet = workbook.sheet(0).unwrap();
        assert!(sheet.has_column("well id"));
        assert_eq!(sheet.value(0, "volume"), Some(&CellValue::Integer(3)));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x\n1\n").unwrap();
        fs::write(dir.path().join("a.csv"), "y\n2\n").unwrap();

        let workbook = load_sheets(dir.path()).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_unsupported_format() {
        match load_sheets("notes.txt") {
            Err(Error::UnsupportedFormat(path)) => assert_eq!(path, Path::new("notes.txt")),
            other => panic!("expected unsupported format, got {:?}", other),
        }
    }
}
