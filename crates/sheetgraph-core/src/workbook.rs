//! Workbook type - an ordered set of named sheets

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sheet::Sheet;

/// A workbook (set of named sheets loaded from one tabular source)
///
/// Sheet names are unique, compared case-insensitively. Sheet order is the
/// order the source presented them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    /// Sheets in the workbook
    sheets: Vec<Sheet>,
    /// Path the workbook was loaded from, if any
    source: Option<PathBuf>,
}

impl Workbook {
    /// Create an empty workbook with no sheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get a sheet by index
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Get a sheet by exact name
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    /// Get a mutable sheet by exact name
    pub fn sheet_by_name_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    /// Get a sheet by name, failing with [`Error::SheetNotFound`]
    pub fn require_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheet_by_name(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// Check if a sheet exists
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet_by_name(name).is_some()
    }

    /// Iterate over all sheets
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    /// Sheet names in order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    /// Add a sheet at the end of the workbook
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<usize> {
        self.validate_sheet_name(sheet.name())?;
        let index = self.sheets.len();
        self.sheets.push(sheet);
        Ok(index)
    }

    /// Remove a sheet by name
    pub fn remove_sheet(&mut self, name: &str) -> Result<Sheet> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))?;
        Ok(self.sheets.remove(index))
    }

    /// Path the workbook was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Record the path the workbook was loaded from
    pub fn set_source<P: Into<PathBuf>>(&mut self, path: P) {
        self.source = Some(path.into());
    }

    /// Replace spaces with underscores in every column name of every sheet
    pub fn normalize_column_names(&mut self) -> Result<()> {
        for sheet in &mut self.sheets {
            sheet.normalize_column_names()?;
        }
        Ok(())
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }

        let name_lower = name.to_lowercase();
        if self
            .sheets
            .iter()
            .any(|s| s.name().to_lowercase() == name_lower)
        {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_sheets() {
        let mut wb = Workbook::new();
        assert!(wb.is_empty());

        assert_eq!(wb.add_sheet(Sheet::new("Reaction")).unwrap(), 0);
        assert_eq!(wb.add_sheet(Sheet::new("Molecule")).unwrap(), 1);
        assert_eq!(wb.sheet_names(), vec!["Reaction", "Molecule"]);
        assert!(wb.has_sheet("Molecule"));
        assert!(!wb.has_sheet("molecule"));
    }

    #[test]
    fn test_duplicate_name() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("Data")).unwrap();

        let result = wb.add_sheet(Sheet::new("DATA"));
        assert!(matches!(result, Err(Error::DuplicateSheetName(_))));
    }

    #[test]
    fn test_empty_name() {
        let mut wb = Workbook::new();
        assert!(matches!(
            wb.add_sheet(Sheet::new("  ")),
            Err(Error::InvalidSheetName(_))
        ));
    }

    #[test]
    fn test_require_sheet() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("A")).unwrap();
        assert_eq!(wb.require_sheet("A").unwrap().name(), "A");
        assert!(matches!(wb.require_sheet("B"), Err(Error::SheetNotFound(_))));
    }

    #[test]
    fn test_remove_sheet() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("A")).unwrap();
        wb.add_sheet(Sheet::new("B")).unwrap();
        let removed = wb.remove_sheet("A").unwrap();
        assert_eq!(removed.name(), "A");
        assert_eq!(wb.sheet_names(), vec!["B"]);
        assert!(wb.remove_sheet("A").is_err());
    }

    #[test]
    fn test_source_and_normalize() {
        let mut wb = Workbook::new();
        wb.set_source("data/plate.xlsx");
        assert_eq!(wb.source(), Some(Path::new("data/plate.xlsx")));

        wb.add_sheet(Sheet::with_columns("A", ["well id"]).unwrap())
            .unwrap();
        wb.normalize_column_names().unwrap();
        assert_eq!(wb.sheet(0).unwrap().columns(), &["well_id".to_string()]);
    }
}
