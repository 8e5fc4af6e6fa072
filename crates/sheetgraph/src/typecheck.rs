//! Per-column type inference and inconsistency detection
//!
//! Empty cells never take part in a decision: they neither cause nor mask an
//! inconsistency. Integers and floats are mutually compatible; a column is
//! inconsistent when it mixes numbers with anything else, or when it holds
//! two different non-numeric kinds.
//!
//! # Example
//!
//! ```rust
//! use sheetgraph::typecheck::check_types;
//! use sheetgraph::{CellValue, Sheet};
//!
//! let mut sheet = Sheet::with_columns("Plate", ["volume"]).unwrap();
//! for value in [CellValue::from(1), 2.into(), "x".into(), 4.into()] {
//!     sheet.push_row(vec![value]).unwrap();
//! }
//!
//! let found = check_types(&sheet, "plate.xlsx");
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].rows, vec![4]);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::schema::DataType;
use crate::{CellKind, Result, Sheet, Workbook};

/// A column whose non-empty cells have incompatible runtime types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInconsistency {
    pub sheet_name: String,
    pub column: String,
    /// Raw type names of every non-empty cell, sorted
    pub observed_types: Vec<String>,
    /// Spreadsheet row numbers of the offending cells
    pub rows: Vec<usize>,
    pub source_path: String,
}

impl fmt::Display for TypeInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = self.rows.iter().map(ToString::to_string).collect();
        write!(
            f,
            "Column '{}' in sheet '{}' ({}) mixes types [{}] in rows {}",
            self.column,
            self.sheet_name,
            self.source_path,
            self.observed_types.join(", "),
            rows.join(", ")
        )
    }
}

/// Every inconsistency found in a source, reported at once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeInconsistencyReport {
    pub inconsistencies: Vec<TypeInconsistency>,
}

impl TypeInconsistencyReport {
    pub fn new(inconsistencies: Vec<TypeInconsistency>) -> Self {
        Self { inconsistencies }
    }

    pub fn is_empty(&self) -> bool {
        self.inconsistencies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inconsistencies.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeInconsistency> {
        self.inconsistencies.iter()
    }
}

impl fmt::Display for TypeInconsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, inconsistency) in self.inconsistencies.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}", inconsistency)?;
        }
        Ok(())
    }
}

/// Type checker for a single sheet
///
/// Findings accumulate in the checker; [`all_inconsistencies`] starts over
/// from scratch so repeated calls give identical results.
///
/// [`all_inconsistencies`]: TypeChecker::all_inconsistencies
#[derive(Debug)]
pub struct TypeChecker<'a> {
    sheet: &'a Sheet,
    source_path: String,
    inconsistencies: Vec<TypeInconsistency>,
}

impl<'a> TypeChecker<'a> {
    /// Create a checker for a sheet loaded from `source_path`
    pub fn new<S: Into<String>>(sheet: &'a Sheet, source_path: S) -> Self {
        Self {
            sheet,
            source_path: source_path.into(),
            inconsistencies: Vec::new(),
        }
    }

    /// Runtime kinds of every non-empty cell of a column
    pub fn detect_column_types(&self, column: &str) -> Result<BTreeSet<CellKind>> {
        Ok(self.column_kinds(column)?.map(|(_, kind)| kind).collect())
    }

    /// Check one column, recording an inconsistency if there is one
    pub fn check_column_consistency(&mut self, column: &str) -> Result<bool> {
        match self.inspect_column(column)? {
            Some(inconsistency) => {
                self.inconsistencies.push(inconsistency);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Canonical type of a column
    ///
    /// Any numeric cell makes the column a number column. Otherwise the first
    /// non-empty cell decides; an all-empty column is a string column.
    pub fn column_type(&self, column: &str) -> Result<DataType> {
        let mut first = None;
        for (_, kind) in self.column_kinds(column)? {
            if kind.is_numeric() {
                return Ok(DataType::Number);
            }
            first.get_or_insert(kind);
        }
        Ok(first.map_or(DataType::String, DataType::from))
    }

    /// Re-check every column and return all findings
    pub fn all_inconsistencies(&mut self) -> Result<&[TypeInconsistency]> {
        self.inconsistencies.clear();
        let sheet = self.sheet;
        for column in sheet.columns() {
            self.check_column_consistency(column)?;
        }
        Ok(&self.inconsistencies)
    }

    /// Findings recorded so far
    pub fn inconsistencies(&self) -> &[TypeInconsistency] {
        &self.inconsistencies
    }

    pub fn into_inconsistencies(self) -> Vec<TypeInconsistency> {
        self.inconsistencies
    }

    fn column_kinds(&self, column: &str) -> Result<impl Iterator<Item = (usize, CellKind)> + 'a> {
        let values = self.sheet.column_values(column).ok_or_else(|| {
            sheetgraph_core::Error::ColumnNotFound {
                sheet: self.sheet.name().to_string(),
                column: column.to_string(),
            }
        })?;
        Ok(values.filter_map(|(row, value)| value.kind().map(|kind| (row, kind))))
    }

    fn inspect_column(&self, column: &str) -> Result<Option<TypeInconsistency>> {
        let cells: Vec<(usize, CellKind)> = self.column_kinds(column)?.collect();

        let observed: BTreeSet<CellKind> = cells.iter().map(|(_, kind)| *kind).collect();
        let has_numeric = observed.iter().any(CellKind::is_numeric);
        let first_non_numeric = cells.iter().map(|(_, k)| *k).find(|k| !k.is_numeric());
        let non_numeric_count = observed.iter().filter(|k| !k.is_numeric()).count();

        let offending: Vec<usize> = if has_numeric && non_numeric_count > 0 {
            // Numbers mixed with anything else: report the non-numeric cells
            cells
                .iter()
                .filter(|(_, kind)| !kind.is_numeric())
                .map(|(row, _)| *row)
                .collect()
        } else if non_numeric_count > 1 {
            // Several non-numeric kinds: report cells differing from the first
            cells
                .iter()
                .filter(|(_, kind)| Some(*kind) != first_non_numeric)
                .map(|(row, _)| *row)
                .collect()
        } else {
            return Ok(None);
        };

        Ok(Some(TypeInconsistency {
            sheet_name: self.sheet.name().to_string(),
            column: column.to_string(),
            observed_types: observed.iter().map(|k| k.name().to_string()).collect(),
            rows: offending
                .into_iter()
                .map(sheetgraph_core::column::spreadsheet_row)
                .collect(),
            source_path: self.source_path.clone(),
        }))
    }
}

/// Check every column of a sheet
pub fn check_types(sheet: &Sheet, source_path: &str) -> Vec<TypeInconsistency> {
    let mut checker = TypeChecker::new(sheet, source_path);
    for column in sheet.columns() {
        // Columns come from the sheet itself, so lookups cannot fail
        if let Err(e) = checker.check_column_consistency(column) {
            log::warn!("Skipping column '{}': {}", column, e);
        }
    }
    checker.into_inconsistencies()
}

/// Check every sheet of a workbook, in sheet order
///
/// With the `parallel` feature sheets are checked on the rayon pool; results
/// are merged in sheet order either way.
pub fn check_workbook(workbook: &Workbook) -> Vec<TypeInconsistency> {
    let source_path = workbook
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let sheets: Vec<&Sheet> = workbook.sheets().collect();

    #[cfg(feature = "parallel")]
    let partial: Vec<Vec<TypeInconsistency>> = {
        use rayon::prelude::*;
        sheets
            .par_iter()
            .map(|sheet| check_types(sheet, &source_path))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let partial: Vec<Vec<TypeInconsistency>> = sheets
        .iter()
        .map(|sheet| check_types(sheet, &source_path))
        .collect();

    let found: Vec<TypeInconsistency> = partial.into_iter().flatten().collect();
    if !found.is_empty() {
        log::warn!(
            "Found {} type inconsistencies in {} sheets",
            found.len(),
            workbook.sheet_count()
        );
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;
    use pretty_assertions::assert_eq;

    fn single_column(values: Vec<CellValue>) -> Sheet {
        let mut sheet = Sheet::with_columns("S", ["c"]).unwrap();
        for value in values {
            sheet.push_row(vec![value]).unwrap();
        }
        sheet
    }

    #[test]
    fn test_numbers_are_consistent() {
        let sheet = single_column(vec![1.into(), 2.5.into(), CellValue::Empty, 4.into()]);
        let mut checker = TypeChecker::new(&sheet, "p");
        assert!(checker.check_column_consistency("c").unwrap());
        assert_eq!(checker.column_type("c").unwrap(), DataType::Number);
        assert!(checker.inconsistencies().is_empty());
    }

    #[test]
    fn test_numeric_mixed_with_text() {
        let sheet = single_column(vec![1.into(), 2.into(), "x".into(), 4.into()]);
        let mut checker = TypeChecker::new(&sheet, "data.xlsx");
        assert!(!checker.check_column_consistency("c").unwrap());

        let found = &checker.inconsistencies()[0];
        assert_eq!(found.rows, vec![4]);
        assert_eq!(found.observed_types, vec!["integer", "string"]);
        assert_eq!(found.source_path, "data.xlsx");
        // Numbers win the column type even when inconsistent
        assert_eq!(checker.column_type("c").unwrap(), DataType::Number);
    }

    #[test]
    fn test_non_numeric_heterogeneity() {
        let sheet = single_column(vec![
            CellValue::Empty,
            "a".into(),
            true.into(),
            "b".into(),
            false.into(),
        ]);
        let found = check_types(&sheet, "p");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rows, vec![4, 6]);
        assert_eq!(found[0].observed_types, vec!["string", "boolean"]);
    }

    #[test]
    fn test_mixing_takes_precedence() {
        let sheet = single_column(vec![1.into(), "a".into(), true.into()]);
        let found = check_types(&sheet, "p");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rows, vec![3, 4]);
    }

    #[test]
    fn test_column_type_defaults() {
        let empty = single_column(vec![CellValue::Empty, CellValue::Empty]);
        let checker = TypeChecker::new(&empty, "p");
        assert_eq!(checker.column_type("c").unwrap(), DataType::String);
        assert!(checker.detect_column_types("c").unwrap().is_empty());

        let flags = single_column(vec![true.into(), CellValue::Empty]);
        let checker = TypeChecker::new(&flags, "p");
        assert_eq!(checker.column_type("c").unwrap(), DataType::Boolean);
    }

    #[test]
    fn test_missing_column() {
        let sheet = single_column(vec![]);
        let checker = TypeChecker::new(&sheet, "p");
        assert!(checker.detect_column_types("nope").is_err());
    }

    #[test]
    fn test_all_inconsistencies_is_idempotent() {
        let mut sheet = Sheet::with_columns("S", ["a", "b"]).unwrap();
        sheet.push_row(vec![1.into(), "x".into()]).unwrap();
        sheet.push_row(vec!["y".into(), 2.into()]).unwrap();

        let mut checker = TypeChecker::new(&sheet, "p");
        let first = checker.all_inconsistencies().unwrap().to_vec();
        let second = checker.all_inconsistencies().unwrap().to_vec();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_check_workbook_keeps_sheet_order() {
        let mut workbook = Workbook::new();
        workbook.set_source("book.xlsx");
        for name in ["B", "A"] {
            let mut sheet = Sheet::with_columns(name, ["c"]).unwrap();
            sheet.push_row(vec![1.into()]).unwrap();
            sheet.push_row(vec!["x".into()]).unwrap();
            workbook.add_sheet(sheet).unwrap();
        }

        let found = check_workbook(&workbook);
        let sheets: Vec<&str> = found.iter().map(|i| i.sheet_name.as_str()).collect();
        assert_eq!(sheets, vec!["B", "A"]);
        assert_eq!(found[0].source_path, "book.xlsx");
    }

    #[test]
    fn test_report_display() {
        let sheet = single_column(vec![1.into(), "x".into()]);
        let report = TypeInconsistencyReport::new(check_types(&sheet, "p.csv"));
        assert_eq!(
            report.to_string(),
            "  - Column 'c' in sheet 'S' (p.csv) mixes types [integer, string] in rows 3"
        );
    }
}
