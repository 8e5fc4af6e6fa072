//! Sheet type

use crate::cell::CellValue;
use crate::column::normalize_name;
use crate::error::{Error, Result};
use crate::row::RowRef;

/// A sheet (single table in a workbook)
///
/// Columns keep their first-seen order and rows keep their source order; both
/// orders are significant for diagnostics. Every stored row has exactly one
/// cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet name
    name: String,
    /// Column names, in header order
    columns: Vec<String>,
    /// Data rows (header excluded), each aligned to `columns`
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a new empty sheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Create a sheet with the given header
    pub fn with_columns<S, I, C>(name: S, columns: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let mut sheet = Self::new(name);
        for column in columns {
            sheet.add_column(column)?;
        }
        Ok(sheet)
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    // === Columns ===

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Check if the sheet has a column
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Add an (initially empty) column at the end of the header
    pub fn add_column<S: Into<String>>(&mut self, name: S) -> Result<usize> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(Error::DuplicateColumnName {
                sheet: self.name.clone(),
                column: name,
            });
        }

        self.columns.push(name);
        for row in &mut self.rows {
            row.push(CellValue::Empty);
        }
        Ok(self.columns.len() - 1)
    }

    /// Append a column together with one value per existing row
    pub fn push_column<S: Into<String>>(&mut self, name: S, values: Vec<CellValue>) -> Result<usize> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(Error::ColumnLengthMismatch {
                sheet: self.name.clone(),
                column: name,
                expected: self.rows.len(),
                actual: values.len(),
            });
        }

        let index = self.add_column(name)?;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[index] = value;
        }
        Ok(index)
    }

    /// Replace spaces in every column name with underscores
    ///
    /// Fails if two columns collapse onto the same canonical name.
    pub fn normalize_column_names(&mut self) -> Result<()> {
        let normalized: Vec<String> = self.columns.iter().map(|c| normalize_name(c)).collect();
        for (i, name) in normalized.iter().enumerate() {
            if normalized[..i].contains(name) {
                return Err(Error::DuplicateColumnName {
                    sheet: self.name.clone(),
                    column: name.clone(),
                });
            }
        }
        self.columns = normalized;
        Ok(())
    }

    // === Rows ===

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the sheet has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a data row
    ///
    /// Short rows are padded with empty cells; rows wider than the header are
    /// rejected.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) -> Result<()> {
        if cells.len() > self.columns.len() {
            return Err(Error::RowTooWide {
                sheet: self.name.clone(),
                row: self.rows.len(),
                width: cells.len(),
                columns: self.columns.len(),
            });
        }
        cells.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(cells);
        Ok(())
    }

    /// Get a row view by index
    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows
            .get(index)
            .map(|cells| RowRef::new(index, &self.columns, cells))
    }

    /// Iterate over all data rows
    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, cells)| RowRef::new(i, &self.columns, cells))
    }

    // === Cell Access ===

    /// Get a cell value by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// Set a cell value by row index and column name
    pub fn set_value<V: Into<CellValue>>(&mut self, row: usize, column: &str, value: V) -> Result<()> {
        let col = self
            .column_index(column)
            .ok_or_else(|| Error::ColumnNotFound {
                sheet: self.name.clone(),
                column: column.to_string(),
            })?;
        let row_count = self.rows.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or_else(|| Error::other(format!("Row {} out of bounds (count: {})", row, row_count)))?;
        cells[col] = value.into();
        Ok(())
    }

    /// Iterate over `(row index, value)` of one column, `None` if the column
    /// does not exist
    pub fn column_values(&self, column: &str) -> Option<impl Iterator<Item = (usize, &CellValue)>> {
        let col = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .enumerate()
                .map(move |(i, cells)| (i, &cells[col])),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reactions() -> Sheet {
        let mut sheet = Sheet::with_columns("Reaction", ["well id", "substrates"]).unwrap();
        sheet
            .push_row(vec![CellValue::from("A1"), CellValue::from("glc, eth")])
            .unwrap();
        sheet.push_row(vec![CellValue::from("A2")]).unwrap();
        sheet
    }

    #[test]
    fn test_rows_are_padded() {
        let sheet = reactions();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.value(1, "substrates"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_row_too_wide() {
        let mut sheet = Sheet::with_columns("S", ["a"]).unwrap();
        let err = sheet
            .push_row(vec![CellValue::from(1), CellValue::from(2)])
            .unwrap_err();
        assert!(matches!(err, Error::RowTooWide { width: 2, columns: 1, .. }));
    }

    #[test]
    fn test_duplicate_column() {
        let mut sheet = Sheet::with_columns("S", ["a"]).unwrap();
        assert!(sheet.add_column("a").is_err());
    }

    #[test]
    fn test_normalize_column_names() {
        let mut sheet = reactions();
        sheet.normalize_column_names().unwrap();
        assert_eq!(sheet.columns(), &["well_id".to_string(), "substrates".to_string()]);
        assert_eq!(sheet.value(0, "well_id"), Some(&CellValue::from("A1")));

        let mut clash = Sheet::with_columns("S", ["a b", "a_b"]).unwrap();
        assert!(clash.normalize_column_names().is_err());
    }

    #[test]
    fn test_push_column() {
        let mut sheet = reactions();
        sheet
            .push_column("_row_uuid", vec![CellValue::from("x"), CellValue::from("y")])
            .unwrap();
        assert_eq!(sheet.column_count(), 3);
        assert_eq!(sheet.value(1, "_row_uuid"), Some(&CellValue::from("y")));

        assert!(sheet.push_column("short", vec![CellValue::Empty]).is_err());
    }

    #[test]
    fn test_row_view() {
        let sheet = reactions();
        let row = sheet.row(0).unwrap();
        assert_eq!(row.spreadsheet_row(), 2);
        assert_eq!(row.get("substrates"), &CellValue::from("glc, eth"));
        assert_eq!(row.get("missing"), &CellValue::Empty);
        assert_eq!(row.non_empty().count(), 2);
        assert!(!row.is_blank());
    }

    #[test]
    fn test_column_values() {
        let sheet = reactions();
        let values: Vec<_> = sheet.column_values("well id").unwrap().collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1], (1, &CellValue::from("A2")));
        assert!(sheet.column_values("nope").is_none());
    }

    #[test]
    fn test_set_value() {
        let mut sheet = reactions();
        sheet.set_value(1, "substrates", "prod1").unwrap();
        assert_eq!(sheet.value(1, "substrates"), Some(&CellValue::from("prod1")));
        assert!(sheet.set_value(5, "substrates", 1).is_err());
        assert!(sheet.set_value(0, "nope", 1).is_err());
    }
}
