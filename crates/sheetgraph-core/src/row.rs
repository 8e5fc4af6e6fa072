//! Row types

use crate::cell::CellValue;
use crate::column::spreadsheet_row;

static EMPTY: CellValue = CellValue::Empty;

/// A borrowed view of one data row (used during iteration)
///
/// Behaves like a mapping from column name to cell value; columns keep the
/// sheet's order.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    /// Row index (0-based, header excluded)
    pub index: usize,
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl<'a> RowRef<'a> {
    /// Create a new row view
    pub(crate) fn new(index: usize, columns: &'a [String], cells: &'a [CellValue]) -> Self {
        Self {
            index,
            columns,
            cells,
        }
    }

    /// Row number as displayed by a spreadsheet application
    pub fn spreadsheet_row(&self) -> usize {
        spreadsheet_row(self.index)
    }

    /// Get a cell by column name (`Empty` for unknown columns)
    pub fn get(&self, column: &str) -> &'a CellValue {
        let cells = self.cells;
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| cells.get(i))
            .unwrap_or(&EMPTY)
    }

    /// Get a cell by column index
    pub fn cell(&self, col: usize) -> &'a CellValue {
        let cells = self.cells;
        cells.get(col).unwrap_or(&EMPTY)
    }

    /// Iterate over (column name, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> + 'a {
        let cells = self.cells;
        let columns = self.columns;
        columns
            .iter()
            .enumerate()
            .map(move |(i, name)| (name.as_str(), cells.get(i).unwrap_or(&EMPTY)))
    }

    /// Iterate over non-empty (column name, value) pairs
    pub fn non_empty(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> + 'a {
        self.iter().filter(|(_, v)| !v.is_empty())
    }

    /// Check if every cell of the row is empty
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }
}
