//! XLSX options

/// Options for reading XLSX workbooks
#[derive(Debug, Clone)]
pub struct XlsxReadOptions {
    /// Trim string cells and strip trailing commas
    pub trim_strings: bool,
    /// Replace spaces in column names with underscores
    pub normalize_column_names: bool,
    /// Skip worksheets without any cell
    pub skip_empty_sheets: bool,
}

impl Default for XlsxReadOptions {
    fn default() -> Self {
        Self {
            trim_strings: true,
            normalize_column_names: true,
            skip_empty_sheets: false,
        }
    }
}
