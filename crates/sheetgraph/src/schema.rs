//! Declarative sheet schema

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::typecheck::{check_workbook, TypeChecker, TypeInconsistencyReport};
use crate::{CellKind, Workbook};

/// Canonical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Integers and floats
    #[serde(alias = "float", alias = "int", alias = "number")]
    Number,
    #[serde(alias = "str", alias = "string")]
    String,
    #[serde(alias = "bool", alias = "boolean")]
    Boolean,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Number => "Number",
            DataType::String => "String",
            DataType::Boolean => "Boolean",
        }
    }
}

impl From<CellKind> for DataType {
    fn from(kind: CellKind) -> Self {
        match kind {
            CellKind::Integer | CellKind::Float => DataType::Number,
            CellKind::String => DataType::String,
            CellKind::Boolean => DataType::Boolean,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column and its inferred type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
}

/// The shape of one sheet: its name and typed columns in header order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetShape {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl SheetShape {
    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check if the sheet has a column
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Immutable snapshot of every sheet of a source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSchema {
    pub sheets: Vec<SheetShape>,
}

impl SheetSchema {
    /// Get a sheet by name
    pub fn sheet(&self, name: &str) -> Option<&SheetShape> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Check if the schema has a sheet
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    /// Get a column of a sheet
    pub fn column(&self, sheet: &str, column: &str) -> Option<&ColumnSchema> {
        self.sheet(sheet).and_then(|s| s.column(column))
    }
}

impl fmt::Display for SheetSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sheet) in self.sheets.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", sheet.name)?;
            for column in &sheet.columns {
                write!(f, "\n  {}: {}", column.name, column.data_type)?;
            }
        }
        Ok(())
    }
}

/// Build the schema of a workbook
///
/// Fails with [`Error::TypeInconsistency`] listing every inconsistent column
/// of every sheet if any column mixes incompatible types.
pub fn build_schema(workbook: &Workbook) -> Result<SheetSchema> {
    let inconsistencies = check_workbook(workbook);
    if !inconsistencies.is_empty() {
        return Err(Error::TypeInconsistency(TypeInconsistencyReport::new(
            inconsistencies,
        )));
    }

    let source = workbook
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut sheets = Vec::with_capacity(workbook.sheet_count());
    for sheet in workbook.sheets() {
        let checker = TypeChecker::new(sheet, source.as_str());
        let columns = sheet
            .columns()
            .iter()
            .map(|name| -> Result<ColumnSchema> {
                Ok(ColumnSchema {
                    name: name.clone(),
                    data_type: checker.column_type(name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        sheets.push(SheetShape {
            name: sheet.name().to_string(),
            columns,
        });
    }

    log::info!("Built schema for {} sheets", sheets.len());
    Ok(SheetSchema { sheets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellValue, Sheet};
    use pretty_assertions::assert_eq;

    fn workbook() -> Workbook {
        let mut sheet = Sheet::with_columns("Reaction", ["well_id", "volume", "ok", "note"]).unwrap();
        sheet
            .push_row(vec!["A1".into(), 1.into(), true.into(), CellValue::Empty])
            .unwrap();
        sheet
            .push_row(vec!["A2".into(), 2.5.into(), CellValue::Empty, CellValue::Empty])
            .unwrap();
        let mut wb = Workbook::new();
        wb.add_sheet(sheet).unwrap();
        wb
    }

    #[test]
    fn test_build_schema() {
        let schema = build_schema(&workbook()).unwrap();
        let types: Vec<(&str, DataType)> = schema.sheets[0]
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type))
            .collect();
        assert_eq!(
            types,
            vec![
                ("well_id", DataType::String),
                ("volume", DataType::Number),
                ("ok", DataType::Boolean),
                ("note", DataType::String),
            ]
        );
        assert!(schema.column("Reaction", "volume").is_some());
        assert!(schema.column("Reaction", "missing").is_none());
        assert!(!schema.has_sheet("Molecule"));
    }

    #[test]
    fn test_build_schema_rejects_inconsistent_sheets() {
        let mut wb = workbook();
        let mut bad = Sheet::with_columns("Bad", ["c"]).unwrap();
        bad.push_row(vec![1.into()]).unwrap();
        bad.push_row(vec!["x".into()]).unwrap();
        wb.add_sheet(bad).unwrap();

        match build_schema(&wb) {
            Err(Error::TypeInconsistency(report)) => {
                assert_eq!(report.len(), 1);
                assert_eq!(report.inconsistencies[0].sheet_name, "Bad");
            }
            other => panic!("expected type inconsistency, got {:?}", other),
        }
    }

    #[test]
    fn test_data_type_serde() {
        let json = serde_json::to_string(&DataType::Number).unwrap();
        assert_eq!(json, "\"Number\"");

        let legacy: Vec<DataType> = serde_json::from_str(r#"["float", "str", "bool", "String"]"#).unwrap();
        assert_eq!(
            legacy,
            vec![DataType::Number, DataType::String, DataType::Boolean, DataType::String]
        );
    }

    #[test]
    fn test_schema_json_shape() {
        let schema = build_schema(&workbook()).unwrap();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["sheets"][0]["columns"][1]["data_type"], "Number");
        assert_eq!(value["sheets"][0]["name"], "Reaction");
    }
}
