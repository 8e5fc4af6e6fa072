//! Structural and referential validation of a [`GraphMapping`]
//!
//! Validation never stops at the first defect. Every check appends to a
//! [`GraphValidationResult`] and the caller gets the complete list in one
//! pass.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mapping::{GraphMapping, SheetConnection, SheetReference};
use crate::schema::SheetSchema;
use crate::Workbook;

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    MissingSheet,
    MissingColumn,
    MissingKey,
    MissingValue,
    /// An edge name that leaves no relationship type once sanitized
    InvalidRelationship,
}

/// One defect of a mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphValidationError {
    pub error_type: ValidationErrorKind,
    pub sheet_name: String,
    pub message: String,
    /// Spreadsheet row of a missing value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Tokens of the row that match nothing in the target column
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_values: Vec<String>,
}

impl GraphValidationError {
    pub fn missing_sheet(sheet: &str) -> Self {
        Self::new(
            ValidationErrorKind::MissingSheet,
            sheet,
            format!("Sheet '{}' not found", sheet),
        )
    }

    pub fn missing_key(sheet: &str, key: &str) -> Self {
        Self::new(
            ValidationErrorKind::MissingKey,
            sheet,
            format!("Key '{}' not found in sheet '{}'", key, sheet),
        )
    }

    pub fn missing_column(sheet: &str, column: &str) -> Self {
        Self::new(
            ValidationErrorKind::MissingColumn,
            sheet,
            format!("Column '{}' not found in sheet '{}'", column, sheet),
        )
    }

    pub fn invalid_relationship(connection: &SheetConnection) -> Self {
        Self::new(
            ValidationErrorKind::InvalidRelationship,
            &connection.source_sheet_name,
            format!(
                "Edge name '{}' from sheet '{}' to sheet '{}' is not a valid relationship type",
                connection.edge_name, connection.source_sheet_name, connection.target_sheet_name
            ),
        )
    }

    /// Unmatched tokens of one source row
    pub fn missing_value(reference: &SheetReference, row: usize, values: Vec<String>) -> Self {
        let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
        let message = format!(
            "Values [{}] in row {} of column '{}' not found in target column '{}' of sheet '{}'",
            quoted.join(", "),
            row,
            reference.source_column_name,
            reference.target_column_name,
            reference.target_sheet_name
        );
        Self {
            row: Some(row),
            missing_values: values,
            ..Self::new(
                ValidationErrorKind::MissingValue,
                &reference.source_sheet_name,
                message,
            )
        }
    }

    fn new(error_type: ValidationErrorKind, sheet: &str, message: String) -> Self {
        Self {
            error_type,
            sheet_name: sheet.to_string(),
            message,
            row: None,
            missing_values: Vec::new(),
        }
    }
}

impl fmt::Display for GraphValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Aggregated findings, grouped the way they are reported
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphValidationResult {
    pub missing_sheets: Vec<GraphValidationError>,
    /// Missing columns and missing keys
    pub missing_columns: Vec<GraphValidationError>,
    pub missing_values: Vec<GraphValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_relationships: Vec<GraphValidationError>,
}

impl GraphValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any list holds a finding
    pub fn has_errors(&self) -> bool {
        !self.missing_sheets.is_empty()
            || !self.missing_columns.is_empty()
            || !self.missing_values.is_empty()
            || !self.invalid_relationships.is_empty()
    }

    /// Total number of findings
    pub fn error_count(&self) -> usize {
        self.missing_sheets.len()
            + self.missing_columns.len()
            + self.missing_values.len()
            + self.invalid_relationships.len()
    }

    /// File a finding under the list of its kind
    pub fn push(&mut self, error: GraphValidationError) {
        match error.error_type {
            ValidationErrorKind::MissingSheet => self.missing_sheets.push(error),
            ValidationErrorKind::MissingColumn | ValidationErrorKind::MissingKey => {
                self.missing_columns.push(error)
            }
            ValidationErrorKind::MissingValue => self.missing_values.push(error),
            ValidationErrorKind::InvalidRelationship => self.invalid_relationships.push(error),
        }
    }

    /// Append another result, keeping relative order
    pub fn extend(&mut self, other: GraphValidationResult) {
        self.missing_sheets.extend(other.missing_sheets);
        self.missing_columns.extend(other.missing_columns);
        self.missing_values.extend(other.missing_values);
        self.invalid_relationships.extend(other.invalid_relationships);
    }

    /// Every finding, sheets first
    pub fn iter(&self) -> impl Iterator<Item = &GraphValidationError> {
        self.missing_sheets
            .iter()
            .chain(&self.missing_columns)
            .chain(&self.missing_values)
            .chain(&self.invalid_relationships)
    }
}

impl fmt::Display for GraphValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("Missing Sheets", &self.missing_sheets),
            ("Missing Columns", &self.missing_columns),
            ("Missing Values", &self.missing_values),
            ("Invalid Relationships", &self.invalid_relationships),
        ];
        let mut first = true;
        for (title, errors) in sections {
            if errors.is_empty() {
                continue;
            }
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "\n{}:", title)?;
            for error in errors {
                write!(f, "\n  - {}", error.message)?;
            }
        }
        Ok(())
    }
}

/// Check that every connection names existing sheets and key columns and
/// has a usable edge name
///
/// A missing sheet only skips the key check of that sheet.
pub fn validate_connections(
    schema: &SheetSchema,
    connections: &[SheetConnection],
) -> GraphValidationResult {
    let mut result = GraphValidationResult::new();
    for connection in connections {
        if connection.relationship_type().is_empty() {
            result.push(GraphValidationError::invalid_relationship(connection));
        }
        for sheet_name in [&connection.source_sheet_name, &connection.target_sheet_name] {
            match schema.sheet(sheet_name) {
                None => result.push(GraphValidationError::missing_sheet(sheet_name)),
                Some(sheet) if !sheet.has_column(&connection.key) => {
                    result.push(GraphValidationError::missing_key(sheet_name, &connection.key))
                }
                Some(_) => {}
            }
        }
    }
    result
}

/// Check that every reference names existing sheets and columns, then that
/// every token of the source column exists in the target column
///
/// Value checks only run for references whose structure is valid and whose
/// sheets are present in `workbook`.
pub fn validate_references(
    schema: &SheetSchema,
    references: &[SheetReference],
    workbook: &Workbook,
) -> GraphValidationResult {
    let mut result = GraphValidationResult::new();
    for reference in references {
        let mut structure_ok = true;
        let ends = [
            (&reference.source_sheet_name, &reference.source_column_name),
            (&reference.target_sheet_name, &reference.target_column_name),
        ];
        for (sheet_name, column) in ends {
            match schema.sheet(sheet_name) {
                None => {
                    result.push(GraphValidationError::missing_sheet(sheet_name));
                    structure_ok = false;
                }
                Some(sheet) if !sheet.has_column(column) => {
                    result.push(GraphValidationError::missing_column(sheet_name, column));
                    structure_ok = false;
                }
                Some(_) => {}
            }
        }
        if structure_ok {
            check_reference_values(reference, workbook, &mut result);
        }
    }
    result
}

fn check_reference_values(
    reference: &SheetReference,
    workbook: &Workbook,
    result: &mut GraphValidationResult,
) {
    let (Some(source), Some(target)) = (
        workbook.sheet_by_name(&reference.source_sheet_name),
        workbook.sheet_by_name(&reference.target_sheet_name),
    ) else {
        log::debug!(
            "Skipping value check of {}.{}: sheet data not loaded",
            reference.source_sheet_name,
            reference.source_column_name
        );
        return;
    };
    let (Some(source_values), Some(target_values)) = (
        source.column_values(&reference.source_column_name),
        target.column_values(&reference.target_column_name),
    ) else {
        return;
    };

    let known: HashSet<String> = target_values
        .filter(|(_, v)| !v.is_empty())
        .map(|(_, v)| v.to_string())
        .collect();

    for (index, value) in source_values {
        let missing: Vec<String> = value
            .tokens()
            .into_iter()
            .filter(|token| !known.contains(token))
            .collect();
        if !missing.is_empty() {
            let row = sheetgraph_core::column::spreadsheet_row(index);
            result.push(GraphValidationError::missing_value(reference, row, missing));
        }
    }
}

/// Check that every explicit primary key names an existing sheet and column
pub fn validate_primary_keys(
    schema: &SheetSchema,
    primary_keys: &BTreeMap<String, String>,
) -> GraphValidationResult {
    let mut result = GraphValidationResult::new();
    for (sheet_name, key) in primary_keys {
        match schema.sheet(sheet_name) {
            None => result.push(GraphValidationError::missing_sheet(sheet_name)),
            Some(sheet) if !sheet.has_column(key) => {
                result.push(GraphValidationError::missing_key(sheet_name, key))
            }
            Some(_) => {}
        }
    }
    result
}

/// Validate a whole mapping: connections, then references, then explicit
/// primary keys
pub fn validate(
    schema: &SheetSchema,
    mapping: &GraphMapping,
    workbook: &Workbook,
) -> GraphValidationResult {
    let mut result = validate_connections(schema, &mapping.sheet_connections);
    result.extend(validate_references(schema, &mapping.sheet_references, workbook));
    result.extend(validate_primary_keys(schema, &mapping.primary_keys));

    if result.has_errors() {
        log::warn!("Mapping validation found {} errors", result.error_count());
    } else {
        log::info!(
            "Mapping is valid: {} connections, {} references",
            mapping.sheet_connections.len(),
            mapping.sheet_references.len()
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::build_schema;
    use crate::{CellValue, Sheet};
    use pretty_assertions::assert_eq;

    fn workbook() -> Workbook {
        let mut reaction = Sheet::with_columns("Reaction", ["well_id", "substrates"]).unwrap();
        reaction.push_row(vec!["A1".into(), "glc, eth".into()]).unwrap();
        reaction.push_row(vec!["A2".into(), CellValue::Empty]).unwrap();
        reaction.push_row(vec!["A3".into(), "glc, xyl,  ara".into()]).unwrap();

        let mut molecule = Sheet::with_columns("Molecule", ["name", "mass"]).unwrap();
        for (name, mass) in [("glc", 180.16), ("eth", 46.07), ("prod1", 60.0)] {
            molecule.push_row(vec![name.into(), mass.into()]).unwrap();
        }

        let mut wb = Workbook::new();
        wb.add_sheet(reaction).unwrap();
        wb.add_sheet(molecule).unwrap();
        wb
    }

    #[test]
    fn test_valid_reference() {
        let mut wb = workbook();
        wb.sheet_by_name_mut("Reaction")
            .unwrap()
            .set_value(2, "substrates", CellValue::Empty)
            .unwrap();
        let schema = build_schema(&wb).unwrap();
        let refs = [SheetReference::new("Reaction", "substrates", "Molecule", "name")];
        let result = validate_references(&schema, &refs, &wb);
        assert!(!result.has_errors(), "{}", result);
    }

    #[test]
    fn test_missing_values_report_row_and_tokens() {
        let wb = workbook();
        let schema = build_schema(&wb).unwrap();
        let refs = [SheetReference::new("Reaction", "substrates", "Molecule", "name")];
        let result = validate_references(&schema, &refs, &wb);

        assert_eq!(result.missing_values.len(), 1);
        let error = &result.missing_values[0];
        assert_eq!(error.error_type, ValidationErrorKind::MissingValue);
        assert_eq!(error.sheet_name, "Reaction");
        assert_eq!(error.row, Some(4));
        assert_eq!(error.missing_values, vec!["xyl", "ara"]);
        assert_eq!(
            error.message,
            "Values ['xyl', 'ara'] in row 4 of column 'substrates' not found in target column 'name' of sheet 'Molecule'"
        );
    }

    #[test]
    fn test_numeric_tokens_match_by_text() {
        let mut wb = Workbook::new();
        let mut src = Sheet::with_columns("Plate", ["id", "wells"]).unwrap();
        src.push_row(vec!["P1".into(), "1, 2".into()]).unwrap();
        let mut dst = Sheet::with_columns("Well", ["number"]).unwrap();
        dst.push_row(vec![1.into()]).unwrap();
        dst.push_row(vec![2.into()]).unwrap();
        wb.add_sheet(src).unwrap();
        wb.add_sheet(dst).unwrap();

        let schema = build_schema(&wb).unwrap();
        let refs = [SheetReference::new("Plate", "wells", "Well", "number")];
        assert!(!validate_references(&schema, &refs, &wb).has_errors());
    }

    #[test]
    fn test_connections_check_each_side() {
        let wb = workbook();
        let schema = build_schema(&wb).unwrap();
        let connections = [
            SheetConnection::new("Reaction", "Measurement", "measured_by", "well_id"),
            SheetConnection::new("Reaction", "Molecule", "uses", "well_id"),
        ];
        let result = validate_connections(&schema, &connections);
        let messages: Vec<&str> = result.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Sheet 'Measurement' not found",
                "Key 'well_id' not found in sheet 'Molecule'",
            ]
        );
        assert_eq!(result.missing_columns[0].error_type, ValidationErrorKind::MissingKey);
    }

    #[test]
    fn test_blank_edge_name_is_reported() {
        let wb = workbook();
        let schema = build_schema(&wb).unwrap();
        let connections = [
            SheetConnection::new("Reaction", "Molecule", "  ", "name"),
            SheetConnection::new("Molecule", "Reaction", "", "well_id"),
            SheetConnection::new("Reaction", "Reaction", "same well", "well_id"),
        ];
        let result = validate_connections(&schema, &connections);

        assert_eq!(result.invalid_relationships.len(), 2);
        assert_eq!(
            result.invalid_relationships[0].error_type,
            ValidationErrorKind::InvalidRelationship
        );
        assert_eq!(result.invalid_relationships[1].sheet_name, "Molecule");
        assert_eq!(
            result.invalid_relationships[1].message,
            "Edge name '' from sheet 'Molecule' to sheet 'Reaction' is not a valid relationship type"
        );
        assert_eq!(result.error_count(), 4);
        assert!(result.to_string().contains("\nInvalid Relationships:\n  - Edge name '  '"));
    }

    #[test]
    fn test_validate_is_exhaustive() {
        let wb = workbook();
        let schema = build_schema(&wb).unwrap();
        let mapping = GraphMapping::new()
            .with_connection(SheetConnection::new("Reaction", "Ghost", "haunts", "well_id"))
            .with_reference(SheetReference::new("Reaction", "substrates", "Molecule", "name"))
            .with_reference(SheetReference::new("Reaction", "products", "Molecule", "name"))
            .with_primary_key("Molecule", "formula");

        let result = validate(&schema, &mapping, &wb);
        assert_eq!(result.missing_sheets.len(), 1);
        assert_eq!(result.missing_columns.len(), 2);
        assert_eq!(result.missing_values.len(), 1);
        assert_eq!(result.error_count(), 4);
        assert_eq!(
            result.missing_columns[1].message,
            "Key 'formula' not found in sheet 'Molecule'"
        );
    }

    #[test]
    fn test_display_groups_by_kind() {
        let mut result = GraphValidationResult::new();
        result.push(GraphValidationError::missing_sheet("Ghost"));
        result.push(GraphValidationError::missing_column("Reaction", "products"));
        assert_eq!(
            result.to_string(),
            "\nMissing Sheets:\n  - Sheet 'Ghost' not found\n\nMissing Columns:\n  - Column 'products' not found in sheet 'Reaction'"
        );
        assert_eq!(GraphValidationResult::new().to_string(), "");
    }

    #[test]
    fn test_json_shape() {
        let error = GraphValidationError::missing_sheet("Ghost");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["error_type"], "missing_sheet");
        assert!(json.get("row").is_none());
    }
}
