//! Property tests for column type inference

use proptest::prelude::*;
use sheetgraph::{CellValue, DataType, Sheet, TypeChecker};

fn column(values: &[CellValue]) -> Sheet {
    let mut sheet = Sheet::with_columns("Plate", ["c"]).unwrap();
    for value in values {
        sheet.push_row(vec![value.clone()]).unwrap();
    }
    sheet
}

fn numeric_cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        any::<i64>().prop_map(CellValue::from),
        (-1.0e9f64..1.0e9f64).prop_map(CellValue::from),
        Just(CellValue::Empty),
    ]
}

proptest! {
    #[test]
    fn test_int_and_float_columns_are_numbers(values in prop::collection::vec(numeric_cell(), 1..60)) {
        let sheet = column(&values);
        let mut checker = TypeChecker::new(&sheet, "plate.csv");
        prop_assert!(checker.check_column_consistency("c").unwrap());

        let expected = if values.iter().all(CellValue::is_empty) {
            DataType::String
        } else {
            DataType::Number
        };
        prop_assert_eq!(checker.column_type("c").unwrap(), expected);
    }

    #[test]
    fn test_mixed_columns_report_exactly_the_text_rows(
        cells in prop::collection::vec(
            prop_oneof![
                any::<i32>().prop_map(CellValue::from),
                "[a-z]{1,6}".prop_map(CellValue::from),
            ],
            2..60,
        )
    ) {
        let text_rows: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_string().is_some())
            .map(|(i, _)| i + 2)
            .collect();
        prop_assume!(!text_rows.is_empty() && text_rows.len() < cells.len());

        let sheet = column(&cells);
        let mut checker = TypeChecker::new(&sheet, "plate.csv");
        prop_assert!(!checker.check_column_consistency("c").unwrap());
        prop_assert_eq!(&checker.inconsistencies()[0].rows, &text_rows);

        let first = checker.all_inconsistencies().unwrap().to_vec();
        let second = checker.all_inconsistencies().unwrap().to_vec();
        prop_assert_eq!(first, second);
    }
}
