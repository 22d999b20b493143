//! CSV import tests
//!
//! Exercises the pure parse pass of the bulk item import: header
//! validation, per-row field parsing, row numbering, and row independence.
//! The template round-trips through its own parser.

use rust_decimal::Decimal;
use std::str::FromStr;

use stockflow_ledger::services::import::{csv_template, parse_item_csv, EXPECTED_HEADERS};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

const HEADER: &str =
    "name,sku,unit,category,selling_price,purchase_price,opening_stock,reorder_point,current_stock";

// ============================================================================
// File-Level Behaviour
// ============================================================================

#[cfg(test)]
mod file_level {
    use super::*;

    #[test]
    fn empty_file_is_reported_as_such() {
        let report = parse_item_csv("").unwrap_err();

        assert_eq!(report.total_rows, 0);
        assert_eq!(report.successful_imports, 0);
        assert_eq!(report.failed_imports, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row_num, 0);
        assert_eq!(report.errors[0].messages[0], "The CSV file is empty.");
    }

    #[test]
    fn missing_template_columns_fail_the_whole_file() {
        let text = "name,sku,unit\nWidget,SKU-1,Pieces\n";
        let report = parse_item_csv(text).unwrap_err();

        assert_eq!(report.total_rows, 1);
        assert_eq!(report.failed_imports, 1);
        assert_eq!(report.errors[0].row_num, 0);
        assert!(report.errors[0].messages[0].contains("Missing:"));
        assert!(report.errors[0].messages[0].contains("category"));
    }

    #[test]
    fn headers_match_case_insensitively() {
        let text = format!("{}\nWidget,SKU-1,Pieces,,,,,,\n", HEADER.to_uppercase());
        let lines = parse_item_csv(&text).unwrap();

        assert_eq!(lines.len(), 1);
        assert!(lines[0].outcome.is_ok());
    }

    #[test]
    fn template_round_trips_through_the_parser() {
        let template = csv_template().unwrap();
        let lines = parse_item_csv(&template).unwrap();

        assert_eq!(lines.len(), 1);
        let row = lines[0].outcome.as_ref().unwrap();
        assert_eq!(row.name, "Sample Item A");
        assert_eq!(row.sku, "SKU-001");
        assert_eq!(row.unit, "Pieces");
        assert_eq!(row.category.as_deref(), Some("Electronics"));
        assert_eq!(row.selling_price, Some(dec("100.50")));
        assert_eq!(row.purchase_price, Some(dec("75.25")));
        assert_eq!(row.opening_stock, Some(100));
        assert_eq!(row.reorder_point, Some(20));
        assert_eq!(row.current_stock, 100);
    }

    #[test]
    fn template_header_matches_expected_columns() {
        let template = csv_template().unwrap();
        let first_line = template.lines().next().unwrap();
        assert_eq!(first_line, EXPECTED_HEADERS.join(","));
    }
}

// ============================================================================
// Row-Level Behaviour
// ============================================================================

#[cfg(test)]
mod row_level {
    use super::*;

    #[test]
    fn row_numbers_start_after_the_header() {
        let text = format!("{}\nWidget,SKU-1,Pieces,,,,,,\nGadget,SKU-2,Pieces,,,,,,\n", HEADER);
        let lines = parse_item_csv(&text).unwrap();

        assert_eq!(lines[0].row_num, 2);
        assert_eq!(lines[1].row_num, 3);
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let text = format!("{}\n,,,,,,,,\n", HEADER);
        let lines = parse_item_csv(&text).unwrap();

        let messages = lines[0].outcome.as_ref().unwrap_err();
        assert!(messages.contains(&"Name is required.".to_string()));
        assert!(messages.contains(&"SKU is required.".to_string()));
        assert!(messages.contains(&"Unit of Measure is required.".to_string()));
    }

    #[test]
    fn malformed_numbers_name_the_field() {
        let text = format!("{}\nWidget,SKU-1,Pieces,,abc,-5,1.5,x,\n", HEADER);
        let lines = parse_item_csv(&text).unwrap();

        let messages = lines[0].outcome.as_ref().unwrap_err();
        assert!(messages.contains(&"Invalid selling price format.".to_string()));
        assert!(messages.contains(&"Purchase price cannot be negative.".to_string()));
        assert!(messages
            .contains(&"Invalid opening stock format (must be a whole number).".to_string()));
        assert!(messages
            .contains(&"Invalid reorder point format (must be a whole number).".to_string()));
    }

    #[test]
    fn bad_row_does_not_affect_neighbours() {
        let text = format!(
            "{}\nWidget,SKU-1,Pieces,,10.00,,,,5\n,,Pieces,,,,,,\nGadget,SKU-2,Boxes,,,,,,\n",
            HEADER
        );
        let lines = parse_item_csv(&text).unwrap();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].outcome.is_ok());
        assert!(lines[1].outcome.is_err());
        assert!(lines[2].outcome.is_ok());
        assert_eq!(lines[1].row_num, 3);
    }

    #[test]
    fn short_rows_read_as_empty_cells() {
        // Only name, sku, and unit present; the trailing columns are
        // simply absent.
        let text = format!("{}\nWidget,SKU-1,Pieces\n", HEADER);
        let lines = parse_item_csv(&text).unwrap();

        let row = lines[0].outcome.as_ref().unwrap();
        assert_eq!(row.selling_price, None);
        assert_eq!(row.purchase_price, None);
        assert_eq!(row.opening_stock, None);
        assert_eq!(row.reorder_point, None);
        assert_eq!(row.current_stock, 0);
        assert_eq!(row.category, None);
    }

    #[test]
    fn cells_are_trimmed() {
        let text = format!("{}\n  Widget , SKU-1 , Pieces ,, 10.00 ,,,, 5 \n", HEADER);
        let lines = parse_item_csv(&text).unwrap();

        let row = lines[0].outcome.as_ref().unwrap();
        assert_eq!(row.name, "Widget");
        assert_eq!(row.sku, "SKU-1");
        assert_eq!(row.selling_price, Some(dec("10.00")));
        assert_eq!(row.current_stock, 5);
    }

    #[test]
    fn raw_data_is_preserved_for_failed_rows() {
        let text = format!("{}\nWidget,,Pieces,,,,,,\n", HEADER);
        let lines = parse_item_csv(&text).unwrap();

        assert!(lines[0].outcome.is_err());
        assert_eq!(lines[0].data.get("name").map(String::as_str), Some("Widget"));
        assert_eq!(lines[0].data.get("sku").map(String::as_str), Some(""));
    }
}
