//! CSV bulk import of items
//!
//! The upload is parsed in a pure pass (header validation plus per-row
//! field parsing), then each clean row is upserted by SKU in its own
//! transaction. Rows are independent: a failed row is recorded with its
//! file row number and does not abort the rest.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::services::categories::CategoryService;
use crate::services::units::UnitService;
use shared::{parse_price_field, parse_stock_field, validate_name, validate_sku};

/// Column set expected by the import template.
pub const EXPECTED_HEADERS: [&str; 9] = [
    "name",
    "sku",
    "unit",
    "category",
    "selling_price",
    "purchase_price",
    "opening_stock",
    "reorder_point",
    "current_stock",
];

const SAMPLE_ROW: [&str; 9] = [
    "Sample Item A",
    "SKU-001",
    "Pieces",
    "Electronics",
    "100.50",
    "75.25",
    "100",
    "20",
    "100",
];

/// Import service
#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
}

/// Aggregate outcome of one uploaded file
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    pub errors: Vec<RowError>,
}

/// One failed row, with its raw data for re-display
#[derive(Debug, Serialize)]
pub struct RowError {
    /// 1-based file row number; the header is row 1, file-level errors use
    /// row 0.
    pub row_num: usize,
    pub data: BTreeMap<String, String>,
    pub messages: Vec<String>,
}

/// A row that passed field parsing and is ready to upsert
#[derive(Debug, Clone, PartialEq)]
pub struct ItemCsvRow {
    pub name: String,
    pub sku: String,
    pub unit: String,
    pub category: Option<String>,
    pub selling_price: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub opening_stock: Option<i32>,
    pub reorder_point: Option<i32>,
    pub current_stock: i32,
}

/// One parsed data row: file row number, raw cell data, parse outcome.
#[derive(Debug)]
pub struct ParsedLine {
    pub row_num: usize,
    pub data: BTreeMap<String, String>,
    pub outcome: Result<ItemCsvRow, Vec<String>>,
}

impl ImportService {
    /// Create a new ImportService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Import or update items from CSV text.
    ///
    /// Header-level failures come back as a report describing the whole
    /// file; otherwise rows are processed independently and the report
    /// carries per-row errors.
    pub async fn import_items(&self, csv_text: &str) -> AppResult<ImportReport> {
        let lines = match parse_item_csv(csv_text) {
            Ok(lines) => lines,
            Err(report) => return Ok(report),
        };

        let mut report = ImportReport {
            total_rows: lines.len(),
            ..Default::default()
        };

        for line in lines {
            match line.outcome {
                Ok(row) => match self.upsert_row(&row).await {
                    Ok(()) => report.successful_imports += 1,
                    Err(error) => {
                        tracing::warn!(row = line.row_num, %error, "import row failed");
                        report.failed_imports += 1;
                        report.errors.push(RowError {
                            row_num: line.row_num,
                            data: line.data,
                            messages: vec![row_message(&row, error)],
                        });
                    }
                },
                Err(messages) => {
                    report.failed_imports += 1;
                    report.errors.push(RowError {
                        row_num: line.row_num,
                        data: line.data,
                        messages,
                    });
                }
            }
        }

        Ok(report)
    }

    /// Upsert one clean row by SKU in its own transaction, creating the
    /// unit and category on the fly.
    async fn upsert_row(&self, row: &ItemCsvRow) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let unit = UnitService::find_or_create(&mut tx, &row.unit).await?;
        let category_id = match &row.category {
            Some(name) => Some(CategoryService::get_or_create(&mut tx, name).await?.id),
            None => None,
        };

        let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM items WHERE sku = $1")
            .bind(&row.sku)
            .fetch_optional(&mut *tx)
            .await?;

        match existing {
            Some(item_id) => {
                // The import is the sanctioned override path for
                // current_stock on existing items.
                sqlx::query(
                    "UPDATE items SET name = $1, unit_id = $2, category_id = $3, \
                     selling_price = $4, purchase_price = $5, opening_stock = $6, \
                     reorder_point = $7, current_stock = $8, updated_at = now() WHERE id = $9",
                )
                .bind(&row.name)
                .bind(unit.id)
                .bind(category_id)
                .bind(row.selling_price)
                .bind(row.purchase_price)
                .bind(row.opening_stock)
                .bind(row.reorder_point)
                .bind(row.current_stock)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO items (name, sku, unit_id, category_id, selling_price, \
                     purchase_price, opening_stock, reorder_point, current_stock) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(&row.name)
                .bind(&row.sku)
                .bind(unit.id)
                .bind(category_id)
                .bind(row.selling_price)
                .bind(row.purchase_price)
                .bind(row.opening_stock)
                .bind(row.reorder_point)
                .bind(row.current_stock)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::DuplicateEntry("sku".to_string())
                    } else {
                        AppError::from(e)
                    }
                })?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Pure parse of an uploaded file.
///
/// File-level problems (unreadable, empty, missing template columns) come
/// back as a finished report; otherwise each data row is returned with its
/// parse outcome. Row numbers are 1-based with the header as row 1.
pub fn parse_item_csv(text: &str) -> Result<Vec<ParsedLine>, ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(Ok(record)) => record.iter().map(|h| h.trim().to_lowercase()).collect(),
        Some(Err(e)) => return Err(file_error(format!("Error reading CSV headers: {}", e))),
        None => return Err(file_error("The CSV file is empty.".to_string())),
    };

    let mut data_rows = Vec::new();
    let mut read_errors = Vec::new();
    for (index, record) in records.enumerate() {
        let row_num = index + 2;
        match record {
            Ok(record) => data_rows.push((row_num, record)),
            Err(e) => read_errors.push((row_num, format!("Error reading row: {}", e))),
        }
    }

    let mut header_index = BTreeMap::new();
    let mut missing = Vec::new();
    for header in EXPECTED_HEADERS {
        match headers.iter().position(|h| h == header) {
            Some(index) => {
                header_index.insert(header, index);
            }
            None => missing.push(header),
        }
    }

    if !missing.is_empty() {
        let total = data_rows.len() + read_errors.len();
        let mut report = file_error(format!(
            "CSV headers do not match the template. Missing: {}",
            missing.join(", ")
        ));
        report.total_rows = total;
        report.failed_imports = total;
        return Err(report);
    }

    let mut lines = Vec::new();
    for (row_num, record) in data_rows {
        let mut data = BTreeMap::new();
        for (header, &index) in &header_index {
            // Short rows fall back to empty cells, matching the template.
            let value = record.get(index).unwrap_or("").trim().to_string();
            data.insert((*header).to_string(), value);
        }
        let outcome = parse_row(&data);
        lines.push(ParsedLine {
            row_num,
            data,
            outcome,
        });
    }
    for (row_num, message) in read_errors {
        lines.push(ParsedLine {
            row_num,
            data: BTreeMap::new(),
            outcome: Err(vec![message]),
        });
    }
    lines.sort_by_key(|line| line.row_num);

    Ok(lines)
}

fn parse_row(data: &BTreeMap<String, String>) -> Result<ItemCsvRow, Vec<String>> {
    let field = |name: &str| data.get(name).map(String::as_str).unwrap_or("");
    let mut messages = Vec::new();

    let name = field("name");
    if let Err(m) = validate_name(name) {
        messages.push(format!("{}.", m));
    }
    let sku = field("sku");
    if let Err(m) = validate_sku(sku) {
        messages.push(format!("{}.", m));
    }
    let unit = field("unit");
    if unit.is_empty() {
        messages.push("Unit of Measure is required.".to_string());
    }

    let selling_price = collect(
        parse_price_field(field("selling_price"), "Selling price"),
        &mut messages,
    );
    let purchase_price = collect(
        parse_price_field(field("purchase_price"), "Purchase price"),
        &mut messages,
    );
    let opening_stock = collect(
        parse_stock_field(field("opening_stock"), "Opening stock"),
        &mut messages,
    );
    let reorder_point = collect(
        parse_stock_field(field("reorder_point"), "Reorder point"),
        &mut messages,
    );
    let current_stock = collect(
        parse_stock_field(field("current_stock"), "Current stock"),
        &mut messages,
    );

    if !messages.is_empty() {
        return Err(messages);
    }

    let category = field("category");
    Ok(ItemCsvRow {
        name: name.to_string(),
        sku: sku.to_string(),
        unit: unit.to_string(),
        category: (!category.is_empty()).then(|| category.to_string()),
        selling_price: selling_price.flatten(),
        purchase_price: purchase_price.flatten(),
        opening_stock: opening_stock.flatten(),
        reorder_point: reorder_point.flatten(),
        current_stock: current_stock.flatten().unwrap_or(0),
    })
}

fn collect<T>(result: Result<Option<T>, String>, messages: &mut Vec<String>) -> Option<Option<T>> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            messages.push(message);
            None
        }
    }
}

fn file_error(message: String) -> ImportReport {
    ImportReport {
        total_rows: 0,
        successful_imports: 0,
        failed_imports: 0,
        errors: vec![RowError {
            row_num: 0,
            data: BTreeMap::new(),
            messages: vec![message],
        }],
    }
}

fn row_message(row: &ItemCsvRow, error: AppError) -> String {
    match error {
        AppError::DuplicateEntry(_) => format!(
            "SKU '{}' already exists. Item not imported/updated to avoid duplication.",
            row.sku
        ),
        other => other.to_string(),
    }
}

/// The import template: header row plus one sample row.
pub fn csv_template() -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(EXPECTED_HEADERS)
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    writer
        .write_record(SAMPLE_ROW)
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}
