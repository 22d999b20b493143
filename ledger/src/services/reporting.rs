//! Read-only sales, purchases, and profit reporting
//!
//! Aggregations over the ledger with no write access. Row values are
//! computed in SQL; grand totals are summed from the fetched rows. The
//! discount compares the recorded unit price with the item's list selling
//! price.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{sale_discount, DateRange};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Sales report row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SalesReportRow {
    pub sale_id: Uuid,
    pub date: NaiveDate,
    pub sales_number: String,
    pub item_name: String,
    pub customer_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// The item's list price at report time, when one is set.
    pub selling_price: Option<Decimal>,
    pub total: Decimal,
}

impl SalesReportRow {
    pub fn discount(&self) -> Decimal {
        sale_discount(self.selling_price, self.unit_price, i64::from(self.quantity))
    }
}

/// Sales report with grand totals
#[derive(Debug, Serialize)]
pub struct SalesReport {
    pub rows: Vec<SalesReportRow>,
    pub total_sales: Decimal,
    pub total_discount: Decimal,
    pub total_quantity: i64,
}

/// Purchases report row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PurchasesReportRow {
    pub purchase_id: Uuid,
    pub date: NaiveDate,
    pub purchase_number: String,
    pub item_name: String,
    pub supplier_name: Option<String>,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub total: Decimal,
}

/// Purchases report with grand totals
#[derive(Debug, Serialize)]
pub struct PurchasesReport {
    pub rows: Vec<PurchasesReportRow>,
    pub total_purchases: Decimal,
    pub total_quantity: i64,
}

/// Per-sale profit against the item's recorded purchase price
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProfitReportRow {
    pub date: NaiveDate,
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_sales: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub profit: Decimal,
}

/// Profit/loss report with grand totals
#[derive(Debug, Serialize)]
pub struct ProfitReport {
    pub rows: Vec<ProfitReportRow>,
    pub total_sales: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Sales within the optional range, newest first, with grand totals.
    pub async fn sales_report(&self, range: Option<DateRange>) -> AppResult<SalesReport> {
        let rows = sqlx::query_as::<_, SalesReportRow>(
            r#"
            SELECT s.id AS sale_id, s.date, s.sales_number, i.name AS item_name,
                   c.name AS customer_name, s.quantity, s.unit_price,
                   i.selling_price,
                   s.unit_price * s.quantity AS total
            FROM sales s
            JOIN items i ON i.id = s.item_id
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE ($1::date IS NULL OR s.date >= $1)
              AND ($2::date IS NULL OR s.date <= $2)
            ORDER BY s.date DESC, s.created_at DESC
            "#,
        )
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        let mut report = SalesReport {
            rows: Vec::with_capacity(rows.len()),
            total_sales: Decimal::ZERO,
            total_discount: Decimal::ZERO,
            total_quantity: 0,
        };
        for row in rows {
            report.total_sales += row.total;
            report.total_discount += row.discount();
            report.total_quantity += i64::from(row.quantity);
            report.rows.push(row);
        }

        Ok(report)
    }

    /// Purchases within the optional range, newest first, with grand
    /// totals.
    pub async fn purchases_report(&self, range: Option<DateRange>) -> AppResult<PurchasesReport> {
        let rows = sqlx::query_as::<_, PurchasesReportRow>(
            r#"
            SELECT p.id AS purchase_id, p.date, p.purchase_number, i.name AS item_name,
                   su.name AS supplier_name, p.quantity, p.unit_cost,
                   p.unit_cost * p.quantity AS total
            FROM purchases p
            JOIN items i ON i.id = p.item_id
            LEFT JOIN suppliers su ON su.id = p.supplier_id
            WHERE ($1::date IS NULL OR p.date >= $1)
              AND ($2::date IS NULL OR p.date <= $2)
            ORDER BY p.date DESC, p.created_at DESC
            "#,
        )
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        let mut report = PurchasesReport {
            rows: Vec::with_capacity(rows.len()),
            total_purchases: Decimal::ZERO,
            total_quantity: 0,
        };
        for row in rows {
            report.total_purchases += row.total;
            report.total_quantity += i64::from(row.quantity);
            report.rows.push(row);
        }

        Ok(report)
    }

    /// Per-sale profit against the item's recorded purchase price (treated
    /// as zero when unset), with grand totals.
    pub async fn profit_loss_report(&self, range: Option<DateRange>) -> AppResult<ProfitReport> {
        let rows = sqlx::query_as::<_, ProfitReportRow>(
            r#"
            SELECT s.date, i.name AS item_name, s.quantity, s.unit_price,
                   s.unit_price * s.quantity AS total_sales,
                   COALESCE(i.purchase_price, 0) AS unit_cost,
                   COALESCE(i.purchase_price, 0) * s.quantity AS total_cost,
                   s.unit_price * s.quantity
                     - COALESCE(i.purchase_price, 0) * s.quantity AS profit
            FROM sales s
            JOIN items i ON i.id = s.item_id
            WHERE ($1::date IS NULL OR s.date >= $1)
              AND ($2::date IS NULL OR s.date <= $2)
            ORDER BY s.date DESC, s.created_at DESC
            "#,
        )
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .fetch_all(&self.db)
        .await?;

        let mut report = ProfitReport {
            rows: Vec::with_capacity(rows.len()),
            total_sales: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_profit: Decimal::ZERO,
        };
        for row in rows {
            report.total_sales += row.total_sales;
            report.total_cost += row.total_cost;
            report.total_profit += row.profit;
            report.rows.push(row);
        }

        Ok(report)
    }

    /// Export report rows as CSV.
    pub fn export_to_csv<T: Serialize>(rows: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in rows {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
