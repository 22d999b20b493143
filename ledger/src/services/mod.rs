//! Business logic services for the Stockflow ledger

pub mod adjustments;
pub mod alerts;
pub mod categories;
pub mod customers;
pub mod engine;
pub mod import;
pub mod items;
pub mod numbering;
pub mod purchases;
pub mod reporting;
pub mod sales;
pub mod suppliers;
pub mod units;

pub use adjustments::AdjustmentService;
pub use alerts::AlertService;
pub use categories::CategoryService;
pub use customers::CustomerService;
pub use import::ImportService;
pub use items::ItemService;
pub use purchases::PurchaseService;
pub use reporting::ReportingService;
pub use sales::SaleService;
pub use suppliers::SupplierService;
pub use units::UnitService;
