//! Stockflow stock ledger engine for small-business inventory
//!
//! Tracks items, categories, units of measure, suppliers, and customers,
//! and derives running stock levels from a ledger of adjustments, sales,
//! and purchases. All mutation of `items.current_stock` flows through the
//! transactional engine in [`services::engine`]; low-stock alerts and the
//! daily sequence numbers for sales and purchases are maintained alongside
//! every mutation.
//!
//! HTTP routing, authentication, template rendering, and mail delivery are
//! the caller's concern. This crate is the persistence-facing core those
//! layers wrap.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Embedded database migrations; callers run `MIGRATOR.run(&pool)` at
/// startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
