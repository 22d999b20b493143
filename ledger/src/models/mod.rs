//! Database-facing models for the Stockflow ledger
//!
//! Re-exports the shared domain types; row types private to a service live
//! next to that service.

pub use shared::models::*;
