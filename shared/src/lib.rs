//! Shared domain types and logic for Stockflow
//!
//! This crate holds the pure, database-free core of the stock ledger:
//! entry kinds and the signed movement algebra, stock account arithmetic,
//! alert transition rules, sequence number formatting, discount math, and
//! field validation. The `ledger` crate wraps these in transactional
//! services; callers reuse the same types on their side of the contract.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
