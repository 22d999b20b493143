//! Field validation and CSV field parsing
//!
//! Pure checks shared by the item, party, and entry services and the CSV
//! bulk import. CSV parsers treat an empty cell as "not provided" and
//! return user-facing messages naming the offending field.

use rust_decimal::Decimal;
use std::str::FromStr;

// ============================================================================
// Field Validations
// ============================================================================

/// Validate an item or party name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    if name.len() > 200 {
        return Err("Name must be at most 200 characters");
    }
    Ok(())
}

/// Validate a stock-keeping unit code
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.trim().is_empty() {
        return Err("SKU is required");
    }
    if sku.len() > 100 {
        return Err("SKU must be at most 100 characters");
    }
    Ok(())
}

/// Entry quantities are strictly positive
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Prices may be zero but never negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Unit cost on a purchase must be strictly positive
pub fn validate_unit_cost(cost: Decimal) -> Result<(), &'static str> {
    if cost <= Decimal::ZERO {
        return Err("Unit cost must be a positive number");
    }
    Ok(())
}

/// Stock counters (opening stock, reorder point, current stock) are
/// non-negative
pub fn validate_stock_level(level: i64) -> Result<(), &'static str> {
    if level < 0 {
        return Err("Stock level cannot be negative");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate a phone number: 7-20 digits with common separators
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'));
    if allowed && (7..=20).contains(&digits) {
        Ok(())
    } else {
        Err("Invalid phone number format")
    }
}

// ============================================================================
// CSV Field Parsing
// ============================================================================

/// Parse an optional money cell, e.g. a selling or purchase price.
pub fn parse_price_field(raw: &str, label: &str) -> Result<Option<Decimal>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match Decimal::from_str(raw) {
        Ok(value) if value < Decimal::ZERO => Err(format!("{} cannot be negative.", label)),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(format!("Invalid {} format.", label.to_lowercase())),
    }
}

/// Parse an optional whole-number cell, e.g. opening stock or reorder point.
pub fn parse_stock_field(raw: &str, label: &str) -> Result<Option<i32>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<i32>() {
        Ok(value) if value < 0 => Err(format!("{} cannot be negative.", label)),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(format!(
            "Invalid {} format (must be a whole number).",
            label.to_lowercase()
        )),
    }
}
