//! Line totals and discount math for sales and purchases

use rust_decimal::Decimal;

/// Total value of a line: unit value times quantity.
pub fn line_total(unit_value: Decimal, quantity: i64) -> Decimal {
    unit_value * Decimal::from(quantity)
}

/// Discount granted on a sale, relative to the item's list selling price.
///
/// Zero when the item has no selling price, and never negative: selling
/// above list is not a negative discount.
pub fn sale_discount(
    selling_price: Option<Decimal>,
    unit_price: Decimal,
    quantity: i64,
) -> Decimal {
    match selling_price {
        Some(list_price) => {
            let expected = line_total(list_price, quantity);
            let actual = line_total(unit_price, quantity);
            (expected - actual).max(Decimal::ZERO)
        }
        None => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn line_total_multiplies_out() {
        assert_eq!(line_total(dec("12.50"), 4), dec("50.00"));
    }

    #[test]
    fn discount_is_list_minus_actual() {
        // List 20.00, sold at 15.00, quantity 30 -> 150.00 off.
        assert_eq!(sale_discount(Some(dec("20.00")), dec("15.00"), 30), dec("150.00"));
    }

    #[test]
    fn discount_never_negative() {
        assert_eq!(sale_discount(Some(dec("10.00")), dec("12.00"), 5), Decimal::ZERO);
    }

    #[test]
    fn discount_zero_without_list_price() {
        assert_eq!(sale_discount(None, dec("9.99"), 100), Decimal::ZERO);
    }
}
