//! Pure conversion between currencies of a rate table.

use crate::core::currency::CurrencyCode;
use crate::core::error::{RateError, RateResult};
use crate::core::rates::RateTable;
use tracing::debug;

/// Converts `amount` from one currency to another using `table`.
///
/// Works whatever the table's base is: when neither side is the base the
/// cross-rate goes through it. No rounding is applied.
pub fn convert(
    table: &RateTable,
    amount: f64,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> RateResult<f64> {
    if from == to {
        return Ok(amount);
    }

    let from_rate = table
        .rate(from)
        .ok_or_else(|| RateError::UnknownCurrency(from.to_string()))?;
    let to_rate = table
        .rate(to)
        .ok_or_else(|| RateError::UnknownCurrency(to.to_string()))?;

    let converted = if *from == table.base {
        amount * to_rate
    } else if *to == table.base {
        amount / from_rate
    } else {
        amount * to_rate / from_rate
    };
    debug!(
        "Converted {amount} {from} to {converted} {to} (base {})",
        table.base
    );
    Ok(converted)
}

/// Reads an amount typed by the user. Blank, non-numeric or non-finite text
/// is zero. A decimal comma is accepted.
pub fn parse_amount(text: &str) -> f64 {
    let normalized = text.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Renders a computed amount for an input field. Whole numbers keep one
/// decimal ("110.0"), everything else is rounded to six decimals.
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded.fract() == 0.0 {
        format!("{rounded:.1}")
    } else {
        format!("{rounded}")
    }
}
