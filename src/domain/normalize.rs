//! Normalization of untrusted client input.

use rust_decimal::Decimal;

use crate::error::CheckoutError;

/// Normalizes a Bangladeshi mobile number to the local `01XXXXXXXXX` form.
///
/// Accepts `+8801XXXXXXXXX`, `8801XXXXXXXXX` and `01XXXXXXXXX`; everything
/// that is not a digit is stripped first, and the `88` country prefix is
/// collapsed away.
pub fn normalize_phone(raw: &str) -> Result<String, CheckoutError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let local = match digits.strip_prefix("88") {
        Some(rest) if digits.len() == 13 => rest.to_string(),
        _ => digits,
    };

    if local.len() == 11 && local.starts_with("01") {
        Ok(local)
    } else {
        Err(CheckoutError::InvalidPhone)
    }
}

/// Floors a quantity to a non-negative whole number. Non-finite values
/// collapse to 0 so they can never reach the totals.
pub fn normalize_quantity(raw: f64) -> u32 {
    if !raw.is_finite() {
        return 0;
    }
    raw.floor().max(0.0).min(f64::from(u32::MAX)) as u32
}

/// Replaces missing or negative monetary values with `fallback` so they
/// cannot propagate into totals.
pub fn coerce_amount(value: Option<Decimal>, fallback: Decimal) -> Decimal {
    match value {
        Some(v) if v >= Decimal::ZERO => v,
        _ => fallback,
    }
}

/// Bangladeshi postal codes are exactly four digits.
pub fn valid_zip(zip: &str) -> bool {
    zip.len() == 4 && zip.chars().all(|c| c.is_ascii_digit())
}
