//! Fixed-point money helpers.
//!
//! Prices and quantities are integers in minor units. Unlike a single
//! compiled-in scale, every conversion here takes an explicit `scale`
//! (the symbol's `price_scale`, e.g. 100 for cents, 100_000_000 for
//! 8-decimal crypto) since different symbols carry different scales.

use crate::error::ValidationError;

/// Convert a floating-point value to fixed-point at the given scale.
///
/// Returns an error string (not a full error type; this is a convenience
/// entry point for tests and tooling, not the hot path) if the value is
/// NaN, infinite, or out of range for `i64`.
pub fn to_fixed(value: f64, scale: i64) -> Result<i64, String> {
    if value.is_nan() {
        return Err("value is NaN".to_string());
    }
    if value.is_infinite() {
        return Err("value is infinite".to_string());
    }
    let scaled = value * scale as f64;
    if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
        return Err(format!("value {value} out of range at scale {scale}"));
    }
    Ok(scaled.round() as i64)
}

/// Convert a fixed-point value back to floating point for display.
pub fn from_fixed(value: i64, scale: i64) -> f64 {
    value as f64 / scale as f64
}

/// Notional = quantity * price, computed with 128-bit intermediates to
/// avoid overflow for large quantity/price combinations, then divided
/// back down by `scale` to return to the same fixed-point representation
/// as its inputs.
#[inline]
pub fn notional(quantity: i64, price: i64, scale: i64) -> i128 {
    (quantity as i128 * price as i128) / scale as i128
}

/// Basis points helper: `value * bps / 10_000`, using a 128-bit
/// intermediate so large notionals don't overflow before dividing.
#[inline]
pub fn apply_bps(value: i64, bps: i64) -> i64 {
    ((value as i128 * bps as i128) / 10_000) as i64
}

/// Validate that a raw order quantity is usable (non-zero, positive).
pub fn validate_quantity(quantity: i64) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::NonPositiveQuantity { quantity });
    }
    Ok(())
}
