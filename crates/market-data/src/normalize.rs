//! Scalar coercion for provider payloads.
//!
//! Providers are inconsistent about how a single number is shaped: the same
//! field may arrive as `12.5`, `[12.5]`, or `null` depending on API version.
//! Every numeric cell read from a provider goes through this module.
//!
//! Contract:
//! - `null` is a missing value (`Ok(None)`)
//! - a bare number is that number
//! - a one-element array is its element, normalized recursively
//! - anything else (strings, objects, booleans, empty or multi-element
//!   arrays) is an error

use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("expected a number or a one-element array, found {0}")]
    UnexpectedShape(String),

    #[error("expected exactly one element, found {0}")]
    WrongArity(usize),

    #[error("volume must be a non-negative integer, found {0}")]
    InvalidVolume(f64),
}

/// Extract a scalar `f64` from a bare number or a one-element array.
pub fn scalar_f64(value: &Value) -> Result<Option<f64>, NormalizeError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| NormalizeError::UnexpectedShape(n.to_string())),
        Value::Array(items) if items.len() == 1 => scalar_f64(&items[0]),
        Value::Array(items) => Err(NormalizeError::WrongArity(items.len())),
        other => Err(NormalizeError::UnexpectedShape(shape_name(other).to_string())),
    }
}

/// Extract a price as a `Decimal`. Non-finite values are treated as missing.
pub fn scalar_decimal(value: &Value) -> Result<Option<Decimal>, NormalizeError> {
    Ok(scalar_f64(value)?.and_then(to_decimal))
}

/// Extract a volume. Must be integral and non-negative; zero is valid.
pub fn scalar_volume(value: &Value) -> Result<Option<i64>, NormalizeError> {
    let Some(raw) = scalar_f64(value)? else {
        return Ok(None);
    };
    if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 {
        return Err(NormalizeError::InvalidVolume(raw));
    }
    i64::from_f64(raw)
        .map(Some)
        .ok_or(NormalizeError::InvalidVolume(raw))
}

/// Shortest decimal that round-trips to `value`, so `185.64` stays `185.64`.
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(|d| d.normalize())
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
