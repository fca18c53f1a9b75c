//! Validation and coercion of raw assessment requests.
//!
//! Turns an untyped JSON request into a [`Transaction`]. Only presence and
//! type coercion are checked here; categorical tokens are passed through
//! without any domain validation.

use crate::error::ValidationError;
use crate::types::transaction::{Transaction, REQUIRED_FIELDS};
use serde_json::{Map, Value};

/// Normalizer that turns raw request fields into a typed transaction.
pub struct FeatureNormalizer;

impl FeatureNormalizer {
    /// Create a new feature normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw JSON value. Anything other than an object is rejected.
    pub fn normalize_value(&self, raw: &Value) -> Result<Transaction, ValidationError> {
        match raw {
            Value::Object(fields) => self.normalize(fields),
            _ => Err(ValidationError::NotAnObject),
        }
    }

    /// Normalize a raw field map.
    ///
    /// Presence of every required field is checked before any coercion, so a
    /// request missing `category` reports `category` even if `step` is garbage.
    pub fn normalize(&self, fields: &Map<String, Value>) -> Result<Transaction, ValidationError> {
        for field in REQUIRED_FIELDS {
            if !fields.contains_key(field) {
                return Err(ValidationError::MissingField(field));
            }
        }

        Ok(Transaction {
            step: coerce_step(&fields["step"])?,
            amount: coerce_amount(&fields["amount"])?,
            age: coerce_token("age", &fields["age"])?,
            gender: coerce_token("gender", &fields["gender"])?,
            merchant: coerce_token("merchant", &fields["merchant"])?,
            category: coerce_token("category", &fields["category"])?,
        })
    }
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn coerce_step(value: &Value) -> Result<i64, ValidationError> {
    let invalid = ValidationError::InvalidField {
        field: "step",
        expected: "an integer",
    };

    match value {
        Value::Number(n) => {
            if let Some(step) = n.as_i64() {
                Ok(step)
            } else {
                // Fractional steps truncate toward zero
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
                    _ => Err(invalid),
                }
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid),
        _ => Err(invalid),
    }
}

fn coerce_amount(value: &Value) -> Result<f64, ValidationError> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match amount {
        Some(a) if a.is_finite() && a >= 0.0 => Ok(a),
        _ => Err(ValidationError::InvalidField {
            field: "amount",
            expected: "a non-negative number",
        }),
    }
}

fn coerce_token(field: &'static str, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ValidationError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}
