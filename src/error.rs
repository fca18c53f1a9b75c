//! Error types for the scoring engine

use std::time::Duration;
use thiserror::Error;

/// Rejection of a request before any scoring happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field {field}: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Request body must be a JSON object")]
    NotAnObject,
}

impl ValidationError {
    /// Name of the offending field, if the error is tied to one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField(field) => Some(field),
            ValidationError::InvalidField { field, .. } => Some(field),
            ValidationError::NotAnObject => None,
        }
    }
}

/// Unexpected failure inside the rule-based scorer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringFailure {
    #[error("amount is not a finite number: {0}")]
    NonFiniteAmount(f64),

    #[error("score is not a finite number")]
    NonFiniteScore,
}

/// Failure of the optional classifier. Always converted into a rule-based fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelInferenceFailure {
    #[error("no classifier configured")]
    Unavailable,

    #[error("classifier failed: {0}")]
    Failed(String),

    #[error("classifier returned a non-finite probability: {0}")]
    InvalidOutput(f64),

    #[error("classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("classifier task panicked: {0}")]
    Panicked(String),
}
