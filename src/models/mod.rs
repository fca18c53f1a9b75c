//! Fraud scorers: rule-based and optional classifier

pub mod inference;
pub mod rules;

pub use inference::{FraudClassifier, ModelScorer};
pub use rules::{RuleBasedScorer, RuleSet};
