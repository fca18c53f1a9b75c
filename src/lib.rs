//! Fraud Risk Scorer Library
//!
//! Turns a single transaction description into a fraud probability and an
//! approve / review / block decision with a confidence measure.

pub mod catalog;
pub mod config;
pub mod consumer;
pub mod decision;
pub mod engine;
pub mod error;
pub mod feature_normalizer;
pub mod handler;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod types;
pub mod workers;

pub use config::AppConfig;
pub use engine::FraudEngine;
pub use error::{ModelInferenceFailure, ScoringFailure, ValidationError};
pub use feature_normalizer::FeatureNormalizer;
pub use handler::RequestHandler;
pub use models::{FraudClassifier, RuleBasedScorer};
pub use types::{assessment::FraudAssessment, transaction::Transaction};
