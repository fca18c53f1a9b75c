//! Type definitions for the fraud risk scorer

pub mod assessment;
pub mod transaction;

pub use assessment::{
    Action, AssessmentResponse, ErrorResponse, FraudAssessment, RiskLevel, ScoreSource,
};
pub use transaction::Transaction;
