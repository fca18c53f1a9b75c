//! Fraud assessment data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lower bound of the Medium tier
pub const REVIEW_THRESHOLD: f64 = 0.3;
/// Lower bound of the High tier
pub const BLOCK_THRESHOLD: f64 = 0.8;

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Determine risk level from a fraud probability.
    ///
    /// Each threshold belongs to the tier above it.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= BLOCK_THRESHOLD {
            RiskLevel::High
        } else if probability >= REVIEW_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Operational consequence of this tier
    pub fn action(self) -> Action {
        match self {
            RiskLevel::High => Action::Block,
            RiskLevel::Medium => Action::Review,
            RiskLevel::Low => Action::Approve,
        }
    }

    /// Operator-facing recommendation text
    pub fn recommendation(self) -> &'static str {
        match self {
            RiskLevel::High => {
                "BLOCK TRANSACTION - High fraud risk detected. Immediate investigation required."
            }
            RiskLevel::Medium => "REVIEW REQUIRED - Medium fraud risk. Queue for manual review.",
            RiskLevel::Low => "APPROVE - Low fraud risk. Transaction can proceed normally.",
        }
    }

    /// Dashboard colour for this tier
    pub fn color(self) -> &'static str {
        match self {
            RiskLevel::High => "#dc3545",
            RiskLevel::Medium => "#ffc107",
            RiskLevel::Low => "#28a745",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        }
    }
}

/// Decision taken on a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Approve,
    Review,
    Block,
}

/// Which scorer produced the probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// The configured classifier
    Model,
    /// The rule-based fallback
    Rules,
    /// Both scorers failed; fixed low-risk probability
    FailOpen,
}

/// Complete result of assessing one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    /// Unique assessment identifier
    pub transaction_id: String,

    /// Fraud probability (0.0 - 1.0)
    pub probability: f64,

    /// Risk tier derived from the probability
    pub risk_level: RiskLevel,

    /// Action derived from the risk tier
    pub action: Action,

    /// Confidence (0.75 - 0.98)
    pub confidence: f64,

    /// Recommendation text for the risk tier
    pub recommendation: String,

    /// Assessment timestamp
    pub timestamp: DateTime<Utc>,

    /// Version tag of the scoring model
    pub model_version: String,

    /// Scorer that produced the probability
    pub score_source: ScoreSource,

    /// True when the classifier did not produce the probability
    pub degraded: bool,
}

impl FraudAssessment {
    /// Wire representation, with probability and confidence in percent
    pub fn to_response(&self) -> AssessmentResponse {
        AssessmentResponse {
            success: true,
            transaction_id: self.transaction_id.clone(),
            fraud_probability: to_percent(self.probability),
            risk_level: self.risk_level,
            risk_color: self.risk_level.color().to_string(),
            confidence_score: to_percent(self.confidence),
            recommendation: self.recommendation.clone(),
            action: self.action,
            timestamp: self.timestamp,
            model_version: self.model_version.clone(),
        }
    }
}

/// Successful assessment as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub success: bool,
    pub transaction_id: String,
    pub fraud_probability: f64,
    pub risk_level: RiskLevel,
    pub risk_color: String,
    pub confidence_score: f64,
    pub recommendation: String,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
    pub model_version: String,
}

/// Error payload returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }

    /// Generic payload for failures the caller cannot act on
    pub fn internal() -> Self {
        Self::new("Internal server error during prediction")
    }
}

/// Fraction to percentage, rounded to one decimal place
pub fn to_percent(value: f64) -> f64 {
    (value * 1000.0).round() / 10.0
}
