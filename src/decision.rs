//! Probability to decision: risk tier, action, recommendation and confidence

use crate::types::assessment::{Action, RiskLevel};

/// Probability of maximal classification uncertainty
pub const INDIFFERENCE_POINT: f64 = 0.5;
pub const MIN_CONFIDENCE: f64 = 0.75;
pub const MAX_CONFIDENCE: f64 = 0.98;

/// Risk tier with its consequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub risk_level: RiskLevel,
    pub action: Action,
    pub recommendation: &'static str,
}

/// Classify a fraud probability. Total over all inputs; NaN lands in Low.
pub fn classify(probability: f64) -> Decision {
    let risk_level = RiskLevel::from_probability(probability);
    Decision {
        risk_level,
        action: risk_level.action(),
        recommendation: risk_level.recommendation(),
    }
}

/// Confidence as `1 - |p - 0.5|`, clamped to [0.75, 0.98].
///
/// Symmetric about the indifference point: `confidence(p) == confidence(1 - p)`.
pub fn confidence(probability: f64) -> f64 {
    (1.0 - (probability - INDIFFERENCE_POINT).abs()).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
