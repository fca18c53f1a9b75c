//! Rule-based fraud scoring
//!
//! Tiered contributions from amount, merchant and category, plus a small
//! random perturbation drawn from a caller-supplied RNG.

use crate::error::ScoringFailure;
use crate::types::transaction::Transaction;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;

/// Amount tiers as (exclusive lower bound, contribution, rule name), highest first.
const AMOUNT_TIERS: [(f64, f64, &str); 3] = [
    (1000.0, 0.40, "amount>1000"),
    (500.0, 0.25, "amount>500"),
    (100.0, 0.10, "amount>100"),
];

const HIGH_RISK_MERCHANT_SCORE: f64 = 0.35;
const MEDIUM_RISK_MERCHANT_SCORE: f64 = 0.20;
const HIGH_RISK_CATEGORY_SCORE: f64 = 0.15;
const MEDIUM_RISK_CATEGORY_SCORE: f64 = 0.08;

fn amount_tier(amount: f64) -> Option<(f64, f64, &'static str)> {
    AMOUNT_TIERS.iter().copied().find(|(bound, _, _)| amount > *bound)
}

/// Default perturbation amplitude
pub const DEFAULT_JITTER: f64 = 0.03;

/// Merchant and category risk sets
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    #[serde(default = "default_high_risk_merchants")]
    pub high_risk_merchants: HashSet<String>,
    #[serde(default = "default_medium_risk_merchants")]
    pub medium_risk_merchants: HashSet<String>,
    #[serde(default = "default_high_risk_categories")]
    pub high_risk_categories: HashSet<String>,
    #[serde(default = "default_medium_risk_categories")]
    pub medium_risk_categories: HashSet<String>,
}

fn to_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_high_risk_merchants() -> HashSet<String> {
    to_set(&["M480139044", "M2080738506", "M749144843"])
}

fn default_medium_risk_merchants() -> HashSet<String> {
    to_set(&["M1823072687", "M1841913607"])
}

fn default_high_risk_categories() -> HashSet<String> {
    to_set(&["es_tech", "es_travel", "es_sportsandtoys"])
}

fn default_medium_risk_categories() -> HashSet<String> {
    to_set(&["es_health", "es_fashion"])
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            high_risk_merchants: default_high_risk_merchants(),
            medium_risk_merchants: default_medium_risk_merchants(),
            high_risk_categories: default_high_risk_categories(),
            medium_risk_categories: default_medium_risk_categories(),
        }
    }
}

/// Deterministic tiered scorer with bounded jitter.
#[derive(Debug, Clone)]
pub struct RuleBasedScorer {
    rules: RuleSet,
    /// Perturbation amplitude; the jitter is drawn from [-jitter, +jitter]
    jitter: f64,
}

impl RuleBasedScorer {
    /// Create a scorer. The amplitude is capped at [`DEFAULT_JITTER`];
    /// a non-finite amplitude disables the perturbation.
    pub fn new(rules: RuleSet, jitter: f64) -> Self {
        let jitter = if jitter.is_finite() {
            jitter.abs().min(DEFAULT_JITTER)
        } else {
            0.0
        };
        Self { rules, jitter }
    }

    /// Scorer with the default rule set and no jitter
    pub fn deterministic() -> Self {
        Self::new(RuleSet::default(), 0.0)
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Sum of the tier contributions, before jitter and clamping.
    pub fn base_score(&self, tx: &Transaction) -> Result<f64, ScoringFailure> {
        if !tx.amount.is_finite() {
            return Err(ScoringFailure::NonFiniteAmount(tx.amount));
        }

        let amount_score = amount_tier(tx.amount)
            .map(|(_, score, _)| score)
            .unwrap_or(0.0);

        let merchant_score = if self.rules.high_risk_merchants.contains(&tx.merchant) {
            HIGH_RISK_MERCHANT_SCORE
        } else if self.rules.medium_risk_merchants.contains(&tx.merchant) {
            MEDIUM_RISK_MERCHANT_SCORE
        } else {
            0.0
        };

        let category_score = if self.rules.high_risk_categories.contains(&tx.category) {
            HIGH_RISK_CATEGORY_SCORE
        } else if self.rules.medium_risk_categories.contains(&tx.category) {
            MEDIUM_RISK_CATEGORY_SCORE
        } else {
            0.0
        };

        Ok(amount_score + merchant_score + category_score)
    }

    /// Score with an explicit perturbation, clamped into [0, 1].
    pub fn score_with_jitter(&self, tx: &Transaction, jitter: f64) -> Result<f64, ScoringFailure> {
        let score = self.base_score(tx)? + jitter;
        if !score.is_finite() {
            return Err(ScoringFailure::NonFiniteScore);
        }
        Ok(score.clamp(0.0, 1.0))
    }

    /// Score with a perturbation drawn from `rng`.
    pub fn score<R: Rng + ?Sized>(&self, tx: &Transaction, rng: &mut R) -> Result<f64, ScoringFailure> {
        let jitter = if self.jitter > 0.0 {
            rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        self.score_with_jitter(tx, jitter)
    }

    /// Names of the rules a transaction trips, for logging
    pub fn triggered_rules(&self, tx: &Transaction) -> Vec<&'static str> {
        let mut triggered = Vec::new();

        if let Some((_, _, name)) = amount_tier(tx.amount) {
            triggered.push(name);
        }

        if self.rules.high_risk_merchants.contains(&tx.merchant) {
            triggered.push("high_risk_merchant");
        } else if self.rules.medium_risk_merchants.contains(&tx.merchant) {
            triggered.push("medium_risk_merchant");
        }

        if self.rules.high_risk_categories.contains(&tx.category) {
            triggered.push("high_risk_category");
        } else if self.rules.medium_risk_categories.contains(&tx.category) {
            triggered.push("medium_risk_category");
        }

        triggered
    }
}

impl Default for RuleBasedScorer {
    fn default() -> Self {
        Self::new(RuleSet::default(), DEFAULT_JITTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_high_risk_everything() {
        let scorer = RuleBasedScorer::deterministic();
        let tx = Transaction::new(1, 1500.0, "M480139044", "es_tech");

        assert!(approx(scorer.score_with_jitter(&tx, 0.0).unwrap(), 0.90));
    }

    #[test]
    fn test_no_risk_signals() {
        let scorer = RuleBasedScorer::deterministic();
        let tx = Transaction::new(1, 50.0, "M348934600", "es_food");

        assert_eq!(scorer.score_with_jitter(&tx, 0.0).unwrap(), 0.0);
        assert!(scorer.triggered_rules(&tx).is_empty());
    }

    #[test]
    fn test_medium_risk_everything() {
        let scorer = RuleBasedScorer::deterministic();
        let tx = Transaction::new(1, 600.0, "M1823072687", "es_health");

        assert!(approx(scorer.score_with_jitter(&tx, 0.0).unwrap(), 0.53));
        assert_eq!(
            scorer.triggered_rules(&tx),
            vec!["amount>500", "medium_risk_merchant", "medium_risk_category"]
        );
    }

    #[test]
    fn test_amount_tiers_are_exclusive() {
        let scorer = RuleBasedScorer::deterministic();
        let score = |amount| {
            scorer
                .base_score(&Transaction::new(1, amount, "none", "none"))
                .unwrap()
        };

        assert_eq!(score(100.0), 0.0);
        assert!(approx(score(100.01), 0.10));
        assert!(approx(score(500.0), 0.10));
        assert!(approx(score(500.01), 0.25));
        assert!(approx(score(1000.0), 0.25));
        assert!(approx(score(1000.01), 0.40));
        assert!(approx(score(1_000_000.0), 0.40));
    }

    #[test]
    fn test_clamped_into_unit_interval() {
        let scorer = RuleBasedScorer::deterministic();
        let low = Transaction::new(1, 0.0, "none", "none");
        let high = Transaction::new(1, 5000.0, "M480139044", "es_tech");

        assert_eq!(scorer.score_with_jitter(&low, -0.03).unwrap(), 0.0);
        assert_eq!(scorer.score_with_jitter(&high, 0.5).unwrap(), 1.0);
    }

    #[test]
    fn test_jitter_is_bounded() {
        let scorer = RuleBasedScorer::default();
        let tx = Transaction::new(1, 600.0, "M1823072687", "es_health");
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let score = scorer.score(&tx, &mut rng).unwrap();
            assert!(score >= 0.53 - DEFAULT_JITTER - 1e-9);
            assert!(score <= 0.53 + DEFAULT_JITTER + 1e-9);
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let scorer = RuleBasedScorer::default();
        let tx = Transaction::new(1, 1500.0, "M749144843", "es_travel");

        let a = scorer.score(&tx, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = scorer.score(&tx, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_jitter_amplitude_is_capped() {
        let tx = Transaction::new(1, 50.0, "M348934600", "es_food");
        let mut rng = StdRng::seed_from_u64(1);

        let unbounded = RuleBasedScorer::new(RuleSet::default(), f64::INFINITY);
        assert_eq!(unbounded.jitter(), 0.0);
        assert_eq!(unbounded.score(&tx, &mut rng).unwrap(), 0.0);

        let wide = RuleBasedScorer::new(RuleSet::default(), 0.5);
        assert_eq!(wide.jitter(), DEFAULT_JITTER);
        for _ in 0..1000 {
            assert!(wide.score(&tx, &mut rng).unwrap() <= DEFAULT_JITTER);
        }

        assert_eq!(RuleBasedScorer::new(RuleSet::default(), f64::NAN).jitter(), 0.0);
        assert_eq!(RuleBasedScorer::new(RuleSet::default(), -0.01).jitter(), 0.01);
    }

    #[test]
    fn test_non_finite_amount_fails() {
        let scorer = RuleBasedScorer::deterministic();
        let tx = Transaction::new(1, f64::NAN, "none", "none");

        assert!(matches!(
            scorer.base_score(&tx),
            Err(ScoringFailure::NonFiniteAmount(_))
        ));
    }
}
