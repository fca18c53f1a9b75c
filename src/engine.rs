//! Fraud assessment engine
//!
//! Normalizes a request, scores it with the classifier when one is configured
//! (rules otherwise), classifies the probability and assembles the result.

use crate::config::AppConfig;
use crate::decision;
use crate::error::ValidationError;
use crate::feature_normalizer::FeatureNormalizer;
use crate::models::inference::{FraudClassifier, ModelScorer};
use crate::models::rules::RuleBasedScorer;
use crate::types::assessment::{FraudAssessment, ScoreSource};
use crate::types::transaction::Transaction;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Version tag reported with every assessment
pub const MODEL_VERSION: &str = "1.0";

/// Probability reported when every scorer failed
pub const FAIL_OPEN_PROBABILITY: f64 = 0.1;

/// Probability together with where it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreOutcome {
    pub probability: f64,
    pub source: ScoreSource,
}

impl ScoreOutcome {
    /// Anything other than a classifier score is degraded
    pub fn degraded(&self) -> bool {
        self.source != ScoreSource::Model
    }
}

/// Generates transaction identifiers that stay unique within a second.
///
/// Format: `TXN<yyyymmddHHMMSS>-<sequence>-<random hex>`.
#[derive(Debug, Default)]
pub struct TransactionIdGenerator {
    sequence: AtomicU64,
}

impl TransactionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self, at: DateTime<Utc>) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("TXN{}-{:06}-{}", at.format("%Y%m%d%H%M%S"), seq, &suffix[..8])
    }
}

/// Stateless fraud assessment engine, shared across request tasks.
pub struct FraudEngine {
    normalizer: FeatureNormalizer,
    rules: RuleBasedScorer,
    model: ModelScorer,
    ids: TransactionIdGenerator,
    model_version: String,
}

impl FraudEngine {
    /// Engine with the given rule scorer and no classifier
    pub fn new(rules: RuleBasedScorer) -> Self {
        Self {
            normalizer: FeatureNormalizer::new(),
            rules,
            model: ModelScorer::unavailable(),
            ids: TransactionIdGenerator::new(),
            model_version: MODEL_VERSION.to_string(),
        }
    }

    /// Create an engine from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let engine = Self::new(RuleBasedScorer::new(
            config.scoring.rules.clone(),
            config.scoring.jitter,
        ));
        engine.with_timeout(Duration::from_millis(config.model.timeout_ms))
    }

    /// Attach a trained classifier; its probabilities supersede the rules
    pub fn with_classifier(mut self, classifier: Arc<dyn FraudClassifier>) -> Self {
        self.model = ModelScorer::new(Some(classifier), self.model.timeout());
        self
    }

    /// Set the classifier inference deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.model = ModelScorer::new(self.model.classifier(), timeout);
        self
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn rules(&self) -> &RuleBasedScorer {
        &self.rules
    }

    /// Classifier calls that outlived their deadline since startup
    pub fn abandoned_inferences(&self) -> u64 {
        self.model.abandoned_inferences()
    }

    /// Assess a raw request with a fresh entropy-seeded RNG
    pub async fn assess(&self, raw: &Value) -> Result<FraudAssessment, ValidationError> {
        let mut rng = StdRng::from_entropy();
        self.assess_with_rng(raw, &mut rng).await
    }

    /// Assess a raw request, drawing the rule jitter from `rng`
    pub async fn assess_with_rng<R: Rng + Send>(
        &self,
        raw: &Value,
        rng: &mut R,
    ) -> Result<FraudAssessment, ValidationError> {
        let tx = self.normalizer.normalize_value(raw)?;
        let outcome = self.score(&tx, rng).await;
        Ok(self.assemble(outcome, Utc::now()))
    }

    /// Score a normalized transaction. Never fails: classifier problems fall
    /// back to the rules, rule problems fail open.
    pub async fn score<R: Rng + Send>(&self, tx: &Transaction, rng: &mut R) -> ScoreOutcome {
        if self.model.is_loaded() {
            match self.model.predict(tx).await {
                Ok(probability) => {
                    return ScoreOutcome {
                        probability,
                        source: ScoreSource::Model,
                    }
                }
                Err(e) => {
                    warn!(
                        model = self.model.model_name().unwrap_or("unknown"),
                        error = %e,
                        "Classifier inference failed, falling back to rules"
                    );
                }
            }
        }

        match self.rules.score(tx, rng) {
            Ok(probability) => {
                debug!(
                    probability = probability,
                    triggered = ?self.rules.triggered_rules(tx),
                    "Rule-based score computed"
                );
                ScoreOutcome {
                    probability,
                    source: ScoreSource::Rules,
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = FAIL_OPEN_PROBABILITY,
                    "Rule-based scoring failed, failing open"
                );
                ScoreOutcome {
                    probability: FAIL_OPEN_PROBABILITY,
                    source: ScoreSource::FailOpen,
                }
            }
        }
    }

    /// Turn a score into a complete assessment
    pub fn assemble(&self, outcome: ScoreOutcome, at: DateTime<Utc>) -> FraudAssessment {
        let probability = outcome.probability.clamp(0.0, 1.0);
        let decision = decision::classify(probability);

        FraudAssessment {
            transaction_id: self.ids.next_id(at),
            probability,
            risk_level: decision.risk_level,
            action: decision.action,
            confidence: decision::confidence(probability),
            recommendation: decision.recommendation.to_string(),
            timestamp: at,
            model_version: self.model_version.clone(),
            score_source: outcome.source,
            degraded: outcome.degraded(),
        }
    }
}

impl Default for FraudEngine {
    fn default() -> Self {
        Self::new(RuleBasedScorer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inference::testing::{FailingClassifier, FixedClassifier, SlowClassifier};
    use crate::types::assessment::{Action, RiskLevel};
    use serde_json::json;
    use std::collections::HashSet;

    fn deterministic_engine() -> FraudEngine {
        FraudEngine::new(RuleBasedScorer::deterministic())
    }

    fn request(amount: f64, merchant: &str, category: &str) -> Value {
        json!({
            "step": 1,
            "amount": amount,
            "age": "4",
            "gender": "M",
            "merchant": merchant,
            "category": category
        })
    }

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    #[test]
    fn test_from_config() {
        let mut config = AppConfig::default();
        config.scoring.jitter = 0.01;
        config.model.timeout_ms = 40;

        let engine = FraudEngine::from_config(&config);
        assert_eq!(engine.rules().jitter(), 0.01);
        assert!(!engine.model_loaded());
        assert_eq!(engine.abandoned_inferences(), 0);
    }

    #[tokio::test]
    async fn test_high_risk_blocks() {
        let engine = deterministic_engine();
        let assessment = engine
            .assess_with_rng(&request(1500.0, "M480139044", "es_tech"), &mut seeded())
            .await
            .unwrap();

        assert!((assessment.probability - 0.90).abs() < 1e-9);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.action, Action::Block);
        assert_eq!(assessment.score_source, ScoreSource::Rules);
        assert!(assessment.degraded);
    }

    #[tokio::test]
    async fn test_low_risk_approves() {
        let engine = deterministic_engine();
        let assessment = engine
            .assess_with_rng(&request(50.0, "M348934600", "es_food"), &mut seeded())
            .await
            .unwrap();

        assert_eq!(assessment.probability, 0.0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.action, Action::Approve);
        assert_eq!(assessment.confidence, decision::MIN_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_medium_risk_reviews() {
        let engine = deterministic_engine();
        let assessment = engine
            .assess_with_rng(&request(600.0, "M1823072687", "es_health"), &mut seeded())
            .await
            .unwrap();

        assert!((assessment.probability - 0.53).abs() < 1e-9);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(assessment.action, Action::Review);
        assert_eq!(assessment.to_response().fraud_probability, 53.0);
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let engine = FraudEngine::default();
        let mut raw = request(600.0, "M1823072687", "es_health");
        raw.as_object_mut().unwrap().remove("category");

        let err = engine.assess(&raw).await.unwrap_err();
        assert_eq!(err, ValidationError::MissingField("category"));
    }

    #[tokio::test]
    async fn test_seeded_assessments_reproduce() {
        let engine = FraudEngine::default();
        let raw = request(750.0, "M2080738506", "es_fashion");

        let a = engine
            .assess_with_rng(&raw, &mut StdRng::seed_from_u64(99))
            .await
            .unwrap();
        let b = engine
            .assess_with_rng(&raw, &mut StdRng::seed_from_u64(99))
            .await
            .unwrap();

        assert_eq!(a.probability, b.probability);
        assert_ne!(a.transaction_id, b.transaction_id);
    }

    #[tokio::test]
    async fn test_bounds_hold_for_random_requests() {
        let engine = FraudEngine::default();
        let mut rng = seeded();
        let merchants = ["M480139044", "M1823072687", "M348934600"];
        let categories = ["es_tech", "es_health", "es_food"];

        for _ in 0..200 {
            let amount = rng.gen_range(0.0..5000.0);
            let merchant = merchants[rng.gen_range(0..merchants.len())];
            let category = categories[rng.gen_range(0..categories.len())];
            let assessment = engine
                .assess_with_rng(&request(amount, merchant, category), &mut rng)
                .await
                .unwrap();

            assert!((0.0..=1.0).contains(&assessment.probability));
            assert!((0.75..=0.98).contains(&assessment.confidence));
        }
    }

    #[tokio::test]
    async fn test_classifier_supersedes_rules() {
        let engine = deterministic_engine().with_classifier(Arc::new(FixedClassifier(0.85)));
        assert!(engine.model_loaded());

        let assessment = engine
            .assess_with_rng(&request(50.0, "M348934600", "es_food"), &mut seeded())
            .await
            .unwrap();

        assert_eq!(assessment.probability, 0.85);
        assert_eq!(assessment.score_source, ScoreSource::Model);
        assert!(!assessment.degraded);
        assert_eq!(assessment.action, Action::Block);
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back() {
        let engine = deterministic_engine().with_classifier(Arc::new(FailingClassifier));

        let assessment = engine
            .assess_with_rng(&request(600.0, "M1823072687", "es_health"), &mut seeded())
            .await
            .unwrap();

        assert!((assessment.probability - 0.53).abs() < 1e-9);
        assert_eq!(assessment.score_source, ScoreSource::Rules);
        assert!(assessment.degraded);
    }

    #[tokio::test]
    async fn test_classifier_timeout_falls_back() {
        let engine = deterministic_engine()
            .with_classifier(Arc::new(SlowClassifier(Duration::from_millis(300))))
            .with_timeout(Duration::from_millis(20));

        let assessment = engine
            .assess_with_rng(&request(1500.0, "M480139044", "es_tech"), &mut seeded())
            .await
            .unwrap();

        assert!((assessment.probability - 0.90).abs() < 1e-9);
        assert_eq!(assessment.score_source, ScoreSource::Rules);
        assert_eq!(engine.abandoned_inferences(), 1);
    }

    #[tokio::test]
    async fn test_rule_failure_fails_open() {
        let engine = deterministic_engine();
        let tx = Transaction::new(1, f64::INFINITY, "M480139044", "es_tech");

        let outcome = engine.score(&tx, &mut seeded()).await;
        assert_eq!(outcome.probability, FAIL_OPEN_PROBABILITY);
        assert_eq!(outcome.source, ScoreSource::FailOpen);
        assert!(outcome.degraded());

        let assessment = engine.assemble(outcome, Utc::now());
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert!(assessment.degraded);
    }

    #[tokio::test]
    async fn test_concurrent_identical_requests_get_distinct_ids() {
        let engine = Arc::new(FraudEngine::default());
        let raw = request(200.0, "M348934600", "es_food");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let engine = engine.clone();
                let raw = raw.clone();
                tokio::spawn(async move { engine.assess(&raw).await.unwrap().transaction_id })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(ids.len(), 32);
    }

    #[test]
    fn test_id_format() {
        let ids = TransactionIdGenerator::new();
        let at = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let first = ids.next_id(at);
        let second = ids.next_id(at);

        assert!(first.starts_with("TXN20240115103000-000001-"));
        assert!(second.starts_with("TXN20240115103000-000002-"));
        assert_eq!(first.len(), "TXN20240115103000-000001-".len() + 8);
    }
}
