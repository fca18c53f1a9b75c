//! Optional classifier inference with a bounded deadline

use crate::error::ModelInferenceFailure;
use crate::types::transaction::Transaction;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default inference deadline
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_millis(250);

/// A trained fraud classifier.
///
/// How the artifact is loaded is up to the implementor; the scorer only needs
/// a probability for a normalized transaction. Implementations are called
/// concurrently from the blocking thread pool.
pub trait FraudClassifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Probability that the transaction is fraudulent
    fn predict_proba(&self, tx: &Transaction) -> Result<f64, ModelInferenceFailure>;
}

/// Runs the configured classifier, if any, under a deadline.
#[derive(Clone)]
pub struct ModelScorer {
    classifier: Option<Arc<dyn FraudClassifier>>,
    timeout: Duration,
    /// Calls left running on the blocking pool after their deadline
    abandoned: Arc<AtomicU64>,
}

impl ModelScorer {
    pub fn new(classifier: Option<Arc<dyn FraudClassifier>>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
            abandoned: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Scorer with no classifier; every call reports `Unavailable`
    pub fn unavailable() -> Self {
        Self::new(None, DEFAULT_INFERENCE_TIMEOUT)
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn classifier(&self) -> Option<Arc<dyn FraudClassifier>> {
        self.classifier.clone()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.classifier.as_deref().map(|c| c.name())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of inferences that outlived their deadline
    pub fn abandoned_inferences(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Run inference on the blocking pool.
    ///
    /// The returned probability is clamped into [0, 1]. On timeout the
    /// classifier call is abandoned, not cancelled.
    pub async fn predict(&self, tx: &Transaction) -> Result<f64, ModelInferenceFailure> {
        let classifier = self
            .classifier
            .clone()
            .ok_or(ModelInferenceFailure::Unavailable)?;

        let features = tx.clone();
        let task = tokio::task::spawn_blocking(move || classifier.predict_proba(&features));

        let probability = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                let abandoned = self.abandoned.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    model = self.model_name().unwrap_or("unknown"),
                    timeout_ms = self.timeout.as_millis() as u64,
                    abandoned,
                    "Classifier missed its deadline, blocking call left running"
                );
                return Err(ModelInferenceFailure::Timeout(self.timeout));
            }
            Ok(Err(join_error)) => {
                return Err(ModelInferenceFailure::Panicked(join_error.to_string()))
            }
            Ok(Ok(result)) => result?,
        };

        if !probability.is_finite() {
            return Err(ModelInferenceFailure::InvalidOutput(probability));
        }

        debug!(
            model = self.model_name().unwrap_or("unknown"),
            prob = probability,
            "Classifier inference complete"
        );

        Ok(probability.clamp(0.0, 1.0))
    }
}

impl Default for ModelScorer {
    fn default() -> Self {
        Self::unavailable()
    }
}
