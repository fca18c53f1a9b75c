//! Request handling: raw message payloads in, JSON replies out

use crate::catalog;
use crate::engine::FraudEngine;
use crate::error::ValidationError;
use crate::types::assessment::{ErrorResponse, FraudAssessment};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

/// Reply used when even the error payload cannot be encoded
const INTERNAL_ERROR_BODY: &[u8] =
    br#"{"success":false,"error":"Internal server error during prediction"}"#;

/// What happened to an assessment request
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Assessed(FraudAssessment),
    Rejected(ValidationError),
    Failed,
}

/// Outcome plus the encoded reply
#[derive(Debug, Clone)]
pub struct Reply {
    pub outcome: RequestOutcome,
    pub payload: Vec<u8>,
}

/// Metadata tables available on `<prefix>.<name>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataQuery {
    Merchants,
    Categories,
    Stats,
    Health,
}

impl MetadataQuery {
    /// Parse `<prefix>.<name>` into a query
    pub fn from_subject(prefix: &str, subject: &str) -> Option<Self> {
        let name = subject.strip_prefix(prefix)?.strip_prefix('.')?;
        match name {
            "merchants" => Some(MetadataQuery::Merchants),
            "categories" => Some(MetadataQuery::Categories),
            "stats" => Some(MetadataQuery::Stats),
            "health" => Some(MetadataQuery::Health),
            _ => None,
        }
    }
}

/// Turns request payloads into replies using a shared engine
#[derive(Clone)]
pub struct RequestHandler {
    engine: Arc<FraudEngine>,
    metadata_prefix: String,
}

impl RequestHandler {
    pub fn new(engine: Arc<FraudEngine>, metadata_prefix: &str) -> Self {
        Self {
            engine,
            metadata_prefix: metadata_prefix.to_string(),
        }
    }

    /// Assess one request payload
    pub async fn handle_assessment(&self, payload: &[u8]) -> Reply {
        let raw: Value = match serde_json::from_slice(payload) {
            Ok(raw) => raw,
            Err(_) => return self.reject(ValidationError::NotAnObject),
        };

        match self.engine.assess(&raw).await {
            Ok(assessment) => match serde_json::to_vec(&assessment.to_response()) {
                Ok(payload) => Reply {
                    outcome: RequestOutcome::Assessed(assessment),
                    payload,
                },
                Err(e) => {
                    error!(
                        transaction_id = %assessment.transaction_id,
                        error = %e,
                        "Failed to encode assessment"
                    );
                    Reply {
                        outcome: RequestOutcome::Failed,
                        payload: encode(&ErrorResponse::internal()),
                    }
                }
            },
            Err(e) => self.reject(e),
        }
    }

    fn reject(&self, err: ValidationError) -> Reply {
        Reply {
            payload: encode(&ErrorResponse::new(err.to_string())),
            outcome: RequestOutcome::Rejected(err),
        }
    }

    /// Answer a metadata request addressed to `subject`
    pub fn handle_metadata(&self, subject: &str) -> Vec<u8> {
        match MetadataQuery::from_subject(&self.metadata_prefix, subject) {
            Some(MetadataQuery::Merchants) => encode(&catalog::merchants()),
            Some(MetadataQuery::Categories) => encode(&catalog::categories()),
            Some(MetadataQuery::Stats) => encode(&catalog::model_statistics()),
            Some(MetadataQuery::Health) => encode(&catalog::health(
                self.engine.model_loaded(),
                self.engine.model_version(),
            )),
            None => encode(&json!({ "error": "Endpoint not found" })),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_else(|e| {
        error!(error = %e, "Failed to encode reply");
        INTERNAL_ERROR_BODY.to_vec()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rules::RuleBasedScorer;

    fn handler() -> RequestHandler {
        let engine = FraudEngine::new(RuleBasedScorer::deterministic());
        RequestHandler::new(Arc::new(engine), "fraud.meta")
    }

    fn parse(payload: &[u8]) -> Value {
        serde_json::from_slice(payload).unwrap()
    }

    #[tokio::test]
    async fn test_assessment_reply() {
        let request = br#"{"step": 1, "amount": 1500, "age": "2", "gender": "F",
            "merchant": "M480139044", "category": "es_tech"}"#;

        let reply = handler().handle_assessment(request).await;
        assert!(matches!(reply.outcome, RequestOutcome::Assessed(_)));

        let json = parse(&reply.payload);
        assert_eq!(json["success"], true);
        assert_eq!(json["fraud_probability"], 90.0);
        assert_eq!(json["risk_level"], "High");
        assert_eq!(json["action"], "block");
        assert_eq!(json["confidence_score"], 75.0);
        assert!(json["transaction_id"].as_str().unwrap().starts_with("TXN"));
    }

    #[tokio::test]
    async fn test_missing_field_reply() {
        let request = br#"{"step": 1, "amount": 10, "age": "2", "gender": "F",
            "merchant": "M480139044"}"#;

        let reply = handler().handle_assessment(request).await;
        assert!(matches!(
            reply.outcome,
            RequestOutcome::Rejected(ValidationError::MissingField("category"))
        ));

        let json = parse(&reply.payload);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Missing required field: category");
    }

    #[tokio::test]
    async fn test_garbage_payload_rejected() {
        let reply = handler().handle_assessment(b"not json").await;
        assert!(matches!(
            reply.outcome,
            RequestOutcome::Rejected(ValidationError::NotAnObject)
        ));
    }

    #[test]
    fn test_metadata_subjects() {
        assert_eq!(
            MetadataQuery::from_subject("fraud.meta", "fraud.meta.stats"),
            Some(MetadataQuery::Stats)
        );
        assert_eq!(MetadataQuery::from_subject("fraud.meta", "fraud.metastats"), None);
        assert_eq!(MetadataQuery::from_subject("fraud.meta", "other.stats"), None);

        let handler = handler();
        let merchants = parse(&handler.handle_metadata("fraud.meta.merchants"));
        assert_eq!(merchants["merchants"].as_array().unwrap().len(), 8);

        let categories = parse(&handler.handle_metadata("fraud.meta.categories"));
        assert_eq!(categories["categories"].as_array().unwrap().len(), 16);

        let health = parse(&handler.handle_metadata("fraud.meta.health"));
        assert_eq!(health["model_loaded"], false);

        let unknown = parse(&handler.handle_metadata("fraud.meta.nope"));
        assert_eq!(unknown["error"], "Endpoint not found");
    }
}
