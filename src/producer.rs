//! NATS publisher for replies and block alerts

use crate::types::assessment::FraudAssessment;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publisher for assessment replies and block alerts
#[derive(Clone)]
pub struct ReplyPublisher {
    client: Client,
    alert_subject: String,
}

impl ReplyPublisher {
    /// Create a new publisher
    pub fn new(client: Client, alert_subject: &str) -> Self {
        Self {
            client,
            alert_subject: alert_subject.to_string(),
        }
    }

    /// Send an encoded reply to the requester
    pub async fn reply(&self, reply_to: Subject, payload: Vec<u8>) -> Result<()> {
        self.client.publish(reply_to, payload.into()).await?;
        Ok(())
    }

    /// Publish a blocked assessment to the alert subject
    pub async fn publish_alert(&self, assessment: &FraudAssessment) -> Result<()> {
        let payload = serde_json::to_vec(&assessment.to_response())?;

        self.client
            .publish(self.alert_subject.clone(), payload.into())
            .await?;

        debug!(
            transaction_id = %assessment.transaction_id,
            risk_score = assessment.probability,
            "Published block alert"
        );

        Ok(())
    }

    /// Get the alert subject name
    pub fn alert_subject(&self) -> &str {
        &self.alert_subject
    }
}
