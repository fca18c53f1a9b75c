//! NATS subscriptions for assessment and metadata requests

use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for receiving scoring requests from NATS
pub struct RequestConsumer {
    client: Client,
    assess_subject: String,
    metadata_prefix: String,
    queue_group: String,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(client: Client, assess_subject: &str, metadata_prefix: &str, queue_group: &str) -> Self {
        Self {
            client,
            assess_subject: assess_subject.to_string(),
            metadata_prefix: metadata_prefix.to_string(),
            queue_group: queue_group.to_string(),
        }
    }

    /// Queue-subscribe to the assessment subject, so instances share the load
    pub async fn subscribe_assessments(&self) -> Result<Subscriber> {
        let subscriber = self
            .client
            .queue_subscribe(self.assess_subject.clone(), self.queue_group.clone())
            .await?;
        info!(
            subject = %self.assess_subject,
            queue_group = %self.queue_group,
            "Subscribed to assessment subject"
        );
        Ok(subscriber)
    }

    /// Subscribe to every subject under the metadata prefix
    pub async fn subscribe_metadata(&self) -> Result<Subscriber> {
        let subject = self.metadata_subject();
        let subscriber = self
            .client
            .queue_subscribe(subject.clone(), self.queue_group.clone())
            .await?;
        info!(subject = %subject, "Subscribed to metadata subjects");
        Ok(subscriber)
    }

    /// Wildcard covering the metadata subjects
    pub fn metadata_subject(&self) -> String {
        format!("{}.*", self.metadata_prefix)
    }

    /// Get the assessment subject name
    pub fn subject(&self) -> &str {
        &self.assess_subject
    }
}
