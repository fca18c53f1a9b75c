//! Fraud Risk Scorer - Main Entry Point
//!
//! Answers assessment and metadata requests over NATS and publishes block alerts.
//! Requests are scored concurrently, bounded by the configured worker count.

use anyhow::{Context, Result};
use fraud_risk_scorer::{
    config::AppConfig,
    consumer::RequestConsumer,
    engine::FraudEngine,
    handler::{RequestHandler, RequestOutcome},
    metrics::{MetricsReporter, PipelineMetrics},
    producer::ReplyPublisher,
    types::Action,
    workers::WorkerPool,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(
        format!("fraud_risk_scorer={}", config.logging.level)
            .parse()
            .context("Invalid log level")?,
    );

    if config.logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config)?;

    info!("Starting Fraud Risk Scorer");
    let pool = WorkerPool::new(config.pipeline.workers);

    let metrics = Arc::new(PipelineMetrics::new());

    let engine = Arc::new(FraudEngine::from_config(&config));
    info!(
        jitter = engine.rules().jitter(),
        model_timeout_ms = config.model.timeout_ms,
        workers = pool.size(),
        "Configuration loaded"
    );
    if !engine.model_loaded() {
        warn!("No classifier configured, scoring with business rules only");
    }
    let handler = RequestHandler::new(engine.clone(), &config.nats.metadata_prefix);

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(
        client.clone(),
        &config.nats.assess_subject,
        &config.nats.metadata_prefix,
        &config.nats.queue_group,
    );
    let publisher = ReplyPublisher::new(client.clone(), &config.nats.alert_subject);
    info!("Publishing block alerts to: {}", publisher.alert_subject());

    let metrics_clone = metrics.clone();
    let interval = config.pipeline.report_interval_secs;
    tokio::spawn(async move {
        MetricsReporter::new(metrics_clone, interval).start().await;
    });

    // Metadata answers are static and cheap; serve them inline on their own task
    let mut metadata = consumer.subscribe_metadata().await?;
    let metadata_handler = handler.clone();
    let metadata_publisher = publisher.clone();
    tokio::spawn(async move {
        while let Some(message) = metadata.next().await {
            let Some(reply_to) = message.reply else {
                continue;
            };
            let payload = metadata_handler.handle_metadata(message.subject.as_str());
            if let Err(e) = metadata_publisher.reply(reply_to, payload).await {
                error!(subject = %message.subject, error = %e, "Failed to answer metadata request");
            }
        }
    });

    let mut subscription = consumer.subscribe_assessments().await?;
    info!(subject = consumer.subject(), "Waiting for assessment requests");

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        };

        let permit = pool.acquire().await?;

        let handler = handler.clone();
        let publisher = publisher.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();
            let reply = handler.handle_assessment(&message.payload).await;

            match &reply.outcome {
                RequestOutcome::Assessed(assessment) => {
                    let processing_time = start_time.elapsed();
                    metrics.record_assessment(processing_time, assessment);

                    if assessment.degraded {
                        debug!(
                            transaction_id = %assessment.transaction_id,
                            source = ?assessment.score_source,
                            "Assessment produced in degraded mode"
                        );
                    }

                    if assessment.action == Action::Block {
                        if let Err(e) = publisher.publish_alert(assessment).await {
                            error!(
                                transaction_id = %assessment.transaction_id,
                                error = %e,
                                "Failed to publish block alert"
                            );
                        } else {
                            info!(
                                transaction_id = %assessment.transaction_id,
                                risk_score = assessment.probability,
                                processing_time_us = processing_time.as_micros(),
                                "Transaction blocked"
                            );
                        }
                    } else {
                        debug!(
                            transaction_id = %assessment.transaction_id,
                            risk_score = assessment.probability,
                            risk_level = ?assessment.risk_level,
                            processing_time_us = processing_time.as_micros(),
                            "Transaction assessed"
                        );
                    }
                }
                RequestOutcome::Rejected(e) => {
                    metrics.record_rejection();
                    warn!(error = %e, "Rejected assessment request");
                }
                RequestOutcome::Failed => {
                    metrics.record_failure();
                }
            }

            if let Some(reply_to) = message.reply {
                if let Err(e) = publisher.reply(reply_to, reply.payload).await {
                    error!(error = %e, "Failed to send assessment reply");
                }
            }

            drop(permit);
        });
    }

    info!(in_flight = pool.in_flight(), "Scorer shutting down, waiting for in-flight requests...");
    pool.drain().await?;

    let abandoned = engine.abandoned_inferences();
    if abandoned > 0 {
        warn!(abandoned, "Classifier calls abandoned after their deadline");
    }
    metrics.print_summary();

    Ok(())
}
