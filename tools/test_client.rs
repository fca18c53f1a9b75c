//! Test Assessment Client
//!
//! Generates assessment requests, sends them to the scorer over NATS and logs
//! the decisions that come back.

use fraud_risk_scorer::catalog::{CATEGORIES, MERCHANTS};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const AGE_BRACKETS: [&str; 8] = ["0", "1", "2", "3", "4", "5", "6", "U"];
const GENDERS: [&str; 4] = ["F", "M", "E", "U"];
const RISKY_MERCHANTS: [&str; 3] = ["M480139044", "M2080738506", "M749144843"];
const RISKY_CATEGORIES: [&str; 3] = ["es_tech", "es_travel", "es_sportsandtoys"];

/// Request structure matching the scorer's expected format
#[derive(Debug, Clone, Serialize)]
struct AssessmentRequest {
    step: i64,
    amount: f64,
    age: String,
    gender: String,
    merchant: String,
    category: String,
}

/// Subset of the reply the client reports on
#[derive(Debug, Deserialize)]
struct AssessmentReply {
    success: bool,
    #[serde(default)]
    transaction_id: String,
    #[serde(default)]
    fraud_probability: f64,
    #[serde(default)]
    action: String,
    #[serde(default)]
    error: Option<String>,
}

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    step: i64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            step: 0,
        }
    }

    /// Generate an everyday purchase
    fn generate_legitimate(&mut self) -> AssessmentRequest {
        self.step += 1;

        AssessmentRequest {
            step: self.step,
            amount: (self.rng.gen_range(1.0..300.0) * 100.0_f64).round() / 100.0,
            age: self.random_choice(&AGE_BRACKETS).to_string(),
            gender: self.random_choice(&GENDERS).to_string(),
            merchant: self.random_choice(&MERCHANTS).to_string(),
            category: self.random_choice(&CATEGORIES).to_string(),
        }
    }

    /// Generate a large purchase at a risky merchant
    fn generate_suspicious(&mut self) -> AssessmentRequest {
        self.step += 1;

        AssessmentRequest {
            step: self.step,
            amount: (self.rng.gen_range(800.0..8000.0) * 100.0_f64).round() / 100.0, // High amount
            age: self.random_choice(&AGE_BRACKETS).to_string(),
            gender: self.random_choice(&GENDERS).to_string(),
            merchant: self.random_choice(&RISKY_MERCHANTS).to_string(),
            category: self.random_choice(&RISKY_CATEGORIES).to_string(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Assessment Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("fraud.assess");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    let (mut approved, mut reviewed, mut blocked, mut errors) = (0u64, 0u64, 0u64, 0u64);

    for i in 0..count {
        let request = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let payload = serde_json::to_vec(&request)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(message) => match serde_json::from_slice::<AssessmentReply>(&message.payload) {
                Ok(reply) if reply.success => {
                    match reply.action.as_str() {
                        "block" => blocked += 1,
                        "review" => reviewed += 1,
                        _ => approved += 1,
                    }
                    info!(
                        transaction_id = %reply.transaction_id,
                        amount = request.amount,
                        merchant = %request.merchant,
                        probability = reply.fraud_probability,
                        action = %reply.action,
                        "Assessment received"
                    );
                }
                Ok(reply) => {
                    errors += 1;
                    warn!(error = ?reply.error, "Scorer rejected request");
                }
                Err(e) => {
                    errors += 1;
                    warn!(error = %e, "Unreadable reply");
                }
            },
            Err(e) => {
                errors += 1;
                warn!(error = %e, "Request failed");
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} requests ({} approved, {} review, {} blocked, {} errors)",
                i + 1,
                count,
                approved,
                reviewed,
                blocked,
                errors
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! {} approved, {} review, {} blocked, {} errors",
        approved, reviewed, blocked, errors
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
