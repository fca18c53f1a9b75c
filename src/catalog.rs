//! Static reference data served alongside assessments

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Merchant identifiers known to the scorer
pub const MERCHANTS: [&str; 8] = [
    "M348934600",
    "M1823072687",
    "M480139044",
    "M980657600",
    "M2080738506",
    "M1841913607",
    "M749144843",
    "M2018384601",
];

/// Transaction category identifiers
pub const CATEGORIES: [&str; 16] = [
    "es_transportation",
    "es_sportsandtoys",
    "es_health",
    "es_fashion",
    "es_bars",
    "es_hyper",
    "es_food",
    "es_home",
    "es_contents",
    "es_tech",
    "es_travel",
    "es_wellnessandbeauty",
    "es_otherservices",
    "es_hotelservices",
    "es_barsandrestaurants",
    "es_leisure",
];

#[derive(Debug, Clone, Serialize)]
pub struct MerchantList {
    pub merchants: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryList {
    pub categories: Vec<&'static str>,
}

/// Offline evaluation figures of the deployed model, in percent
#[derive(Debug, Clone, Serialize)]
pub struct ModelPerformance {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    pub pr_auc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessMetrics {
    pub total_transactions: u64,
    pub fraud_detected: u64,
    pub false_alarms: u64,
    pub fraud_detection_rate: f64,
    pub false_alarm_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub algorithm: &'static str,
    pub features_count: u32,
    pub training_data_size: u64,
    pub model_version: &'static str,
    pub last_updated: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatistics {
    pub model_performance: ModelPerformance,
    pub business_metrics: BusinessMetrics,
    pub model_info: ModelInfo,
}

/// Liveness report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub model_loaded: bool,
    pub version: String,
}

pub fn merchants() -> MerchantList {
    MerchantList {
        merchants: MERCHANTS.to_vec(),
    }
}

pub fn categories() -> CategoryList {
    CategoryList {
        categories: CATEGORIES.to_vec(),
    }
}

pub fn model_statistics() -> ModelStatistics {
    ModelStatistics {
        model_performance: ModelPerformance {
            accuracy: 99.4,
            precision: 66.8,
            recall: 94.9,
            f1_score: 78.4,
            roc_auc: 99.9,
            pr_auc: 91.7,
        },
        business_metrics: BusinessMetrics {
            total_transactions: 118_929,
            fraud_detected: 1_367,
            false_alarms: 679,
            fraud_detection_rate: 94.9,
            false_alarm_rate: 0.6,
        },
        model_info: ModelInfo {
            algorithm: "RandomForest",
            features_count: 21,
            training_data_size: 475_714,
            model_version: crate::engine::MODEL_VERSION,
            last_updated: "2024-01-15",
        },
    }
}

pub fn health(model_loaded: bool, version: &str) -> HealthReport {
    HealthReport {
        status: "healthy",
        timestamp: Utc::now(),
        model_loaded,
        version: version.to_string(),
    }
}
