//! Transaction data structures for fraud risk scoring

use serde::{Deserialize, Serialize};

/// Field names every assessment request must carry, in validation order.
pub const REQUIRED_FIELDS: [&str; 6] = ["step", "amount", "age", "gender", "merchant", "category"];

/// A normalized transaction, ready for scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sequence / time index of the transaction
    pub step: i64,

    /// Transaction amount in the account currency
    pub amount: f64,

    /// Customer age bracket token (e.g. "3", "U")
    pub age: String,

    /// Customer gender token (e.g. "F", "M", "E", "U")
    pub gender: String,

    /// Merchant identifier (e.g. "M480139044")
    pub merchant: String,

    /// Merchant category identifier (e.g. "es_tech")
    pub category: String,
}

impl Transaction {
    /// Create a transaction with placeholder demographic tokens
    pub fn new(step: i64, amount: f64, merchant: &str, category: &str) -> Self {
        Self {
            step,
            amount,
            age: "U".to_string(),
            gender: "U".to_string(),
            merchant: merchant.to_string(),
            category: category.to_string(),
        }
    }
}
