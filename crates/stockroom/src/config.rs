//! Stockroom configuration.

use serde::Deserialize;
use stockroom_core::Language;

/// Configuration for a [`Stockroom`](crate::Stockroom).
///
/// Missing fields fall back to their defaults, so a host can load a partial
/// JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StockroomConfig {
    /// Language for names and labels in reports and receipts.
    pub language: Language,
    /// Transactions returned by `recent_transactions(None)`.
    pub recent_limit: usize,
    /// Days covered by daily activity and inventory reports.
    pub report_days: u32,
}

impl Default for StockroomConfig {
    fn default() -> Self {
        Self {
            language: Language::Ar,
            recent_limit: 10,
            report_days: 7,
        }
    }
}

impl StockroomConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
