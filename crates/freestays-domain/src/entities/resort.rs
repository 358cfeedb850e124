//! Resort row.

use chrono::{DateTime, Utc};
use freestays_core::LanguageCode;
use serde::{Deserialize, Serialize};

/// A resort inside a destination.
///
/// `destination_id` is not enforced; the destination may not be cached yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resort {
    pub external_id: i64,
    pub name: String,
    pub destination_id: i64,
    pub country_name: String,
    pub country_code: String,
    pub language: LanguageCode,
    pub last_synced_at: DateTime<Utc>,
}

impl Resort {
    /// Case-insensitive match on name or country.
    #[must_use]
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.country_name.to_lowercase().contains(&term)
    }
}
