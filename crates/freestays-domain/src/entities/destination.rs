//! Destination row.

use chrono::{DateTime, Utc};
use freestays_core::LanguageCode;
use serde::{Deserialize, Serialize};

/// Top of the geographic hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub external_id: i64,
    pub code: String,
    pub name: String,
    pub country: String,
    pub country_code: String,
    pub time_zone: Option<String>,
    pub language: LanguageCode,
    pub last_synced_at: DateTime<Utc>,
}

impl Destination {
    /// Case-insensitive match on name, code or country.
    #[must_use]
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.code.to_lowercase().contains(&term)
            || self.country.to_lowercase().contains(&term)
    }
}
