//! Flat lookup rows (meals, room types, features, themes, ...).

use crate::ReferenceKind;
use chrono::{DateTime, Utc};
use freestays_core::LanguageCode;
use serde::{Deserialize, Serialize};

/// A row of one of the flat reference tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceItem {
    pub kind: ReferenceKind,
    pub external_id: String,
    pub name: String,
    pub language: LanguageCode,
    pub last_synced_at: DateTime<Utc>,
}

impl ReferenceItem {
    /// Case-insensitive match on the display name.
    #[must_use]
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.name.to_lowercase().contains(&term)
    }
}
