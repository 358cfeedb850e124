//! Sync run settings, outcomes and status.

use chrono::{DateTime, Utc};
use freestays_config::SyncConfig;
use freestays_core::LanguageCode;
use freestays_domain::StaticDataKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which category set a run refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Every category (daily).
    Full,
    /// Frequently changing reference lists (every six hours).
    Basic,
}

impl SyncMode {
    /// Categories of this mode, in run order.
    #[must_use]
    pub fn categories(self) -> &'static [StaticDataKind] {
        match self {
            Self::Full => &StaticDataKind::FULL,
            Self::Basic => &StaticDataKind::BASIC,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Basic => "basic",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings of the sync job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Languages every category is fetched for.
    pub languages: Vec<LanguageCode>,
}

impl SyncSettings {
    /// Settings for the given languages; the default language when empty.
    #[must_use]
    pub fn new(languages: Vec<LanguageCode>) -> Self {
        let languages = if languages.is_empty() {
            vec![LanguageCode::default()]
        } else {
            languages
        };
        Self { languages }
    }

    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.language_codes())
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// What happened to one category in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Rows were upserted. `dropped` provider rows could not be mapped.
    Synced { rows: u64, dropped: usize },
    /// The provider returned nothing; the table was left untouched.
    Empty,
    /// Fetching or writing failed; the table was left untouched.
    Failed { error: String },
    /// The run was cancelled before this category started.
    Skipped,
}

impl SyncOutcome {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Synced { .. } => "synced",
            Self::Empty => "empty",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of one category in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub kind: StaticDataKind,
    pub language: LanguageCode,
    pub outcome: SyncOutcome,
    pub duration_ms: u64,
}

/// Lifecycle state of the sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    Running,
    /// Every category synced.
    Succeeded,
    /// Some categories failed or came back empty.
    PartiallySucceeded,
    /// No category synced.
    Failed,
    /// Cancelled before every category ran.
    Cancelled,
}

impl SyncState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::PartiallySucceeded => "partially_succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
}

impl SyncReport {
    /// Final state of the run the report describes.
    #[must_use]
    pub fn state(&self) -> SyncState {
        let count = |label: &str| {
            self.categories
                .iter()
                .filter(|c| c.outcome.as_str() == label)
                .count()
        };
        let (synced, empty, failed, skipped) =
            (count("synced"), count("empty"), count("failed"), count("skipped"));

        if skipped > 0 {
            SyncState::Cancelled
        } else if synced == 0 && (failed > 0 || empty > 0) {
            SyncState::Failed
        } else if failed > 0 || empty > 0 {
            SyncState::PartiallySucceeded
        } else {
            SyncState::Succeeded
        }
    }

    /// Rows upserted over the whole run.
    #[must_use]
    pub fn rows_upserted(&self) -> u64 {
        self.categories
            .iter()
            .map(|c| match c.outcome {
                SyncOutcome::Synced { rows, .. } => rows,
                _ => 0,
            })
            .sum()
    }

    /// Categories that failed, as `category/language`.
    #[must_use]
    pub fn failed_categories(&self) -> Vec<String> {
        self.labels_where(|o| matches!(o, SyncOutcome::Failed { .. }))
    }

    /// Categories the provider returned nothing for, as `category/language`.
    #[must_use]
    pub fn empty_categories(&self) -> Vec<String> {
        self.labels_where(|o| matches!(o, SyncOutcome::Empty))
    }

    /// Outcome of one category in one language.
    #[must_use]
    pub fn outcome(&self, kind: StaticDataKind, language: &LanguageCode) -> Option<&SyncOutcome> {
        self.categories
            .iter()
            .find(|c| c.kind == kind && &c.language == language)
            .map(|c| &c.outcome)
    }

    fn labels_where(&self, predicate: impl Fn(&SyncOutcome) -> bool) -> Vec<String> {
        self.categories
            .iter()
            .filter(|c| predicate(&c.outcome))
            .map(|c| format!("{}/{}", c.kind, c.language))
            .collect()
    }
}

/// Current state of the job and its last finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub state: SyncState,
    pub running_mode: Option<SyncMode>,
    pub last_report: Option<SyncReport>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            state: SyncState::Idle,
            running_mode: None,
            last_report: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freestays_domain::ReferenceKind;

    fn report(outcomes: Vec<(StaticDataKind, SyncOutcome)>) -> SyncReport {
        SyncReport {
            mode: SyncMode::Full,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            categories: outcomes
                .into_iter()
                .map(|(kind, outcome)| CategoryReport {
                    kind,
                    language: LanguageCode::default(),
                    outcome,
                    duration_ms: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_report_state() {
        let synced = SyncOutcome::Synced { rows: 3, dropped: 0 };
        let failed = SyncOutcome::Failed { error: "503".to_string() };

        assert_eq!(
            report(vec![(StaticDataKind::Hotels, synced.clone())]).state(),
            SyncState::Succeeded
        );
        assert_eq!(
            report(vec![
                (StaticDataKind::Hotels, synced.clone()),
                (StaticDataKind::Reference(ReferenceKind::Theme), SyncOutcome::Empty),
            ])
            .state(),
            SyncState::PartiallySucceeded
        );
        assert_eq!(
            report(vec![(StaticDataKind::Hotels, failed.clone())]).state(),
            SyncState::Failed
        );
        assert_eq!(
            report(vec![
                (StaticDataKind::Destinations, synced),
                (StaticDataKind::Hotels, SyncOutcome::Skipped),
            ])
            .state(),
            SyncState::Cancelled
        );
    }

    #[test]
    fn test_report_labels_and_totals() {
        let report = report(vec![
            (StaticDataKind::Destinations, SyncOutcome::Synced { rows: 2, dropped: 1 }),
            (StaticDataKind::Hotels, SyncOutcome::Synced { rows: 5, dropped: 0 }),
            (
                StaticDataKind::Reference(ReferenceKind::Meal),
                SyncOutcome::Failed { error: "timeout".to_string() },
            ),
            (StaticDataKind::Reference(ReferenceKind::Theme), SyncOutcome::Empty),
        ]);
        assert_eq!(report.rows_upserted(), 7);
        assert_eq!(report.failed_categories(), vec!["meals/en".to_string()]);
        assert_eq!(report.empty_categories(), vec!["themes/en".to_string()]);
    }

    #[test]
    fn test_mode_categories() {
        assert_eq!(SyncMode::Full.categories().len(), 11);
        assert_eq!(SyncMode::Basic.categories().len(), 6);
        assert!(SyncMode::Basic
            .categories()
            .iter()
            .all(|kind| SyncMode::Full.categories().contains(kind)));
    }

    #[test]
    fn test_settings_fall_back_to_default_language() {
        assert_eq!(SyncSettings::new(vec![]).languages, vec![LanguageCode::default()]);
    }
}
