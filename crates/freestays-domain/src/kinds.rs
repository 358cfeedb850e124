//! Static data categories.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat lookup categories, one durable table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Meal,
    RoomType,
    Feature,
    Theme,
    Language,
    TransferType,
    NoteType,
}

impl ReferenceKind {
    /// All reference kinds.
    pub const ALL: [Self; 7] = [
        Self::Meal,
        Self::RoomType,
        Self::Feature,
        Self::Theme,
        Self::Language,
        Self::TransferType,
        Self::NoteType,
    ];

    /// Name of the durable table holding this kind.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Meal => "sunhotels_meals_cache",
            Self::RoomType => "sunhotels_room_types_cache",
            Self::Feature => "sunhotels_features_cache",
            Self::Theme => "sunhotels_themes_cache",
            Self::Language => "sunhotels_languages_cache",
            Self::TransferType => "sunhotels_transfer_types_cache",
            Self::NoteType => "sunhotels_note_types_cache",
        }
    }

    /// Plural, snake-case name used in logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meal => "meals",
            Self::RoomType => "room_types",
            Self::Feature => "features",
            Self::Theme => "themes",
            Self::Language => "languages",
            Self::TransferType => "transfer_types",
            Self::NoteType => "note_types",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One category the sync job refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticDataKind {
    Destinations,
    Resorts,
    Reference(ReferenceKind),
    Hotels,
    Rooms,
}

impl StaticDataKind {
    /// Categories refreshed by the full (daily) sync, in run order.
    ///
    /// Parents come before children so that a clean run leaves no dangling
    /// references, although none are enforced.
    pub const FULL: [Self; 11] = [
        Self::Destinations,
        Self::Resorts,
        Self::Reference(ReferenceKind::Meal),
        Self::Reference(ReferenceKind::RoomType),
        Self::Reference(ReferenceKind::Feature),
        Self::Reference(ReferenceKind::Theme),
        Self::Reference(ReferenceKind::Language),
        Self::Reference(ReferenceKind::TransferType),
        Self::Reference(ReferenceKind::NoteType),
        Self::Hotels,
        Self::Rooms,
    ];

    /// Categories refreshed by the basic (six-hourly) sync, in run order.
    pub const BASIC: [Self; 6] = [
        Self::Destinations,
        Self::Resorts,
        Self::Reference(ReferenceKind::Meal),
        Self::Reference(ReferenceKind::RoomType),
        Self::Reference(ReferenceKind::Feature),
        Self::Reference(ReferenceKind::Theme),
    ];

    /// Snake-case name used in logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Destinations => "destinations",
            Self::Resorts => "resorts",
            Self::Reference(kind) => kind.as_str(),
            Self::Hotels => "hotels",
            Self::Rooms => "rooms",
        }
    }

    /// Returns true if the basic sync refreshes this category.
    #[must_use]
    pub fn in_basic_sync(self) -> bool {
        Self::BASIC.contains(&self)
    }

    /// Age after which a row of this category counts as stale: the cadence
    /// of the most frequent sync tier that refreshes it.
    #[must_use]
    pub fn max_age(self) -> Duration {
        if self.in_basic_sync() {
            Duration::hours(6)
        } else {
            Duration::hours(24)
        }
    }
}

impl fmt::Display for StaticDataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sync_is_a_subset_of_full_sync() {
        for kind in StaticDataKind::BASIC {
            assert!(StaticDataKind::FULL.contains(&kind), "{kind} missing from full sync");
        }
        assert!(StaticDataKind::BASIC.len() < StaticDataKind::FULL.len());
    }

    #[test]
    fn test_full_sync_covers_every_reference_kind() {
        for kind in ReferenceKind::ALL {
            assert!(StaticDataKind::FULL.contains(&StaticDataKind::Reference(kind)));
        }
    }

    #[test]
    fn test_max_age_follows_sync_tier() {
        assert_eq!(StaticDataKind::Destinations.max_age(), Duration::hours(6));
        assert_eq!(StaticDataKind::Hotels.max_age(), Duration::hours(24));
        assert_eq!(
            StaticDataKind::Reference(ReferenceKind::NoteType).max_age(),
            Duration::hours(24)
        );
    }

    #[test]
    fn test_table_names_are_distinct() {
        let mut tables: Vec<_> = ReferenceKind::ALL.iter().map(|k| k.table_name()).collect();
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(tables.len(), ReferenceKind::ALL.len());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(StaticDataKind::Reference(ReferenceKind::RoomType).to_string(), "room_types");
        assert_eq!(StaticDataKind::Rooms.to_string(), "rooms");
    }
}
