//! Round outcomes and their derived categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Roll values that map to [`Category::Primary`].
pub const PRIMARY_ROLLS: [u8; 7] = [1, 3, 5, 7, 9, 12, 14];

/// Roll values that map to [`Category::Secondary`].
pub const SECONDARY_ROLLS: [u8; 7] = [2, 4, 6, 8, 10, 11, 13];

/// Classification of a round outcome, derived solely from its roll value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Primary,
    Secondary,
    Neutral,
}

impl Category {
    /// Derive the category from a raw roll value.
    ///
    /// 0 is Neutral, {1,3,5,7,9,12,14} are Primary, every other value in
    /// 1..=14 is Secondary. This mapping is fixed and is never overridden by
    /// any other field on an outcome.
    #[must_use]
    pub fn from_roll(roll: u8) -> Self {
        if roll == 0 {
            Self::Neutral
        } else if PRIMARY_ROLLS.contains(&roll) {
            Self::Primary
        } else {
            Self::Secondary
        }
    }

    /// The opposite non-neutral category. Neutral has no opposite and maps
    /// to itself.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
            Self::Neutral => Self::Neutral,
        }
    }

    /// Single-letter code used when joining windows into pattern strings.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Primary => 'P',
            Self::Secondary => 'S',
            Self::Neutral => 'N',
        }
    }

    /// All three categories, in a fixed order.
    pub const ALL: [Self; 3] = [Self::Primary, Self::Secondary, Self::Neutral];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Neutral => "neutral",
        };
        f.write_str(name)
    }
}

/// Opaque feed-assigned identifier for a round outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutcomeId(String);

impl OutcomeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OutcomeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for OutcomeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for OutcomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ingested round result.
///
/// Outcomes are created by the feed ingestor on arrival, live only inside the
/// history buffer, and are discarded on eviction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Unique feed-assigned id, used for deduplication.
    pub id: OutcomeId,
    /// When the round occurred.
    pub occurred_at: DateTime<Utc>,
    /// Raw roll value in 0..=14.
    pub roll: u8,
}

impl Outcome {
    #[must_use]
    pub fn new(id: impl Into<OutcomeId>, occurred_at: DateTime<Utc>, roll: u8) -> Self {
        Self {
            id: id.into(),
            occurred_at,
            roll,
        }
    }

    /// The derived category of this outcome.
    #[must_use]
    pub fn category(&self) -> Category {
        Category::from_roll(self.roll)
    }
}
