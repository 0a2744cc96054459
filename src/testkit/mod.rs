//! Test doubles and builders for exercising the engine without a live feed.
//!
//! Available to integration tests and downstream consumers through the
//! `testkit` feature.

pub mod feed;

pub use feed::ScriptedFeed;

use chrono::{Duration, TimeZone, Utc};

use crate::domain::Outcome;

/// Build an outcome with a fixed base timestamp, offset by `seconds`.
#[must_use]
pub fn outcome_at(id: &str, roll: u8, seconds: i64) -> Outcome {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    Outcome::new(id, base + Duration::seconds(seconds), roll)
}

/// Build a chronological batch from roll values, ids `r0`, `r1`, ... spaced
/// one second apart.
#[must_use]
pub fn outcomes_from_rolls(rolls: &[u8]) -> Vec<Outcome> {
    rolls
        .iter()
        .enumerate()
        .map(|(i, &roll)| outcome_at(&format!("r{i}"), roll, i as i64))
        .collect()
}
