//! Forward signal projection.
//!
//! Projects the latest fusion result onto a list of future time slots with a
//! controlled randomized-substitution policy. This is explicitly a
//! pseudo-randomized projection for display purposes, not a statistical
//! forecast: consumers must not treat slot confidences as probabilities.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::domain::Category;
use crate::fusion::Fusion;

/// Rationale used for every slot after the first.
pub const PROJECTED_RATIONALE: &str = "forward projection";

/// One projected future slot. Signals carry no persisted identity and are
/// regenerated from scratch on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    /// 1-based slot index.
    pub index: usize,
    pub scheduled_at: DateTime<Utc>,
    pub predicted: Category,
    /// Confidence in `0..=95`.
    pub confidence: u8,
    pub rationale: String,
}

/// Generates signal lists from a fusion result and an injected random source.
///
/// The RNG is a parameter so tests can drive both the override and
/// no-override branches deterministically with a seeded generator.
#[derive(Debug, Clone, Copy)]
pub struct SignalScheduler {
    interval: Duration,
    override_probability: f64,
}

impl SignalScheduler {
    #[must_use]
    pub const fn new(interval: Duration, override_probability: f64) -> Self {
        Self {
            interval,
            override_probability,
        }
    }

    /// Project `n` slots starting one interval after `now`.
    ///
    /// Each slot independently keeps the fused prediction or, with the
    /// configured probability, substitutes a uniformly chosen category with a
    /// random confidence in `[50, 90)`. When the fusion carries no prediction
    /// at all, slots fall back to a uniform category with confidence in
    /// `[60, 90)`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        fusion: &Fusion,
        n: usize,
        now: DateTime<Utc>,
    ) -> Vec<Signal> {
        let interval = chrono::Duration::from_std(self.interval)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        (1..=n)
            .map(|index| {
                let scheduled_at = now + interval * index as i32;

                let (mut predicted, mut confidence) = match fusion.predicted {
                    Some(category) => (category, fusion.confidence),
                    None => (random_category(rng), rng.gen_range(60..90)),
                };

                if rng.gen_bool(self.override_probability) {
                    predicted = random_category(rng);
                    confidence = rng.gen_range(50..90);
                }

                let rationale = if index == 1 && fusion.predicted.is_some() {
                    fusion.rationale.clone()
                } else {
                    PROJECTED_RATIONALE.to_string()
                };

                Signal {
                    index,
                    scheduled_at,
                    predicted,
                    confidence: confidence.min(95),
                    rationale,
                }
            })
            .collect()
    }
}

fn random_category<R: Rng + ?Sized>(rng: &mut R) -> Category {
    Category::ALL[rng.gen_range(0..Category::ALL.len())]
}
