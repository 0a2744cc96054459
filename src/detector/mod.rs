//! The pattern-detector bank.
//!
//! A fixed registry of pure detectors, each scanning a window of the rolling
//! history and optionally emitting a prediction. Detectors receive the history
//! in chronological order (oldest first) and look at the trailing end for the
//! most recent rounds. The registry order is fixed so that downstream fusion
//! tie-breaks are reproducible across runs.
//!
//! None of these heuristics claim genuine predictive power over an independent
//! random process; their exact thresholds are preserved for behavioral
//! fidelity with the upstream feed tooling.

pub mod fibonacci;
pub mod frequency;
pub mod gale;
pub mod sequence;
pub mod streak;
pub mod trend;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::{Category, Outcome};

/// Minimum history length before any detector is invoked.
pub const MIN_HISTORY: usize = 5;

/// Confidence ceiling for every detector and for fused results.
pub const MAX_CONFIDENCE: f64 = 95.0;

/// The kind of detector that produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Streak,
    Sequence,
    Frequency,
    Trend,
    Gale,
    Fibonacci,
}

impl DetectorKind {
    /// Fusion weight for this detector kind.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Streak => 1.2,
            Self::Gale => 1.1,
            Self::Sequence => 1.0,
            Self::Frequency => 0.9,
            Self::Trend => 0.8,
            Self::Fibonacci => 0.7,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Streak => "streak",
            Self::Sequence => "sequence",
            Self::Frequency => "frequency",
            Self::Trend => "trend",
            Self::Gale => "gale",
            Self::Fibonacci => "fibonacci",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detector's vote: predicted category, confidence, and rationale.
///
/// Produced transiently per analysis call; not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub kind: DetectorKind,
    pub predicted: Category,
    pub confidence: f64,
    pub rationale: String,
}

impl Detection {
    /// Build a detection, clamping confidence to `0..=95`.
    #[must_use]
    pub fn new(
        kind: DetectorKind,
        predicted: Category,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            predicted,
            confidence: confidence.clamp(0.0, MAX_CONFIDENCE),
            rationale: rationale.into(),
        }
    }
}

/// A pure detector over a chronological outcome window.
pub type DetectorFn = fn(&[Outcome]) -> Option<Detection>;

/// The fixed detector registry, iterated in declared order.
pub const DETECTORS: &[(DetectorKind, DetectorFn)] = &[
    (DetectorKind::Streak, streak::detect),
    (DetectorKind::Sequence, sequence::detect),
    (DetectorKind::Frequency, frequency::detect),
    (DetectorKind::Trend, trend::detect),
    (DetectorKind::Gale, gale::detect),
    (DetectorKind::Fibonacci, fibonacci::detect),
];

/// Run every registered detector over the chronological history window.
///
/// Returns the non-empty detections in registry order. A panic inside one
/// detector is caught and logged without aborting the rest of the bank.
/// Callers are expected to gate on [`MIN_HISTORY`]; with a shorter window
/// this returns an empty set without invoking any detector.
#[must_use]
pub fn run_bank(chronological: &[Outcome]) -> Vec<Detection> {
    if chronological.len() < MIN_HISTORY {
        return Vec::new();
    }

    let mut detections = Vec::new();
    for (kind, detect) in DETECTORS {
        match panic::catch_unwind(AssertUnwindSafe(|| detect(chronological))) {
            Ok(Some(detection)) => detections.push(detection),
            Ok(None) => {}
            Err(_) => {
                error!(detector = %kind, "Detector panicked, skipping");
            }
        }
    }
    detections
}

/// The trailing `k` entries of a chronological window (the `k` most recent).
#[must_use]
pub(crate) fn tail(window: &[Outcome], k: usize) -> &[Outcome] {
    &window[window.len().saturating_sub(k)..]
}

/// Length of the trailing run of consecutive same-category outcomes, together
/// with that category. Returns `None` for an empty window.
#[must_use]
pub(crate) fn trailing_run(window: &[Outcome]) -> Option<(Category, usize)> {
    let last = window.last()?.category();
    let run = window
        .iter()
        .rev()
        .take_while(|outcome| outcome.category() == last)
        .count();
    Some((last, run))
}
