//! Detector-vote fusion.
//!
//! Combines the heterogeneous detector votes into one ranked prediction.
//! Votes are grouped by predicted category in first-seen order; each group's
//! confidence is aggregated per the configured strategy plus a corroboration
//! bonus, and the strongest group wins. Exact ties resolve to the group that
//! formed first, which is deterministic because the detector registry order is
//! fixed.

use serde::{Deserialize, Serialize};

use crate::detector::{Detection, MAX_CONFIDENCE, MIN_HISTORY};
use crate::domain::{Category, HistoryBuffer};

/// Rationale attached when the history is too short to analyze.
pub const INSUFFICIENT_DATA: &str = "insufficient data";

/// Rationale attached when no detector produced a vote.
pub const NO_PATTERN: &str = "no pattern detected";

/// How a group's member confidences are aggregated.
///
/// Two formulas coexisted in the upstream source; the weighted variant is the
/// default and the simplified one is retained as an optional strategy for
/// parity testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionStrategy {
    /// Per-kind weighted mean plus a `min(3 × n, 15)` corroboration bonus.
    #[default]
    Weighted,
    /// Plain mean plus a `min(5 × n, 15)` corroboration bonus.
    Simplified,
}

/// The fused prediction over the current detector votes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fusion {
    pub predicted: Option<Category>,
    /// Combined confidence in `0..=95`.
    pub confidence: u8,
    pub rationale: String,
    /// The winning group's member votes, in detector registry order.
    pub contributing: Vec<Detection>,
}

impl Fusion {
    /// The null fusion returned when fewer than [`MIN_HISTORY`] outcomes exist.
    #[must_use]
    pub fn insufficient_data() -> Self {
        Self::empty(INSUFFICIENT_DATA)
    }

    /// The null fusion returned when every detector stayed silent.
    #[must_use]
    pub fn no_pattern() -> Self {
        Self::empty(NO_PATTERN)
    }

    fn empty(rationale: &str) -> Self {
        Self {
            predicted: None,
            confidence: 0,
            rationale: rationale.to_string(),
            contributing: Vec::new(),
        }
    }
}

/// Aggregates detector votes into a single ranked prediction.
#[derive(Debug, Clone, Copy, Default)]
pub struct FusionEngine {
    strategy: FusionStrategy,
}

impl FusionEngine {
    #[must_use]
    pub const fn new(strategy: FusionStrategy) -> Self {
        Self { strategy }
    }

    /// Run the full analysis pass: gate on minimum history, run the detector
    /// bank over the chronological window, and fuse the votes.
    #[must_use]
    pub fn analyze(&self, history: &HistoryBuffer) -> Fusion {
        if history.len() < MIN_HISTORY {
            return Fusion::insufficient_data();
        }
        let chronological = history.chronological();
        self.fuse(crate::detector::run_bank(&chronological))
    }

    /// Fuse an already-collected set of detector votes.
    #[must_use]
    pub fn fuse(&self, detections: Vec<Detection>) -> Fusion {
        if detections.is_empty() {
            return Fusion::no_pattern();
        }

        // Group by predicted category, preserving first-seen insertion order.
        // A Vec keeps tie-breaks stable; an unordered map would not.
        let mut groups: Vec<(Category, Vec<Detection>)> = Vec::new();
        for detection in detections {
            match groups
                .iter_mut()
                .find(|(category, _)| *category == detection.predicted)
            {
                Some((_, group)) => group.push(detection),
                None => groups.push((detection.predicted, vec![detection])),
            }
        }

        let mut best: Option<(Category, f64, Vec<Detection>)> = None;
        for (category, group) in groups {
            let combined = self.combine(&group);
            // Strict comparison: an exact tie keeps the earlier-formed group
            let better = match &best {
                Some((_, best_confidence, _)) => combined > *best_confidence,
                None => true,
            };
            if better {
                best = Some((category, combined, group));
            }
        }

        let (category, confidence, group) =
            best.expect("at least one group exists for non-empty input");
        let rationale = group
            .iter()
            .map(|detection| detection.rationale.as_str())
            .collect::<Vec<_>>()
            .join(" + ");

        Fusion {
            predicted: Some(category),
            confidence: confidence.round() as u8,
            rationale,
            contributing: group,
        }
    }

    fn combine(&self, group: &[Detection]) -> f64 {
        let n = group.len() as f64;
        let combined = match self.strategy {
            FusionStrategy::Weighted => {
                let mut weighted_sum = 0.0;
                let mut total_weight = 0.0;
                for detection in group {
                    let weight = detection.kind.weight();
                    weighted_sum += detection.confidence * weight;
                    total_weight += weight;
                }
                weighted_sum / total_weight + (3.0 * n).min(15.0)
            }
            FusionStrategy::Simplified => {
                let mean =
                    group.iter().map(|d| d.confidence).sum::<f64>() / n;
                mean + (5.0 * n).min(15.0)
            }
        };
        combined.min(MAX_CONFIDENCE)
    }
}
