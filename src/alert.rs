//! Human-facing alert derivation.
//!
//! Alerts are pure derivations over the same state the detectors see; no new
//! inference happens here. An offline or degraded feed supersedes everything
//! else with a single high-severity alert.

use serde::Serialize;

use crate::detector::{gale, trailing_run};
use crate::domain::{Category, HistoryBuffer};
use crate::feed::ConnectionState;
use crate::fusion::Fusion;

/// Fusion confidence at or above which a prediction alert fires.
const HIGH_CONFIDENCE_THRESHOLD: u8 = 80;

/// Trailing run length at or above which a long-streak alert fires.
const LONG_STREAK_THRESHOLD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SourceOffline,
    LongStreak,
    Gale,
    HighConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub related_category: Option<Category>,
    pub related_confidence: Option<u8>,
}

/// Derive the current alert list.
///
/// Order is fixed: long streak, gale, high-confidence prediction. A degraded
/// or disconnected feed short-circuits to a single source-offline alert.
#[must_use]
pub fn evaluate(history: &HistoryBuffer, state: ConnectionState, fusion: &Fusion) -> Vec<Alert> {
    if state.is_offline() {
        return vec![Alert {
            kind: AlertKind::SourceOffline,
            severity: Severity::High,
            message: "feed source offline; outcomes may be missing or simulated".to_string(),
            related_category: None,
            related_confidence: None,
        }];
    }

    let mut alerts = Vec::new();
    let chronological = history.chronological();

    if let Some((category, run)) = trailing_run(&chronological) {
        if run >= LONG_STREAK_THRESHOLD {
            alerts.push(Alert {
                kind: AlertKind::LongStreak,
                severity: Severity::High,
                message: format!("run of {run} consecutive {category} outcomes"),
                related_category: Some(category),
                related_confidence: None,
            });
        }
    }

    if let Some(detection) = gale::detect(&chronological) {
        alerts.push(Alert {
            kind: AlertKind::Gale,
            severity: Severity::Medium,
            message: detection.rationale.clone(),
            related_category: Some(detection.predicted),
            related_confidence: Some(detection.confidence.round() as u8),
        });
    }

    if fusion.confidence >= HIGH_CONFIDENCE_THRESHOLD {
        if let Some(category) = fusion.predicted {
            alerts.push(Alert {
                kind: AlertKind::HighConfidence,
                severity: Severity::High,
                message: format!(
                    "prediction at {}% confidence: {category}",
                    fusion.confidence
                ),
                related_category: Some(category),
                related_confidence: Some(fusion.confidence),
            });
        }
    }

    alerts
}
