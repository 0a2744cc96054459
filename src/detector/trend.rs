//! Trend detector.
//!
//! Counts directional transitions between the two major categories and votes
//! for the side being transitioned into when the imbalance is strong.

use crate::domain::{Category, Outcome};

use super::{tail, Detection, DetectorKind};

const WINDOW: usize = 10;
const CONFIDENCE: f64 = 52.0;

pub fn detect(chronological: &[Outcome]) -> Option<Detection> {
    let recent = tail(chronological, WINDOW);

    let mut primary_to_secondary = 0u32;
    let mut secondary_to_primary = 0u32;
    for pair in recent.windows(2) {
        match (pair[0].category(), pair[1].category()) {
            (Category::Primary, Category::Secondary) => primary_to_secondary += 1,
            (Category::Secondary, Category::Primary) => secondary_to_primary += 1,
            _ => {}
        }
    }

    if primary_to_secondary > secondary_to_primary + 2 {
        return Some(Detection::new(
            DetectorKind::Trend,
            Category::Secondary,
            CONFIDENCE,
            format!(
                "trend: primary flowing into secondary ({primary_to_secondary} vs {secondary_to_primary})"
            ),
        ));
    }
    if secondary_to_primary > primary_to_secondary + 2 {
        return Some(Detection::new(
            DetectorKind::Trend,
            Category::Primary,
            CONFIDENCE,
            format!(
                "trend: secondary flowing into primary ({secondary_to_primary} vs {primary_to_secondary})"
            ),
        ));
    }
    None
}
