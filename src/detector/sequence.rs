//! Sequence detector.
//!
//! Joins the recent window into a string of category letters and matches it
//! against a fixed table of known three-round patterns. The table order is
//! part of the behavior: the first matching pattern wins.

use crate::domain::{Category, Outcome};

use super::{tail, Detection, DetectorKind};

const WINDOW: usize = 8;

/// Known pattern -> (next category, fixed confidence).
const PATTERNS: &[(&str, Category, f64)] = &[
    ("PSP", Category::Secondary, 65.0),
    ("SPS", Category::Primary, 65.0),
    ("PPS", Category::Primary, 60.0),
    ("SSP", Category::Secondary, 60.0),
    ("PSS", Category::Primary, 58.0),
    ("SPP", Category::Secondary, 58.0),
];

pub fn detect(chronological: &[Outcome]) -> Option<Detection> {
    let letters: String = tail(chronological, WINDOW)
        .iter()
        .map(|outcome| outcome.category().letter())
        .collect();

    for (pattern, next, confidence) in PATTERNS {
        if letters.contains(pattern) {
            return Some(Detection::new(
                DetectorKind::Sequence,
                *next,
                *confidence,
                format!("sequence: pattern {pattern} detected"),
            ));
        }
    }
    None
}
