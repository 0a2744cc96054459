//! Gale detector.
//!
//! Fires when the two most recent rounds share the same non-neutral category,
//! voting for the opposite side at a fixed confidence.

use crate::domain::{Category, Outcome};

use super::{tail, Detection, DetectorKind};

const WINDOW: usize = 4;
const CONFIDENCE: f64 = 68.0;

pub fn detect(chronological: &[Outcome]) -> Option<Detection> {
    let recent = tail(chronological, WINDOW);
    if recent.len() < 2 {
        return None;
    }

    let last = recent[recent.len() - 1].category();
    let prior = recent[recent.len() - 2].category();

    if last == prior && last != Category::Neutral {
        return Some(Detection::new(
            DetectorKind::Gale,
            last.opposite(),
            CONFIDENCE,
            format!("gale: 2 consecutive {last}"),
        ));
    }
    None
}
