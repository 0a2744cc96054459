//! Fibonacci-position detector.
//!
//! Counts major-category occurrences at Fibonacci index positions within the
//! recent window and votes for a category reaching three or more matches.
//! Position 1 appears twice in the sequence and counts twice, preserving the
//! upstream behavior.

use crate::domain::{Category, Outcome};

use super::{tail, Detection, DetectorKind};

const WINDOW: usize = 13;
const POSITIONS: [usize; 8] = [0, 1, 1, 2, 3, 5, 8, 12];
const MIN_MATCHES: u32 = 3;

pub fn detect(chronological: &[Outcome]) -> Option<Detection> {
    let recent = tail(chronological, WINDOW);

    let matches = |category: Category| -> u32 {
        POSITIONS
            .iter()
            .filter(|&&pos| {
                recent
                    .get(pos)
                    .is_some_and(|outcome| outcome.category() == category)
            })
            .count() as u32
    };

    for category in [Category::Primary, Category::Secondary] {
        let count = matches(category);
        if count >= MIN_MATCHES {
            return Some(Detection::new(
                DetectorKind::Fibonacci,
                category,
                45.0 + 5.0 * f64::from(count),
                format!("fibonacci: {count} position matches for {category}"),
            ));
        }
    }
    None
}
