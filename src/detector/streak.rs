//! Streak (martingale) detector.
//!
//! After a trailing run of two or more same-category rounds, vote for the
//! opposite category with confidence growing in the run length.

use crate::domain::{Category, Outcome};

use super::{tail, trailing_run, Detection, DetectorKind};

const WINDOW: usize = 6;

pub fn detect(chronological: &[Outcome]) -> Option<Detection> {
    let recent = tail(chronological, WINDOW);
    let (category, run) = trailing_run(recent)?;

    if run < 2 || category == Category::Neutral {
        return None;
    }

    let confidence = (50.0 + run as f64 * 15.0).min(85.0);
    Some(Detection::new(
        DetectorKind::Streak,
        category.opposite(),
        confidence,
        format!("streak: {run} consecutive {category}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn outcomes(rolls: &[u8]) -> Vec<Outcome> {
        rolls
            .iter()
            .enumerate()
            .map(|(i, &roll)| Outcome::new(format!("game-{i}"), Utc::now(), roll))
            .collect()
    }

    #[test]
    fn fires_opposite_after_run_of_two() {
        let window = outcomes(&[2, 2, 2, 2, 1, 1]);
        let detection = detect(&window).unwrap();

        assert_eq!(detection.predicted, Category::Secondary);
        assert!((detection.confidence - 80.0).abs() < f64::EPSILON); // 50 + 2*15
    }

    #[test]
    fn confidence_caps_at_85() {
        // Run of 3 already hits the cap: 50 + 45 = 95 -> 85
        let window = outcomes(&[2, 2, 2, 1, 1, 1]);
        let detection = detect(&window).unwrap();
        assert!((detection.confidence - 85.0).abs() < f64::EPSILON);

        // Longer runs stay capped
        let window = outcomes(&[1, 1, 1, 1, 1, 1]);
        let detection = detect(&window).unwrap();
        assert_eq!(detection.predicted, Category::Secondary);
        assert!((detection.confidence - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn silent_on_single_round() {
        let window = outcomes(&[1, 2, 1, 2, 1, 2]);
        assert!(detect(&window).is_none());
    }

    #[test]
    fn silent_on_neutral_run() {
        let window = outcomes(&[1, 2, 1, 2, 0, 0]);
        assert!(detect(&window).is_none());
    }

    #[test]
    fn run_only_counts_within_window() {
        // Seven primaries, but the window is the last 6
        let window = outcomes(&[1, 1, 1, 1, 1, 1, 1]);
        let detection = detect(&window).unwrap();
        assert!(detection.rationale.contains("6 consecutive"));
    }
}
